// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServiceConfigLayer;
use crate::sections::{LogFormat, LoggingConfigLayer, PolicyConfigLayer};

/// Default location of the system config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/cohort/access.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServiceConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServiceConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServiceConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServiceConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServiceConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServiceConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: COHORT_ACCESS_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServiceConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServiceConfigLayer {
			logging: Some(load_logging_from_env()?),
			policy: Some(load_policy_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| parse_bool(&v))
}

fn parse_bool(value: &str) -> bool {
	value.eq_ignore_ascii_case("true") || value == "1"
}

fn parse_log_format(key: &str, value: &str) -> Result<LogFormat, ConfigError> {
	value
		.parse::<LogFormat>()
		.map_err(|message| ConfigError::invalid_value(key, message))
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("COHORT_ACCESS_LOG_FORMAT") {
		Some(v) => Some(parse_log_format("COHORT_ACCESS_LOG_FORMAT", &v)?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("COHORT_ACCESS_LOG_LEVEL"),
		format,
	})
}

fn load_policy_from_env() -> Result<PolicyConfigLayer, ConfigError> {
	Ok(PolicyConfigLayer {
		startup_check: env_bool("COHORT_ACCESS_POLICY_STARTUP_CHECK"),
		fail_on_defect: env_bool("COHORT_ACCESS_POLICY_FAIL_ON_DEFECT"),
	})
}
