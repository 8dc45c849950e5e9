// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for hosts of the cohort access engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`COHORT_ACCESS_*`)
//!
//! # Usage
//!
//! ```ignore
//! use cohort_server_config::load_config;
//!
//! let config = load_config()?;
//! if config.policy.startup_check {
//!     cohort_server_access::run_startup_check(AccessPolicy::standard())?;
//! }
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServiceConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceConfig {
	pub logging: LoggingConfig,
	pub policy: PolicyConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`COHORT_ACCESS_*`)
/// 2. Config file (`/etc/cohort/access.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServiceConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServiceConfig, ConfigError> {
	let mut merged = ServiceConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServiceConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServiceConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServiceConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServiceConfigLayer) -> Result<ServiceConfig, ConfigError> {
	let logging = layer.logging.unwrap_or_default().finalize();
	let policy = layer.policy.unwrap_or_default().finalize();

	validate_config(&policy)?;

	info!(
		log_level = %logging.level,
		log_format = %logging.format,
		startup_check = policy.startup_check,
		fail_on_defect = policy.fail_on_defect,
		"Access configuration loaded"
	);

	Ok(ServiceConfig { logging, policy })
}

/// Validate cross-field configuration rules.
fn validate_config(policy: &PolicyConfig) -> Result<(), ConfigError> {
	if policy.fail_on_defect && !policy.startup_check {
		return Err(ConfigError::validation(
			"policy.fail_on_defect requires policy.startup_check. Enable \
			 COHORT_ACCESS_POLICY_STARTUP_CHECK or set COHORT_ACCESS_POLICY_FAIL_ON_DEFECT=0.",
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_fail_on_defect_requires_startup_check() {
		let policy = PolicyConfig {
			startup_check: false,
			fail_on_defect: true,
		};
		let result = validate_config(&policy);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("requires policy.startup_check"));
	}

	#[test]
	fn test_startup_check_disabled_without_fail_on_defect_ok() {
		let policy = PolicyConfig {
			startup_check: false,
			fail_on_defect: false,
		};
		assert!(validate_config(&policy).is_ok());
	}

	#[test]
	fn test_finalize_defaults() {
		let config = finalize(ServiceConfigLayer::default()).unwrap();
		assert_eq!(config, ServiceConfig::default());
		assert!(config.policy.startup_check);
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn test_load_with_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			"[logging]\nlevel = \"debug\"\n\n[policy]\nfail_on_defect = false"
		)
		.unwrap();

		let config = load_config_with_file(file.path()).unwrap();
		assert_eq!(config.logging.level, "debug");
		assert!(config.policy.startup_check);
		assert!(!config.policy.fail_on_defect);
	}

	#[test]
	fn test_load_with_file_rejects_invalid_combination() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[policy]\nstartup_check = false").unwrap();

		let err = load_config_with_file(file.path()).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}
}
