// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin tooling for the cohort access policy.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cohort_server_access::{run_startup_check, AccessPolicy, Role};
use cohort_server_config::{LogFormat, ServiceConfig};
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod snapshot;

use snapshot::Snapshot;

/// Inspect the access policy and evaluate visibility offline.
#[derive(Parser, Debug)]
#[command(
	name = "cohort-access",
	about = "Inspect the cohort access policy and evaluate visibility snapshots",
	version
)]
struct Args {
	/// Config file (defaults to /etc/cohort/access.toml)
	#[arg(long, global = true, env = "COHORT_ACCESS_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the policy self-check; exits non-zero on a defect
	Check,

	/// List every role with its tier
	Roles {
		/// Print the full policy as JSON
		#[arg(long)]
		json: bool,
	},

	/// Show a role's grants and expanded permissions
	Describe {
		role: Role,

		#[arg(long)]
		json: bool,
	},

	/// List the roles holding a permission
	Resolve {
		permission: String,

		#[arg(long)]
		json: bool,
	},

	/// Evaluate a JSON snapshot and print what the principal can see
	Scope {
		/// Snapshot file: `{ "request": {...}, "assignments": [...] }`
		#[arg(long)]
		snapshot: PathBuf,

		/// Evaluation instant in RFC 3339 (defaults to the current time)
		#[arg(long)]
		now: Option<DateTime<Utc>>,
	},
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => cohort_server_config::load_config_with_file(path)?,
		None => cohort_server_config::load_config()?,
	};
	init_tracing(&config);

	let policy = AccessPolicy::standard();
	let mut stdout = std::io::stdout().lock();

	match args.command {
		Command::Check => commands::check(policy, &mut stdout),
		Command::Roles { json } => commands::roles(policy, json, &mut stdout),
		Command::Describe { role, json } => commands::describe(policy, role, json, &mut stdout),
		Command::Resolve { permission, json } => {
			commands::resolve(policy, &permission, json, &mut stdout)
		}
		Command::Scope { snapshot, now } => {
			startup_check(&config, policy)?;
			let snapshot = Snapshot::load(&snapshot)?;
			commands::scope(policy, &snapshot, now.unwrap_or_else(Utc::now), &mut stdout)
		}
	}
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(config: &ServiceConfig) {
	let json = config.logging.format == LogFormat::Json;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
		.with(json.then(|| {
			tracing_subscriber::fmt::layer()
				.json()
				.with_writer(std::io::stderr)
		}))
		.init();
}

fn startup_check(config: &ServiceConfig, policy: &AccessPolicy) -> anyhow::Result<()> {
	if !config.policy.startup_check {
		warn!("access policy self-check disabled by configuration");
		return Ok(());
	}

	match run_startup_check(policy) {
		Ok(_) => Ok(()),
		Err(e) if config.policy.fail_on_defect => Err(e.into()),
		Err(e) => {
			error!(error = %e, "access policy defect, continuing with fail-closed evaluation");
			Ok(())
		}
	}
}
