// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Offline evaluation input.

use std::path::Path;

use anyhow::Context;
use cohort_server_access::{AccessFilterRequest, AdministrationAssignment};
use serde::Deserialize;

/// A frozen copy of what the host service would supply for one request.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
	pub request: AccessFilterRequest,
	#[serde(default)]
	pub assignments: Vec<AdministrationAssignment>,
}

impl Snapshot {
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read snapshot {}", path.display()))?;
		serde_json::from_str(&content)
			.with_context(|| format!("failed to parse snapshot {}", path.display()))
	}
}
