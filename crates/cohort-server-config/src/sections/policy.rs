// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access policy configuration section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfigLayer {
	pub startup_check: Option<bool>,
	pub fail_on_defect: Option<bool>,
}

impl PolicyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.startup_check.is_some() {
			self.startup_check = other.startup_check;
		}
		if other.fail_on_defect.is_some() {
			self.fail_on_defect = other.fail_on_defect;
		}
	}

	pub fn finalize(self) -> PolicyConfig {
		PolicyConfig {
			startup_check: self.startup_check.unwrap_or(true),
			fail_on_defect: self.fail_on_defect.unwrap_or(true),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
	/// Run the policy self-check before serving.
	pub startup_check: bool,
	/// Refuse to start when the self-check finds a defect. When false the defect is
	/// logged and requests touching the broken part of the policy fail closed.
	pub fail_on_defect: bool,
}

impl Default for PolicyConfig {
	fn default() -> Self {
		Self {
			startup_check: true,
			fail_on_defect: true,
		}
	}
}
