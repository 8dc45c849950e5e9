// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by each source.

use serde::{Deserialize, Serialize};

use crate::sections::{LoggingConfigLayer, PolicyConfigLayer};

/// One source's view of the configuration. Unset sections are `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfigLayer {
	pub logging: Option<LoggingConfigLayer>,
	pub policy: Option<PolicyConfigLayer>,
}

impl ServiceConfigLayer {
	/// Overlays `other` onto `self`; fields set in `other` win.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.policy, other.policy, PolicyConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	if let Some(o) = other {
		if let Some(b) = base.as_mut() {
			merge(b, o);
		} else {
			*base = Some(o);
		}
	}
}
