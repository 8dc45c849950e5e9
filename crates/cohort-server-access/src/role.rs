// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Roles and their classification into visibility tiers.
//!
//! Every [`Role`] belongs to exactly one [`RoleTier`]:
//!
//! - **Supervisory** roles (administrators and educators) see resources anchored at
//!   their own node, its ancestors and all of its descendants.
//! - **Supervised** roles (students and family) see resources anchored at their own
//!   node and its ancestors only.
//!
//! The classification is backed by two explicit sets rather than a match so that an
//! incomplete or overlapping configuration is detectable by [`RoleClassifier::verify`]
//! instead of being silently absorbed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigurationError, InvalidInputError};

/// Roles a membership can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	SystemAdministrator,
	DistrictAdministrator,
	SiteAdministrator,
	Administrator,
	Principal,
	Counselor,
	Teacher,
	Aide,
	Proctor,
	Student,
	Guardian,
	Parent,
	Relative,
}

impl Role {
	/// Returns all roles.
	pub fn all() -> &'static [Role] {
		&[
			Role::SystemAdministrator,
			Role::DistrictAdministrator,
			Role::SiteAdministrator,
			Role::Administrator,
			Role::Principal,
			Role::Counselor,
			Role::Teacher,
			Role::Aide,
			Role::Proctor,
			Role::Student,
			Role::Guardian,
			Role::Parent,
			Role::Relative,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Role::SystemAdministrator => "system_administrator",
			Role::DistrictAdministrator => "district_administrator",
			Role::SiteAdministrator => "site_administrator",
			Role::Administrator => "administrator",
			Role::Principal => "principal",
			Role::Counselor => "counselor",
			Role::Teacher => "teacher",
			Role::Aide => "aide",
			Role::Proctor => "proctor",
			Role::Student => "student",
			Role::Guardian => "guardian",
			Role::Parent => "parent",
			Role::Relative => "relative",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = InvalidInputError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Role::all()
			.iter()
			.copied()
			.find(|r| r.as_str() == s)
			.ok_or_else(|| InvalidInputError::UnknownRole(s.to_string()))
	}
}

/// Direction in which a role's visibility extends through the org tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
	/// Own node, ancestors and descendants.
	Supervisory,
	/// Own node and ancestors only.
	Supervised,
}

impl fmt::Display for RoleTier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RoleTier::Supervisory => write!(f, "supervisory"),
			RoleTier::Supervised => write!(f, "supervised"),
		}
	}
}

pub const SUPERVISORY_ROLES: &[Role] = &[
	Role::SystemAdministrator,
	Role::DistrictAdministrator,
	Role::SiteAdministrator,
	Role::Administrator,
	Role::Principal,
	Role::Counselor,
	Role::Teacher,
	Role::Aide,
	Role::Proctor,
];

pub const SUPERVISED_ROLES: &[Role] = &[
	Role::Student,
	Role::Guardian,
	Role::Parent,
	Role::Relative,
];

/// Partition of roles into supervisory and supervised tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleClassifier {
	supervisory: BTreeSet<Role>,
	supervised: BTreeSet<Role>,
}

impl RoleClassifier {
	/// Builds a classifier from explicit sets. No consistency check happens here;
	/// call [`verify`](Self::verify) before serving traffic.
	pub fn new(
		supervisory: impl IntoIterator<Item = Role>,
		supervised: impl IntoIterator<Item = Role>,
	) -> Self {
		Self {
			supervisory: supervisory.into_iter().collect(),
			supervised: supervised.into_iter().collect(),
		}
	}

	/// The production classification.
	pub fn standard() -> Self {
		Self::new(
			SUPERVISORY_ROLES.iter().copied(),
			SUPERVISED_ROLES.iter().copied(),
		)
	}

	/// Returns the tier for a role, or `None` if the role is unclassified or
	/// claimed by both sets.
	pub fn tier(&self, role: Role) -> Option<RoleTier> {
		match (
			self.supervisory.contains(&role),
			self.supervised.contains(&role),
		) {
			(true, false) => Some(RoleTier::Supervisory),
			(false, true) => Some(RoleTier::Supervised),
			_ => None,
		}
	}

	/// Classifies a role, reporting a configuration defect if it has no single tier.
	pub fn classify(&self, role: Role) -> Result<RoleTier, ConfigurationError> {
		self
			.tier(role)
			.ok_or(ConfigurationError::UnclassifiedRole { role })
	}

	/// Checks that the two sets are disjoint and together cover every role.
	pub fn verify(&self) -> Result<(), ConfigurationError> {
		let unclassified: Vec<Role> = Role::all()
			.iter()
			.copied()
			.filter(|r| !self.supervisory.contains(r) && !self.supervised.contains(r))
			.collect();
		let overlapping: Vec<Role> = self
			.supervisory
			.intersection(&self.supervised)
			.copied()
			.collect();

		if unclassified.is_empty() && overlapping.is_empty() {
			Ok(())
		} else {
			Err(ConfigurationError::RoleClassification {
				unclassified,
				overlapping,
			})
		}
	}

	pub fn supervisory(&self) -> impl Iterator<Item = Role> + '_ {
		self.supervisory.iter().copied()
	}

	pub fn supervised(&self) -> impl Iterator<Item = Role> + '_ {
		self.supervised.iter().copied()
	}
}

impl Default for RoleClassifier {
	fn default() -> Self {
		Self::standard()
	}
}
