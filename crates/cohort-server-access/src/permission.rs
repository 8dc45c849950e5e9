// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The permission catalog.
//!
//! Permissions are dotted strings (`resource.action`, `resource.sub.action`). The catalog
//! is closed: every concrete permission is a [`Permission`] variant and every wildcard a
//! role may hold is a [`Wildcard`] variant. Roles are granted [`PermissionGrant`]s, which
//! are either an exact permission or a wildcard covering a prefix.
//!
//! Matching is done on strings so that callers holding an arbitrary permission string
//! (for example from a route table) get the same answer as typed callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bumped whenever a permission is added, removed or renamed.
pub const PERMISSION_CATALOG_VERSION: u32 = 1;

const WILDCARD_SUFFIX: &str = ".*";

/// A concrete permission in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
	AdministrationsList,
	AdministrationsRead,
	AdministrationsCreate,
	AdministrationsUpdate,
	AdministrationsDelete,
	AdministrationsAssign,
	AssessmentsRun,
	AssessmentsProctor,
	GroupsList,
	GroupsRead,
	OrgsList,
	OrgsRead,
	UsersList,
	UsersRead,
	UsersUpdate,
	ProfileRead,
	ProfileUpdate,
	ReportsScoreRead,
	ReportsScoreReadComposite,
	ReportsProgressRead,
	ReportsStudentRead,
}

impl Permission {
	/// Returns every permission in the catalog.
	pub fn all() -> &'static [Permission] {
		&[
			Permission::AdministrationsList,
			Permission::AdministrationsRead,
			Permission::AdministrationsCreate,
			Permission::AdministrationsUpdate,
			Permission::AdministrationsDelete,
			Permission::AdministrationsAssign,
			Permission::AssessmentsRun,
			Permission::AssessmentsProctor,
			Permission::GroupsList,
			Permission::GroupsRead,
			Permission::OrgsList,
			Permission::OrgsRead,
			Permission::UsersList,
			Permission::UsersRead,
			Permission::UsersUpdate,
			Permission::ProfileRead,
			Permission::ProfileUpdate,
			Permission::ReportsScoreRead,
			Permission::ReportsScoreReadComposite,
			Permission::ReportsProgressRead,
			Permission::ReportsStudentRead,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Permission::AdministrationsList => "administrations.list",
			Permission::AdministrationsRead => "administrations.read",
			Permission::AdministrationsCreate => "administrations.create",
			Permission::AdministrationsUpdate => "administrations.update",
			Permission::AdministrationsDelete => "administrations.delete",
			Permission::AdministrationsAssign => "administrations.assign",
			Permission::AssessmentsRun => "assessments.run",
			Permission::AssessmentsProctor => "assessments.proctor",
			Permission::GroupsList => "groups.list",
			Permission::GroupsRead => "groups.read",
			Permission::OrgsList => "orgs.list",
			Permission::OrgsRead => "orgs.read",
			Permission::UsersList => "users.list",
			Permission::UsersRead => "users.read",
			Permission::UsersUpdate => "users.update",
			Permission::ProfileRead => "profile.read",
			Permission::ProfileUpdate => "profile.update",
			Permission::ReportsScoreRead => "reports.score.read",
			Permission::ReportsScoreReadComposite => "reports.score.read_composite",
			Permission::ReportsProgressRead => "reports.progress.read",
			Permission::ReportsStudentRead => "reports.student.read",
		}
	}
}

impl fmt::Display for Permission {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a string names no catalog permission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a catalog permission")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
	type Err = UnknownPermission;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Permission::all()
			.iter()
			.copied()
			.find(|p| p.as_str() == s)
			.ok_or_else(|| UnknownPermission(s.to_string()))
	}
}

impl Serialize for Permission {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for Permission {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// A wildcard grant: the named prefix and everything beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Wildcard {
	Administrations,
	Assessments,
	Groups,
	Orgs,
	Users,
	Profile,
	Reports,
	ReportsScore,
}

impl Wildcard {
	pub fn all() -> &'static [Wildcard] {
		&[
			Wildcard::Administrations,
			Wildcard::Assessments,
			Wildcard::Groups,
			Wildcard::Orgs,
			Wildcard::Users,
			Wildcard::Profile,
			Wildcard::Reports,
			Wildcard::ReportsScore,
		]
	}

	/// The dotted prefix this wildcard covers, without the `.*` suffix.
	pub fn prefix(&self) -> &'static str {
		match self {
			Wildcard::Administrations => "administrations",
			Wildcard::Assessments => "assessments",
			Wildcard::Groups => "groups",
			Wildcard::Orgs => "orgs",
			Wildcard::Users => "users",
			Wildcard::Profile => "profile",
			Wildcard::Reports => "reports",
			Wildcard::ReportsScore => "reports.score",
		}
	}

	/// True if `permission` equals the prefix or sits beneath it at segment granularity.
	pub fn covers(&self, permission: &str) -> bool {
		let prefix = self.prefix();
		match permission.strip_prefix(prefix) {
			Some("") => true,
			Some(rest) => rest.starts_with('.'),
			None => false,
		}
	}

	/// Catalog permissions this wildcard expands to.
	pub fn expand(&self) -> impl Iterator<Item = Permission> + '_ {
		Permission::all()
			.iter()
			.copied()
			.filter(move |p| self.covers(p.as_str()))
	}
}

impl fmt::Display for Wildcard {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", self.prefix(), WILDCARD_SUFFIX)
	}
}

impl FromStr for Wildcard {
	type Err = UnknownPermission;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let prefix = s
			.strip_suffix(WILDCARD_SUFFIX)
			.ok_or_else(|| UnknownPermission(s.to_string()))?;
		Wildcard::all()
			.iter()
			.copied()
			.find(|w| w.prefix() == prefix)
			.ok_or_else(|| UnknownPermission(s.to_string()))
	}
}

/// An entry in a role's permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionGrant {
	Exact(Permission),
	Wildcard(Wildcard),
}

impl PermissionGrant {
	/// Does this grant satisfy `permission`?
	///
	/// An exact grant matches only its own string. A wildcard grant matches its prefix
	/// and anything below it, never a sibling sharing a textual prefix
	/// (`reports.score.*` does not match `reports.scores.read`).
	pub fn matches(&self, permission: &str) -> bool {
		match self {
			PermissionGrant::Exact(p) => p.as_str() == permission,
			PermissionGrant::Wildcard(w) => w.covers(permission),
		}
	}

	/// Catalog permissions this grant expands to.
	pub fn expand(&self) -> Vec<Permission> {
		match self {
			PermissionGrant::Exact(p) => vec![*p],
			PermissionGrant::Wildcard(w) => w.expand().collect(),
		}
	}
}

impl From<Permission> for PermissionGrant {
	fn from(p: Permission) -> Self {
		PermissionGrant::Exact(p)
	}
}

impl From<Wildcard> for PermissionGrant {
	fn from(w: Wildcard) -> Self {
		PermissionGrant::Wildcard(w)
	}
}

impl fmt::Display for PermissionGrant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PermissionGrant::Exact(p) => fmt::Display::fmt(p, f),
			PermissionGrant::Wildcard(w) => fmt::Display::fmt(w, f),
		}
	}
}

impl FromStr for PermissionGrant {
	type Err = UnknownPermission;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.ends_with(WILDCARD_SUFFIX) {
			s.parse().map(PermissionGrant::Wildcard)
		} else {
			s.parse().map(PermissionGrant::Exact)
		}
	}
}

impl Serialize for PermissionGrant {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for PermissionGrant {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn catalog_strings_are_unique() {
		let mut seen = std::collections::HashSet::new();
		for p in Permission::all() {
			assert!(seen.insert(p.as_str()), "duplicate permission {p}");
			assert!(!p.as_str().ends_with(WILDCARD_SUFFIX));
		}
	}

	#[test]
	fn every_wildcard_covers_some_permission() {
		for w in Wildcard::all() {
			assert!(w.expand().next().is_some(), "dead wildcard {w}");
		}
	}

	#[test]
	fn score_wildcard_matches_score_actions_only() {
		let grant = PermissionGrant::Wildcard(Wildcard::ReportsScore);
		assert!(grant.matches("reports.score.read"));
		assert!(grant.matches("reports.score.read_composite"));
		assert!(grant.matches("reports.score"));
		assert!(!grant.matches("reports.progress.read"));
		assert!(!grant.matches("reports.scores.read"));
		assert!(!grant.matches("reports"));
	}

	#[test]
	fn exact_grant_matches_only_itself() {
		let grant = PermissionGrant::Exact(Permission::ReportsScoreRead);
		assert!(grant.matches("reports.score.read"));
		assert!(!grant.matches("reports.score.read_composite"));
		assert!(!grant.matches("reports.score"));
	}

	#[test]
	fn top_level_wildcard_expands_nested_permissions() {
		let expanded: Vec<_> = Wildcard::Reports.expand().collect();
		assert_eq!(
			expanded,
			vec![
				Permission::ReportsScoreRead,
				Permission::ReportsScoreReadComposite,
				Permission::ReportsProgressRead,
				Permission::ReportsStudentRead,
			]
		);
	}

	#[test]
	fn grants_parse_from_strings() {
		assert_eq!(
			"reports.score.*".parse::<PermissionGrant>(),
			Ok(PermissionGrant::Wildcard(Wildcard::ReportsScore))
		);
		assert_eq!(
			"administrations.list".parse::<PermissionGrant>(),
			Ok(PermissionGrant::Exact(Permission::AdministrationsList))
		);
		assert!("billing.*".parse::<PermissionGrant>().is_err());
		assert!("unknown.permission".parse::<Permission>().is_err());
	}

	#[test]
	fn grants_serialize_as_strings() {
		let grants = vec![
			PermissionGrant::Wildcard(Wildcard::Users),
			PermissionGrant::Exact(Permission::OrgsRead),
		];
		let json = serde_json::to_string(&grants).unwrap();
		assert_eq!(json, r#"["users.*","orgs.read"]"#);
		let back: Vec<PermissionGrant> = serde_json::from_str(&json).unwrap();
		assert_eq!(back, grants);
	}

	proptest! {
		#[test]
		fn wildcard_never_matches_textual_sibling(suffix in "[a-z_]{1,8}", action in "[a-z_]{1,8}") {
			let sibling = format!("reports.score{suffix}.{action}");
			prop_assert!(!Wildcard::ReportsScore.covers(&sibling));
		}

		#[test]
		fn wildcard_matches_anything_beneath(action in "[a-z_]{1,8}") {
			let beneath = format!("reports.score.{action}");
			prop_assert!(Wildcard::ReportsScore.covers(&beneath));
			prop_assert!(Wildcard::Reports.covers(&beneath));
		}
	}
}
