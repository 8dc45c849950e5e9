// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The role → permission map and its reverse lookup.
//!
//! [`AccessPolicy`] bundles the static configuration the engine runs on: the role
//! classification and the permission grants of every role. The production policy is
//! built once on first use ([`AccessPolicy::standard`]) and never mutated.
//!
//! # Reverse lookup
//!
//! [`AccessPolicy::roles_for_permission`] answers "which roles may do X?". An empty
//! answer is never returned: if nobody holds the permission the policy (or the caller)
//! is broken, and that is reported as [`ConfigurationError::UnmatchedPermission`] so it
//! cannot be mistaken for a legitimate "nobody can see anything".

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::error;

use crate::error::{AccessError, ConfigurationError};
use crate::membership::AllowedRoles;
use crate::permission::{Permission, PermissionGrant, Wildcard, PERMISSION_CATALOG_VERSION};
use crate::role::{Role, RoleClassifier, RoleTier};

static STANDARD_POLICY: LazyLock<AccessPolicy> = LazyLock::new(|| {
	AccessPolicy::new(
		RoleClassifier::standard(),
		Role::all().iter().map(|r| (*r, standard_grants(*r))),
	)
});

/// Static access configuration: role tiers and role grants.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
	classifier: RoleClassifier,
	grants: BTreeMap<Role, Vec<PermissionGrant>>,
}

impl AccessPolicy {
	pub fn new(
		classifier: RoleClassifier,
		grants: impl IntoIterator<Item = (Role, Vec<PermissionGrant>)>,
	) -> Self {
		Self {
			classifier,
			grants: grants.into_iter().collect(),
		}
	}

	/// The process-wide production policy.
	pub fn standard() -> &'static AccessPolicy {
		&STANDARD_POLICY
	}

	pub fn classifier(&self) -> &RoleClassifier {
		&self.classifier
	}

	pub fn classify(&self, role: Role) -> Result<RoleTier, ConfigurationError> {
		self.classifier.classify(role)
	}

	/// Grants held by `role`. A role missing from the map holds nothing.
	pub fn grants(&self, role: Role) -> &[PermissionGrant] {
		self.grants.get(&role).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Roles that have an entry in the grant map.
	pub fn configured_roles(&self) -> impl Iterator<Item = Role> + '_ {
		self.grants.keys().copied()
	}

	/// Does `role` hold `permission`, exactly or through a wildcard?
	pub fn role_has_permission(&self, role: Role, permission: &str) -> bool {
		let grants = self.grants(role);
		grants
			.iter()
			.any(|g| matches!(g, PermissionGrant::Exact(p) if p.as_str() == permission))
			|| grants
				.iter()
				.any(|g| matches!(g, PermissionGrant::Wildcard(w) if w.covers(permission)))
	}

	/// Every role holding `permission`, in declaration order.
	///
	/// Fails with [`ConfigurationError::UnmatchedPermission`] if no role holds it.
	pub fn roles_for_permission(&self, permission: &str) -> Result<Vec<Role>, ConfigurationError> {
		let roles: Vec<Role> = Role::all()
			.iter()
			.copied()
			.filter(|r| self.role_has_permission(*r, permission))
			.collect();

		if roles.is_empty() {
			error!(permission, "no role is granted permission");
			return Err(ConfigurationError::UnmatchedPermission {
				permission: permission.to_string(),
			});
		}
		Ok(roles)
	}

	/// Typed variant of [`roles_for_permission`](Self::roles_for_permission).
	pub fn roles_for(&self, permission: Permission) -> Result<Vec<Role>, ConfigurationError> {
		self.roles_for_permission(permission.as_str())
	}

	/// Roles a query requiring `permission` should accept.
	pub fn allowed_roles(&self, permission: &str) -> Result<AllowedRoles, AccessError> {
		let roles = self.roles_for_permission(permission)?;
		Ok(AllowedRoles::new(roles)?)
	}

	/// Catalog permissions `role` holds once wildcards are expanded.
	pub fn permissions_for(&self, role: Role) -> BTreeSet<Permission> {
		self
			.grants(role)
			.iter()
			.flat_map(PermissionGrant::expand)
			.collect()
	}

	/// What a role can do, for admin tooling.
	pub fn describe_role(&self, role: Role) -> RoleDescription {
		RoleDescription {
			role,
			tier: self.classifier.tier(role),
			grants: self.grants(role).to_vec(),
			permissions: self.permissions_for(role).into_iter().collect(),
		}
	}

	/// Read-only view of the whole policy for auditing.
	pub fn snapshot(&self) -> PolicySnapshot {
		PolicySnapshot {
			catalog_version: PERMISSION_CATALOG_VERSION,
			permissions: Permission::all().to_vec(),
			wildcards: Wildcard::all().iter().map(|w| w.to_string()).collect(),
			roles: Role::all().iter().map(|r| self.describe_role(*r)).collect(),
		}
	}
}

/// A role's tier, raw grants and expanded permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDescription {
	pub role: Role,
	pub tier: Option<RoleTier>,
	pub grants: Vec<PermissionGrant>,
	pub permissions: Vec<Permission>,
}

/// Serializable dump of an [`AccessPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySnapshot {
	pub catalog_version: u32,
	pub permissions: Vec<Permission>,
	pub wildcards: Vec<String>,
	pub roles: Vec<RoleDescription>,
}

/// Reverse lookup against the production policy.
pub fn roles_for_permission(permission: &str) -> Result<Vec<Role>, ConfigurationError> {
	AccessPolicy::standard().roles_for_permission(permission)
}

/// Tier lookup against the production policy.
pub fn classify(role: Role) -> Result<RoleTier, ConfigurationError> {
	AccessPolicy::standard().classify(role)
}

fn standard_grants(role: Role) -> Vec<PermissionGrant> {
	use crate::permission::Permission as P;
	use crate::permission::Wildcard as W;

	let read_administrations = [P::AdministrationsList, P::AdministrationsRead];

	let mut grants: Vec<PermissionGrant> = match role {
		Role::SystemAdministrator => vec![
			W::Administrations.into(),
			W::Assessments.into(),
			W::Groups.into(),
			W::Orgs.into(),
			W::Users.into(),
			W::Profile.into(),
			W::Reports.into(),
		],
		Role::DistrictAdministrator | Role::SiteAdministrator | Role::Administrator => vec![
			W::Administrations.into(),
			W::Reports.into(),
			W::Users.into(),
			W::Orgs.into(),
			W::Profile.into(),
			P::GroupsList.into(),
			P::GroupsRead.into(),
			P::AssessmentsProctor.into(),
		],
		Role::Principal => vec![
			W::Reports.into(),
			P::UsersList.into(),
			P::UsersRead.into(),
			P::OrgsList.into(),
			P::OrgsRead.into(),
			P::GroupsList.into(),
			P::GroupsRead.into(),
			W::Profile.into(),
		],
		Role::Counselor => vec![
			W::ReportsScore.into(),
			P::ReportsProgressRead.into(),
			P::ReportsStudentRead.into(),
			P::UsersList.into(),
			P::UsersRead.into(),
			P::OrgsList.into(),
			P::OrgsRead.into(),
			W::Profile.into(),
		],
		Role::Teacher => vec![
			W::ReportsScore.into(),
			P::ReportsProgressRead.into(),
			P::ReportsStudentRead.into(),
			P::UsersList.into(),
			P::UsersRead.into(),
			P::GroupsList.into(),
			P::GroupsRead.into(),
			P::AssessmentsProctor.into(),
			W::Profile.into(),
		],
		Role::Aide => vec![
			P::ReportsProgressRead.into(),
			P::UsersList.into(),
			P::AssessmentsProctor.into(),
			P::ProfileRead.into(),
		],
		Role::Proctor => vec![
			P::ReportsProgressRead.into(),
			P::AssessmentsProctor.into(),
			P::ProfileRead.into(),
		],
		Role::Student => vec![P::AssessmentsRun.into(), P::ProfileRead.into()],
		Role::Guardian | Role::Parent => vec![
			P::ReportsScoreRead.into(),
			P::ReportsStudentRead.into(),
			P::ProfileRead.into(),
		],
		Role::Relative => vec![P::ProfileRead.into()],
	};

	// Administrator tiers hold `administrations.*`; everyone else reads explicitly.
	if !matches!(
		role,
		Role::SystemAdministrator
			| Role::DistrictAdministrator
			| Role::SiteAdministrator
			| Role::Administrator
	) {
		grants.extend(read_administrations.map(PermissionGrant::from));
	}
	grants
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn policy() -> &'static AccessPolicy {
		AccessPolicy::standard()
	}

	mod reverse_lookup {
		use super::*;

		#[test]
		fn unknown_permission_is_a_configuration_error() {
			assert_eq!(
				policy().roles_for_permission("unknown.permission"),
				Err(ConfigurationError::UnmatchedPermission {
					permission: "unknown.permission".to_string()
				})
			);
		}

		#[test]
		fn score_wildcard_holders_match_score_actions() {
			let read = policy().roles_for_permission("reports.score.read").unwrap();
			let composite = policy()
				.roles_for_permission("reports.score.read_composite")
				.unwrap();
			let progress = policy().roles_for_permission("reports.progress.read").unwrap();

			assert!(read.contains(&Role::Teacher));
			assert!(composite.contains(&Role::Teacher));
			assert!(composite.contains(&Role::Counselor));
			assert!(!composite.contains(&Role::Parent));
			assert!(read.contains(&Role::Parent));

			// Teacher holds `reports.progress.read` explicitly, not via `reports.score.*`.
			let teacher_only_wildcard = AccessPolicy::new(
				RoleClassifier::standard(),
				[(Role::Teacher, vec![PermissionGrant::Wildcard(Wildcard::ReportsScore)])],
			);
			assert_eq!(
				teacher_only_wildcard.roles_for_permission("reports.score.read_composite"),
				Ok(vec![Role::Teacher])
			);
			assert!(teacher_only_wildcard
				.roles_for_permission("reports.progress.read")
				.is_err());
			assert!(progress.contains(&Role::Aide));
		}

		#[test]
		fn every_role_can_list_administrations() {
			assert_eq!(
				policy().roles_for(Permission::AdministrationsList).unwrap(),
				Role::all().to_vec()
			);
		}

		#[test]
		fn write_permissions_stay_with_administrators() {
			let roles = policy().roles_for(Permission::AdministrationsCreate).unwrap();
			assert_eq!(
				roles,
				vec![
					Role::SystemAdministrator,
					Role::DistrictAdministrator,
					Role::SiteAdministrator,
					Role::Administrator,
				]
			);
		}

		#[test]
		fn allowed_roles_wraps_lookup() {
			let allowed = policy().allowed_roles("assessments.run").unwrap();
			assert!(allowed.contains(Role::Student));
			assert!(allowed.contains(Role::SystemAdministrator));
			assert!(!allowed.contains(Role::Teacher));

			let err = policy().allowed_roles("billing.read").unwrap_err();
			assert!(err.is_configuration_defect());
		}

		#[test]
		fn free_functions_use_standard_policy() {
			assert_eq!(
				roles_for_permission("assessments.run"),
				policy().roles_for_permission("assessments.run")
			);
			assert_eq!(classify(Role::Student), Ok(RoleTier::Supervised));
		}
	}

	mod introspection {
		use super::*;

		#[test]
		fn every_role_has_grants() {
			for role in Role::all() {
				assert!(!policy().grants(*role).is_empty(), "{role} has no grants");
			}
		}

		#[test]
		fn system_administrator_holds_whole_catalog() {
			let perms = policy().permissions_for(Role::SystemAdministrator);
			assert_eq!(perms.len(), Permission::all().len());
		}

		#[test]
		fn describe_role_expands_wildcards() {
			let desc = policy().describe_role(Role::Counselor);
			assert_eq!(desc.tier, Some(RoleTier::Supervisory));
			assert!(desc.grants.contains(&PermissionGrant::Wildcard(Wildcard::ReportsScore)));
			assert!(desc.permissions.contains(&Permission::ReportsScoreReadComposite));
			assert!(!desc.permissions.contains(&Permission::UsersUpdate));
		}

		#[test]
		fn snapshot_serializes() {
			let snapshot = policy().snapshot();
			assert_eq!(snapshot.catalog_version, PERMISSION_CATALOG_VERSION);
			assert_eq!(snapshot.roles.len(), Role::all().len());
			let json = serde_json::to_value(&snapshot).unwrap();
			assert_eq!(json["roles"][0]["role"], "system_administrator");
			assert_eq!(json["roles"][0]["tier"], "supervisory");
			assert!(json["wildcards"]
				.as_array()
				.unwrap()
				.contains(&serde_json::json!("reports.score.*")));
		}

		#[test]
		fn missing_role_holds_nothing() {
			let empty = AccessPolicy::new(RoleClassifier::standard(), Vec::new());
			assert!(empty.grants(Role::Teacher).is_empty());
			assert!(!empty.role_has_permission(Role::Teacher, "administrations.list"));
		}
	}

	fn arb_role() -> impl Strategy<Value = Role> {
		proptest::sample::select(Role::all().to_vec())
	}

	fn arb_permission() -> impl Strategy<Value = Permission> {
		proptest::sample::select(Permission::all().to_vec())
	}

	proptest! {
		#[test]
		fn reverse_lookup_is_complete_and_sound(permission in arb_permission()) {
			let roles = policy().roles_for(permission).unwrap();
			prop_assert!(!roles.is_empty());
			for role in Role::all() {
				prop_assert_eq!(
					roles.contains(role),
					policy().role_has_permission(*role, permission.as_str())
				);
			}
		}

		#[test]
		fn expanded_permissions_agree_with_matching(role in arb_role(), permission in arb_permission()) {
			prop_assert_eq!(
				policy().permissions_for(role).contains(&permission),
				policy().role_has_permission(role, permission.as_str())
			);
		}
	}
}
