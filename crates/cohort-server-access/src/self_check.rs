// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Startup self-check for an [`AccessPolicy`].
//!
//! Run once before serving traffic so configuration defects surface at boot rather
//! than as per-request failures.

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::ConfigurationError;
use crate::permission::{Permission, PermissionGrant, PERMISSION_CATALOG_VERSION};
use crate::policy::AccessPolicy;
use crate::role::Role;

/// Summary of a policy that passed the self-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyReport {
	pub catalog_version: u32,
	pub roles: usize,
	pub supervisory_roles: usize,
	pub supervised_roles: usize,
	pub permissions: usize,
	pub grants: usize,
}

/// Verifies that `policy` is complete and consistent.
///
/// Checks, in order, stopping at the first defect:
/// - every role is in exactly one tier
/// - every role has at least one grant
/// - every wildcard grant covers at least one catalog permission
/// - every catalog permission is held by at least one role
#[instrument(level = "debug", skip(policy))]
pub fn run_startup_check(policy: &AccessPolicy) -> Result<PolicyReport, ConfigurationError> {
	policy.classifier().verify()?;

	let mut grants = 0;
	for &role in Role::all() {
		let role_grants = policy.grants(role);
		if role_grants.is_empty() {
			return Err(ConfigurationError::MissingGrants { role });
		}
		for grant in role_grants {
			if let PermissionGrant::Wildcard(wildcard) = grant {
				if wildcard.expand().next().is_none() {
					return Err(ConfigurationError::DeadWildcard { wildcard: *wildcard });
				}
			}
		}
		grants += role_grants.len();
	}

	for &permission in Permission::all() {
		policy.roles_for(permission)?;
	}

	let report = PolicyReport {
		catalog_version: PERMISSION_CATALOG_VERSION,
		roles: Role::all().len(),
		supervisory_roles: policy.classifier().supervisory().count(),
		supervised_roles: policy.classifier().supervised().count(),
		permissions: Permission::all().len(),
		grants,
	};
	info!(
		catalog_version = report.catalog_version,
		roles = report.roles,
		supervisory = report.supervisory_roles,
		supervised = report.supervised_roles,
		permissions = report.permissions,
		grants = report.grants,
		"access policy self-check passed"
	);
	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::permission::Wildcard;
	use crate::role::{RoleClassifier, RoleTier, SUPERVISED_ROLES, SUPERVISORY_ROLES};

	fn full_grants() -> Vec<(Role, Vec<PermissionGrant>)> {
		Role::all()
			.iter()
			.map(|r| (*r, AccessPolicy::standard().grants(*r).to_vec()))
			.collect()
	}

	#[test]
	fn standard_policy_passes() {
		let report = run_startup_check(AccessPolicy::standard()).unwrap();
		assert_eq!(report.catalog_version, PERMISSION_CATALOG_VERSION);
		assert_eq!(report.roles, 13);
		assert_eq!(report.supervisory_roles, 9);
		assert_eq!(report.supervised_roles, 4);
		assert_eq!(report.permissions, Permission::all().len());
		assert!(report.grants >= report.roles);
	}

	#[test]
	fn unclassified_role_is_reported() {
		let classifier = RoleClassifier::new(
			SUPERVISORY_ROLES.iter().copied(),
			SUPERVISED_ROLES
				.iter()
				.copied()
				.filter(|r| *r != Role::Relative),
		);
		let policy = AccessPolicy::new(classifier, full_grants());
		assert_eq!(
			run_startup_check(&policy),
			Err(ConfigurationError::RoleClassification {
				unclassified: vec![Role::Relative],
				overlapping: vec![],
			})
		);
	}

	#[test]
	fn overlapping_role_is_reported() {
		let classifier = RoleClassifier::new(
			SUPERVISORY_ROLES.iter().copied().chain([Role::Guardian]),
			SUPERVISED_ROLES.iter().copied(),
		);
		assert_eq!(classifier.tier(Role::Guardian), None);
		assert_eq!(classifier.tier(Role::Teacher), Some(RoleTier::Supervisory));

		let policy = AccessPolicy::new(classifier, full_grants());
		assert_eq!(
			run_startup_check(&policy),
			Err(ConfigurationError::RoleClassification {
				unclassified: vec![],
				overlapping: vec![Role::Guardian],
			})
		);
	}

	#[test]
	fn role_without_grants_is_reported() {
		let grants = full_grants()
			.into_iter()
			.filter(|(role, _)| *role != Role::Proctor);
		let policy = AccessPolicy::new(RoleClassifier::standard(), grants);
		assert_eq!(
			run_startup_check(&policy),
			Err(ConfigurationError::MissingGrants { role: Role::Proctor })
		);
	}

	#[test]
	fn permission_held_by_no_role_is_reported() {
		let grants = full_grants().into_iter().map(|(role, grants)| {
			let kept = grants
				.into_iter()
				.filter(|g| !g.matches(Permission::AdministrationsCreate.as_str()))
				.collect::<Vec<_>>();
			(role, kept)
		});
		let policy = AccessPolicy::new(RoleClassifier::standard(), grants);
		assert_eq!(
			run_startup_check(&policy),
			Err(ConfigurationError::UnmatchedPermission {
				permission: "administrations.create".to_string(),
			})
		);
	}

	#[test]
	fn every_wildcard_is_live() {
		for wildcard in Wildcard::all() {
			assert!(wildcard.expand().next().is_some(), "{wildcard} covers nothing");
		}
	}
}
