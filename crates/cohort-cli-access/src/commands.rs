// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand implementations. Each writes its result to `out`.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use cohort_server_access::{
	run_startup_check, visible_administrations, AccessPolicy, AdministrationId, GroupId, NodeId,
	Role, UserId,
};
use serde::Serialize;
use tracing::info;

use crate::snapshot::Snapshot;

/// Result of evaluating a snapshot.
#[derive(Debug, Serialize)]
pub struct ScopeReport {
	pub user_id: UserId,
	pub permission: String,
	pub evaluated_at: DateTime<Utc>,
	pub node_ids: BTreeSet<NodeId>,
	pub group_ids: BTreeSet<GroupId>,
	pub administration_ids: BTreeSet<AdministrationId>,
}

pub fn check(policy: &AccessPolicy, out: &mut impl Write) -> anyhow::Result<()> {
	let report = run_startup_check(policy).context("access policy self-check failed")?;
	writeln!(
		out,
		"ok: catalog v{}, {} roles ({} supervisory, {} supervised), {} permissions, {} grants",
		report.catalog_version,
		report.roles,
		report.supervisory_roles,
		report.supervised_roles,
		report.permissions,
		report.grants,
	)?;
	Ok(())
}

pub fn roles(policy: &AccessPolicy, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
	if json {
		serde_json::to_writer_pretty(&mut *out, &policy.snapshot())?;
		writeln!(out)?;
		return Ok(());
	}

	for role in Role::all() {
		let tier = policy
			.classifier()
			.tier(*role)
			.map_or_else(|| "unclassified".to_string(), |t| t.to_string());
		writeln!(out, "{:<24} {tier}", role.as_str())?;
	}
	Ok(())
}

pub fn describe(
	policy: &AccessPolicy,
	role: Role,
	json: bool,
	out: &mut impl Write,
) -> anyhow::Result<()> {
	let description = policy.describe_role(role);
	if json {
		serde_json::to_writer_pretty(&mut *out, &description)?;
		writeln!(out)?;
		return Ok(());
	}

	let tier = description
		.tier
		.map_or_else(|| "unclassified".to_string(), |t| t.to_string());
	writeln!(out, "role: {role}")?;
	writeln!(out, "tier: {tier}")?;
	writeln!(out, "grants:")?;
	for grant in &description.grants {
		writeln!(out, "  {grant}")?;
	}
	writeln!(out, "permissions:")?;
	for permission in &description.permissions {
		writeln!(out, "  {permission}")?;
	}
	Ok(())
}

pub fn resolve(
	policy: &AccessPolicy,
	permission: &str,
	json: bool,
	out: &mut impl Write,
) -> anyhow::Result<()> {
	let roles = policy.roles_for_permission(permission)?;
	if json {
		serde_json::to_writer_pretty(&mut *out, &roles)?;
		writeln!(out)?;
		return Ok(());
	}

	for role in roles {
		writeln!(out, "{role}")?;
	}
	Ok(())
}

pub fn scope(
	policy: &AccessPolicy,
	snapshot: &Snapshot,
	now: DateTime<Utc>,
	out: &mut impl Write,
) -> anyhow::Result<()> {
	let parsed = snapshot.request.parse(policy)?;
	let scope = parsed.scope(policy, now);
	let visible = scope.materialize(&parsed.catalog);
	let administration_ids =
		visible_administrations(&snapshot.assignments, &scope, &parsed.catalog);

	info!(
		user_id = %parsed.user_id,
		permission = %parsed.permission,
		nodes = visible.node_ids.len(),
		groups = visible.group_ids.len(),
		administrations = administration_ids.len(),
		"evaluated snapshot"
	);

	let report = ScopeReport {
		user_id: parsed.user_id,
		permission: parsed.permission,
		evaluated_at: now,
		node_ids: visible.node_ids,
		group_ids: visible.group_ids,
		administration_ids,
	};
	serde_json::to_writer_pretty(&mut *out, &report)?;
	writeln!(out)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use cohort_server_access::{AccessError, ConfigurationError, RoleClassifier, SUPERVISORY_ROLES};

	fn run(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
		let mut out = Vec::new();
		f(&mut out).unwrap();
		String::from_utf8(out).unwrap()
	}

	fn snapshot() -> Snapshot {
		serde_json::from_str(
			r#"{
				"request": {
					"user_id": "u1",
					"permission": "administrations.list",
					"memberships": [
						{"role": "student", "node_id": "class_X", "enrollment_start": "2024-08-15T00:00:00Z"},
						{"role": "parent", "group_id": "family-night", "enrollment_start": "2024-08-15T00:00:00Z"}
					],
					"nodes": [
						{"id": "district_1", "kind": "district", "path": "district_1"},
						{"id": "school_A", "kind": "school", "path": "district_1.school_A"},
						{"id": "class_X", "kind": "class", "path": "district_1.school_A.class_X"},
						{"id": "class_Y", "kind": "class", "path": "district_1.school_A.class_Y"}
					]
				},
				"assignments": [
					{"administration_id": "fall", "anchor": {"type": "node", "id": "district_1"}},
					{"administration_id": "class-y-quiz", "anchor": {"type": "node", "id": "class_Y"}},
					{"administration_id": "family", "anchor": {"type": "group", "id": "family-night"}}
				]
			}"#,
		)
		.unwrap()
	}

	#[test]
	fn check_reports_standard_policy() {
		let output = run(|out| check(AccessPolicy::standard(), out));
		assert!(output.starts_with("ok: catalog v1, 13 roles (9 supervisory, 4 supervised)"));
	}

	#[test]
	fn check_fails_on_broken_classification() {
		let classifier = RoleClassifier::new(SUPERVISORY_ROLES.iter().copied(), Vec::new());
		let grants = Role::all()
			.iter()
			.map(|r| (*r, AccessPolicy::standard().grants(*r).to_vec()));
		let policy = AccessPolicy::new(classifier, grants);

		let err = check(&policy, &mut Vec::<u8>::new()).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<ConfigurationError>(),
			Some(ConfigurationError::RoleClassification { .. })
		));
	}

	#[test]
	fn roles_lists_every_role_with_tier() {
		let output = run(|out| roles(AccessPolicy::standard(), false, out));
		assert_eq!(output.lines().count(), Role::all().len());
		assert!(output.lines().any(|l| l.starts_with("teacher") && l.ends_with("supervisory")));
		assert!(output.lines().any(|l| l.starts_with("relative") && l.ends_with("supervised")));
	}

	#[test]
	fn roles_json_is_policy_snapshot() {
		let output = run(|out| roles(AccessPolicy::standard(), true, out));
		let value: serde_json::Value = serde_json::from_str(&output).unwrap();
		assert_eq!(value["catalog_version"], 1);
		assert_eq!(value["roles"].as_array().unwrap().len(), Role::all().len());
	}

	#[test]
	fn describe_lists_grants_and_expanded_permissions() {
		let output = run(|out| describe(AccessPolicy::standard(), Role::Proctor, false, out));
		assert!(output.contains("tier: supervisory"));
		assert!(output.contains("  assessments.proctor"));
		assert!(!output.contains("reports.score.read"));
	}

	#[test]
	fn resolve_prints_roles() {
		let output = run(|out| resolve(AccessPolicy::standard(), "assessments.run", false, out));
		let roles: Vec<&str> = output.lines().collect();
		assert!(roles.contains(&"student"));
		assert!(roles.contains(&"system_administrator"));
		assert!(!roles.contains(&"guardian"));
	}

	#[test]
	fn resolve_unknown_permission_is_configuration_error() {
		let mut out = Vec::<u8>::new();
		let err = resolve(AccessPolicy::standard(), "grades.export", false, &mut out).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<ConfigurationError>(),
			Some(ConfigurationError::UnmatchedPermission { .. })
		));
	}

	#[test]
	fn scope_evaluates_snapshot() {
		let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
		let output = run(|out| scope(AccessPolicy::standard(), &snapshot(), now, out));
		let value: serde_json::Value = serde_json::from_str(&output).unwrap();

		assert_eq!(value["user_id"], "u1");
		assert_eq!(
			value["node_ids"],
			serde_json::json!(["class_X", "district_1", "school_A"])
		);
		assert_eq!(value["group_ids"], serde_json::json!(["family-night"]));
		assert_eq!(value["administration_ids"], serde_json::json!(["fall", "family"]));
	}

	#[test]
	fn scope_rejects_invalid_snapshot_input() {
		let mut snapshot = snapshot();
		snapshot.request.user_id = String::new();
		let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

		let err = scope(AccessPolicy::standard(), &snapshot, now, &mut Vec::<u8>::new()).unwrap_err();
		let access = err.downcast_ref::<AccessError>().unwrap();
		assert!(!access.is_configuration_defect());
	}
}
