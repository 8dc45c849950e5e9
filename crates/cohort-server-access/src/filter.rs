// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Boundary parsing for access-filter requests.
//!
//! Hosts hand the engine raw strings. Everything malformed is rejected here with an
//! [`InvalidInputError`] so the core predicates only ever see typed, validated values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::enrollment::Enrollment;
use crate::error::{AccessError, InvalidInputError};
use crate::hierarchy::{HierarchyNode, NodeCatalog, NodeKind, NodePath};
use crate::membership::{AllowedRoles, Membership, MembershipTarget};
use crate::policy::AccessPolicy;
use crate::role::Role;
use crate::scope::{AccessScope, VisibleNodes};
use crate::types::{GroupId, NodeId, UserId};

/// Unvalidated request as received from the host service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessFilterRequest {
	pub user_id: String,
	pub permission: String,
	#[serde(default)]
	pub memberships: Vec<MembershipRecord>,
	/// Org-tree nodes with their materialized paths.
	#[serde(default)]
	pub nodes: Vec<NodeRecord>,
}

/// One raw membership row. Exactly one of `node_id` and `group_id` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
	pub role: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub node_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub group_id: Option<String>,
	pub enrollment_start: DateTime<Utc>,
	#[serde(default)]
	pub enrollment_end: Option<DateTime<Utc>>,
}

/// One raw org-tree node with a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
	pub id: String,
	pub kind: NodeKind,
	pub path: String,
}

/// A request that passed boundary validation and permission resolution.
#[derive(Debug, Clone)]
pub struct ParsedAccessFilter {
	pub user_id: UserId,
	pub permission: String,
	pub allowed_roles: AllowedRoles,
	pub memberships: Vec<Membership>,
	pub catalog: NodeCatalog,
}

impl AccessFilterRequest {
	/// Validates the request and resolves its permission against `policy`.
	///
	/// Malformed input is reported before the permission is looked up, so a bad
	/// request is never mistaken for a policy defect.
	#[instrument(
		level = "debug",
		skip(self, policy),
		fields(
			permission = %self.permission,
			memberships = self.memberships.len(),
			nodes = self.nodes.len(),
		)
	)]
	pub fn parse(&self, policy: &AccessPolicy) -> Result<ParsedAccessFilter, AccessError> {
		let user_id = UserId::new(self.user_id.as_str())?;
		if self.permission.is_empty() {
			return Err(InvalidInputError::EmptyId { kind: "permission" }.into());
		}

		let memberships = self
			.memberships
			.iter()
			.map(|record| record.parse(&user_id))
			.collect::<Result<Vec<_>, _>>()?;
		let catalog = parse_nodes(&self.nodes)?;
		let allowed_roles = policy.allowed_roles(&self.permission)?;

		debug!(user_id = %user_id, "access filter request accepted");
		Ok(ParsedAccessFilter {
			user_id,
			permission: self.permission.clone(),
			allowed_roles,
			memberships,
			catalog,
		})
	}
}

impl MembershipRecord {
	fn parse(&self, user_id: &UserId) -> Result<Membership, InvalidInputError> {
		let role: Role = self.role.parse()?;
		let target = match (&self.node_id, &self.group_id) {
			(Some(node), None) => MembershipTarget::Node(NodeId::new(node.as_str())?),
			(None, Some(group)) => MembershipTarget::Group(GroupId::new(group.as_str())?),
			_ => return Err(InvalidInputError::AmbiguousTarget),
		};
		let enrollment = Enrollment::new(self.enrollment_start, self.enrollment_end)?;
		Ok(Membership::new(user_id.clone(), target, role, enrollment))
	}
}

impl NodeRecord {
	fn parse(&self) -> Result<HierarchyNode, InvalidInputError> {
		let id = NodeId::new(self.id.as_str())?;
		let path: NodePath = self.path.parse()?;
		HierarchyNode::new(id, self.kind, path)
	}
}

fn parse_nodes(records: &[NodeRecord]) -> Result<NodeCatalog, InvalidInputError> {
	let nodes = records
		.iter()
		.map(NodeRecord::parse)
		.collect::<Result<Vec<_>, _>>()?;
	NodeCatalog::from_nodes(nodes)
}

impl ParsedAccessFilter {
	/// Access scope of the request at `now`, using the roles resolved during parsing.
	pub fn scope(&self, policy: &AccessPolicy, now: DateTime<Utc>) -> AccessScope {
		AccessScope::for_roles(
			policy,
			&self.user_id,
			&self.memberships,
			&self.allowed_roles,
			now,
			&self.catalog,
		)
	}

	/// Materialized node and group IDs visible at `now`.
	pub fn visible_nodes(&self, policy: &AccessPolicy, now: DateTime<Utc>) -> VisibleNodes {
		self.scope(policy, now).materialize(&self.catalog)
	}
}
