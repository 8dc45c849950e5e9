// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access scope computation.
//!
//! Given a principal's memberships and the permission a query requires, work out which
//! parts of the org tree (and which groups) the principal can see:
//!
//! 1. Resolve the roles holding the permission.
//! 2. Keep memberships of this user, with one of those roles, active at `now`.
//! 3. Each surviving node membership contributes its node and every ancestor. If the
//!    role is supervisory, the node's whole subtree is contributed as well.
//! 4. Each surviving group membership contributes that group, nothing more.
//!
//! [`AccessScope`] keeps subtrees as path prefixes so membership tests are O(depth) per
//! subtree root. [`VisibleNodes`] is the materialized form handed to query builders.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, error, instrument};

use crate::error::AccessError;
use crate::hierarchy::{HierarchyProvider, NodePath};
use crate::membership::{is_authorized, AllowedRoles, Membership, MembershipTarget};
use crate::policy::AccessPolicy;
use crate::role::RoleTier;
use crate::types::{GroupId, NodeId, UserId};

/// Everything a principal can see for one permission, kept in prefix form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessScope {
	nodes: BTreeSet<NodeId>,
	subtrees: BTreeSet<NodePath>,
	groups: BTreeSet<GroupId>,
}

impl AccessScope {
	/// Computes the scope of `user_id` for `permission` at `now`.
	///
	/// Returns an error only for configuration defects (the permission is held by no
	/// role). A principal with no qualifying membership gets an empty scope.
	#[instrument(
		level = "debug",
		skip(policy, memberships, provider),
		fields(
			user_id = %user_id,
			permission = permission,
			memberships = memberships.len(),
		)
	)]
	pub fn build<H: HierarchyProvider + ?Sized>(
		policy: &AccessPolicy,
		user_id: &UserId,
		memberships: &[Membership],
		permission: &str,
		now: DateTime<Utc>,
		provider: &H,
	) -> Result<Self, AccessError> {
		let allowed = policy.allowed_roles(permission)?;
		Ok(Self::for_roles(policy, user_id, memberships, &allowed, now, provider))
	}

	/// Computes the scope of `user_id` from roles already resolved for a permission.
	pub fn for_roles<H: HierarchyProvider + ?Sized>(
		policy: &AccessPolicy,
		user_id: &UserId,
		memberships: &[Membership],
		allowed: &AllowedRoles,
		now: DateTime<Utc>,
		provider: &H,
	) -> Self {
		let mut scope = Self::default();

		for membership in memberships
			.iter()
			.filter(|m| is_authorized(m, user_id, allowed, now))
		{
			let tier = match policy.classify(membership.role) {
				Ok(tier) => tier,
				Err(e) => {
					error!(role = %membership.role, error = %e, "skipping membership with unclassified role");
					continue;
				}
			};

			match &membership.target {
				MembershipTarget::Node(node_id) => {
					let path = path_or_root(provider, node_id);
					debug!(node = %node_id, path = %path, tier = %tier, "membership contributes node");
					scope.nodes.extend(path.segments().iter().cloned());
					if tier == RoleTier::Supervisory {
						scope.subtrees.insert(path);
					}
				}
				MembershipTarget::Group(group_id) => {
					debug!(group = %group_id, "membership contributes group");
					scope.groups.insert(group_id.clone());
				}
			}
		}

		debug!(
			nodes = scope.nodes.len(),
			subtrees = scope.subtrees.len(),
			groups = scope.groups.len(),
			"access scope computed"
		);
		scope
	}

	/// True if a resource anchored at `path` is visible.
	pub fn contains_path(&self, path: &NodePath) -> bool {
		self.nodes.contains(path.leaf())
			|| self
				.subtrees
				.iter()
				.any(|root| path.is_descendant_or_equal(root))
	}

	/// True if a resource anchored at `node` is visible.
	pub fn contains_node<H: HierarchyProvider + ?Sized>(&self, node: &NodeId, provider: &H) -> bool {
		self.contains_path(&path_or_root(provider, node))
	}

	/// True if a resource anchored at `group` is visible.
	pub fn contains_group(&self, group: &GroupId) -> bool {
		self.groups.contains(group)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.groups.is_empty()
	}

	/// Roots of the subtrees granted through supervisory memberships.
	pub fn subtree_roots(&self) -> impl Iterator<Item = &NodePath> {
		self.subtrees.iter()
	}

	/// Expands subtrees into explicit node IDs.
	pub fn materialize<H: HierarchyProvider + ?Sized>(&self, provider: &H) -> VisibleNodes {
		let mut node_ids = self.nodes.clone();
		for root in &self.subtrees {
			node_ids.extend(provider.descendants_of(root));
		}
		VisibleNodes {
			node_ids,
			group_ids: self.groups.clone(),
		}
	}
}

/// Materialized visibility: the node and group IDs a query may touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisibleNodes {
	pub node_ids: BTreeSet<NodeId>,
	pub group_ids: BTreeSet<GroupId>,
}

impl VisibleNodes {
	pub fn is_empty(&self) -> bool {
		self.node_ids.is_empty() && self.group_ids.is_empty()
	}
}

/// Computes the visible node and group IDs under the production policy.
pub fn compute_visible_nodes<H: HierarchyProvider + ?Sized>(
	user_id: &UserId,
	memberships: &[Membership],
	permission: &str,
	now: DateTime<Utc>,
	provider: &H,
) -> Result<VisibleNodes, AccessError> {
	let scope = AccessScope::build(
		AccessPolicy::standard(),
		user_id,
		memberships,
		permission,
		now,
		provider,
	)?;
	Ok(scope.materialize(provider))
}

/// A node with no recorded path is its own root.
fn path_or_root<H: HierarchyProvider + ?Sized>(provider: &H, node: &NodeId) -> NodePath {
	provider.path_of(node).unwrap_or_else(|| {
		debug!(node = %node, "node has no recorded path, treating as root");
		NodePath::root(node.clone())
	})
}
