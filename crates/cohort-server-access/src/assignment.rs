// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Administration assignments and their visibility.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::hierarchy::HierarchyProvider;
use crate::scope::AccessScope;
use crate::types::{AdministrationId, GroupId, NodeId};

/// Where an administration is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum AssignmentAnchor {
	/// A district, school or class.
	Node(NodeId),
	/// A flat group.
	Group(GroupId),
}

/// Links an administration to exactly one node or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdministrationAssignment {
	pub administration_id: AdministrationId,
	pub anchor: AssignmentAnchor,
}

impl AdministrationAssignment {
	pub fn new(administration_id: AdministrationId, anchor: AssignmentAnchor) -> Self {
		Self {
			administration_id,
			anchor,
		}
	}

	/// Visible if the anchor node is in scope, or the anchor group was granted directly.
	pub fn is_visible_in<H: HierarchyProvider + ?Sized>(&self, scope: &AccessScope, provider: &H) -> bool {
		match &self.anchor {
			AssignmentAnchor::Node(node) => scope.contains_node(node, provider),
			AssignmentAnchor::Group(group) => scope.contains_group(group),
		}
	}
}

/// Administrations with at least one visible assignment.
pub fn visible_administrations<H: HierarchyProvider + ?Sized>(
	assignments: &[AdministrationAssignment],
	scope: &AccessScope,
	provider: &H,
) -> BTreeSet<AdministrationId> {
	assignments
		.iter()
		.filter(|a| a.is_visible_in(scope, provider))
		.map(|a| a.administration_id.clone())
		.collect()
}
