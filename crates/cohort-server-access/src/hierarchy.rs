// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The district → school → class tree and containment tests over it.
//!
//! Each node carries a materialized [`NodePath`]: the node IDs from the root down to
//! the node itself. Containment is a segment-wise prefix comparison, so `district_1`
//! is never mistaken for an ancestor of `district_10`.
//!
//! The engine reads the tree through [`HierarchyProvider`]. [`NodeCatalog`] is the
//! in-memory implementation used for snapshots and tests; a database-backed provider
//! must answer the same queries with the same semantics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::InvalidInputError;
use crate::types::NodeId;

const SEPARATOR: char = '.';

/// Root-to-node sequence of node IDs. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(Vec<NodeId>);

impl NodePath {
	/// Path of a node with no parent.
	pub fn root(id: NodeId) -> Self {
		Self(vec![id])
	}

	pub fn from_segments(segments: Vec<NodeId>) -> Result<Self, InvalidInputError> {
		if segments.is_empty() {
			return Err(InvalidInputError::MalformedPath {
				path: String::new(),
				reason: "path has no segments",
			});
		}
		let path = Self(segments);
		if path.has_repeated_segment() {
			return Err(InvalidInputError::MalformedPath {
				path: path.to_string(),
				reason: "path repeats a segment",
			});
		}
		Ok(path)
	}

	pub fn segments(&self) -> &[NodeId] {
		&self.0
	}

	/// Number of segments; a root has depth 1.
	pub fn depth(&self) -> usize {
		self.0.len()
	}

	/// The node this path leads to.
	pub fn leaf(&self) -> &NodeId {
		// Non-empty by construction.
		&self.0[self.0.len() - 1]
	}

	pub fn parent(&self) -> Option<NodePath> {
		if self.0.len() < 2 {
			return None;
		}
		Some(Self(self.0[..self.0.len() - 1].to_vec()))
	}

	/// Extends the path by one segment. A node cannot appear twice on its own path.
	pub fn child(&self, id: NodeId) -> Result<NodePath, InvalidInputError> {
		let mut segments = self.0.clone();
		segments.push(id);
		Self::from_segments(segments)
	}

	/// IDs of every strict ancestor, root first.
	pub fn ancestors(&self) -> impl Iterator<Item = &NodeId> {
		self.0[..self.0.len() - 1].iter()
	}

	/// True if `ancestor` is a segment-wise prefix of this path (or equal to it).
	pub fn is_descendant_or_equal(&self, ancestor: &NodePath) -> bool {
		self.0.starts_with(&ancestor.0)
	}

	/// True if this path is a segment-wise prefix of `descendant` (or equal to it).
	pub fn is_ancestor_or_equal(&self, descendant: &NodePath) -> bool {
		descendant.is_descendant_or_equal(self)
	}

	/// True if every node the two paths share sits under the same ancestors in both.
	pub fn agrees_with(&self, other: &NodePath) -> bool {
		self.0.iter().enumerate().all(|(i, id)| {
			other
				.0
				.iter()
				.position(|s| s == id)
				.map_or(true, |j| self.0[..=i] == other.0[..=j])
		})
	}

	fn has_repeated_segment(&self) -> bool {
		self.0
			.iter()
			.enumerate()
			.any(|(i, id)| self.0[..i].contains(id))
	}
}

impl fmt::Display for NodePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, segment) in self.0.iter().enumerate() {
			if i > 0 {
				write!(f, "{SEPARATOR}")?;
			}
			f.write_str(segment.as_str())?;
		}
		Ok(())
	}
}

impl FromStr for NodePath {
	type Err = InvalidInputError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let malformed = |reason| InvalidInputError::MalformedPath {
			path: s.to_string(),
			reason,
		};

		if s.is_empty() {
			return Err(malformed("path is empty"));
		}

		let mut segments = Vec::new();
		for raw in s.split(SEPARATOR) {
			if raw.is_empty() {
				return Err(malformed("path has an empty segment"));
			}
			let id = NodeId::new(raw).map_err(|_| malformed("segment is not a valid node id"))?;
			if segments.contains(&id) {
				return Err(malformed("path repeats a segment"));
			}
			segments.push(id);
		}
		Ok(Self(segments))
	}
}

impl Serialize for NodePath {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for NodePath {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// Level of a node in the org tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
	District,
	School,
	Class,
}

/// A district, school or class together with its materialized path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HierarchyNodeRecord")]
pub struct HierarchyNode {
	id: NodeId,
	kind: NodeKind,
	path: NodePath,
}

#[derive(Deserialize)]
struct HierarchyNodeRecord {
	id: NodeId,
	kind: NodeKind,
	path: NodePath,
}

impl TryFrom<HierarchyNodeRecord> for HierarchyNode {
	type Error = InvalidInputError;

	fn try_from(record: HierarchyNodeRecord) -> Result<Self, Self::Error> {
		HierarchyNode::new(record.id, record.kind, record.path)
	}
}

impl HierarchyNode {
	/// Creates a node, checking that its path ends with its own ID.
	pub fn new(id: NodeId, kind: NodeKind, path: NodePath) -> Result<Self, InvalidInputError> {
		if path.leaf() != &id {
			return Err(InvalidInputError::PathMismatch {
				node_id: id.into_inner(),
				path: path.to_string(),
			});
		}
		Ok(Self { id, kind, path })
	}

	/// A node with no parent.
	pub fn root(id: NodeId, kind: NodeKind) -> Self {
		let path = NodePath::root(id.clone());
		Self { id, kind, path }
	}

	/// A node placed directly beneath `parent`.
	pub fn child_of(
		parent: &HierarchyNode,
		id: NodeId,
		kind: NodeKind,
	) -> Result<Self, InvalidInputError> {
		let path = parent.path.child(id.clone())?;
		Ok(Self { id, kind, path })
	}

	pub fn id(&self) -> &NodeId {
		&self.id
	}

	pub fn kind(&self) -> NodeKind {
		self.kind
	}

	pub fn path(&self) -> &NodePath {
		&self.path
	}
}

/// Read access to the org tree.
pub trait HierarchyProvider {
	/// Canonical path of a node, if the node is known.
	fn path_of(&self, node: &NodeId) -> Option<NodePath>;

	/// IDs of every strict descendant of the node at `path`.
	fn descendants_of(&self, path: &NodePath) -> Vec<NodeId>;
}

/// In-memory snapshot of the org tree keyed by node ID.
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
	nodes: BTreeMap<NodeId, HierarchyNode>,
}

impl NodeCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a catalog. The result does not depend on the order of `nodes`.
	pub fn from_nodes(nodes: impl IntoIterator<Item = HierarchyNode>) -> Result<Self, InvalidInputError> {
		let mut catalog = Self::new();
		for node in nodes {
			catalog.insert(node)?;
		}
		Ok(catalog)
	}

	/// Records a node.
	///
	/// Re-inserting an identical node is a no-op. The new path must agree with every
	/// recorded path on the ancestors of each node they share, whichever was recorded
	/// first, so a node never ends up beneath two different parents.
	pub fn insert(&mut self, node: HierarchyNode) -> Result<(), InvalidInputError> {
		if let Some(existing) = self.nodes.get(&node.id) {
			if existing == &node {
				return Ok(());
			}
			return Err(InvalidInputError::ConflictingNode {
				node_id: node.id.into_inner(),
			});
		}

		if let Some(other) = self.nodes.values().find(|n| !n.path.agrees_with(&node.path)) {
			debug!(node = %node.id, path = %node.path, conflicts_with = %other.path, "rejecting node");
			return Err(InvalidInputError::MalformedPath {
				path: node.path.to_string(),
				reason: "path disagrees with a recorded node's ancestry",
			});
		}

		self.nodes.insert(node.id.clone(), node);
		Ok(())
	}

	pub fn get(&self, id: &NodeId) -> Option<&HierarchyNode> {
		self.nodes.get(id)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &HierarchyNode> {
		self.nodes.values()
	}
}

impl HierarchyProvider for NodeCatalog {
	fn path_of(&self, node: &NodeId) -> Option<NodePath> {
		self.nodes.get(node).map(|n| n.path.clone())
	}

	fn descendants_of(&self, path: &NodePath) -> Vec<NodeId> {
		self
			.nodes
			.values()
			.filter(|n| n.path.depth() > path.depth() && n.path.is_descendant_or_equal(path))
			.map(|n| n.id.clone())
			.collect()
	}
}
