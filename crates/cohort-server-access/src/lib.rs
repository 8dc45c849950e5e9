// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hierarchical role-based visibility for assessment administrations.
//!
//! This crate provides:
//! - The permission catalog, wildcard grants and the static role policy
//! - Supervisory/supervised role classification
//! - Enrollment windows and the authorized-membership predicate
//! - Segment-exact path containment over the district → school → class tree
//! - The access scope builder used to filter administration assignments
//! - Boundary parsing of raw filter requests and a startup self-check
//!
//! The engine is pure and synchronous. Callers pass `now` explicitly and supply the
//! org tree through [`HierarchyProvider`].
//!
//! # Usage
//!
//! ```ignore
//! use cohort_server_access::{compute_visible_nodes, NodeCatalog};
//!
//! let visible = compute_visible_nodes(&user_id, &memberships, "administrations.list", now, &catalog)?;
//! query.filter_by_nodes(&visible.node_ids).filter_by_groups(&visible.group_ids);
//! ```

pub mod assignment;
pub mod enrollment;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod membership;
pub mod permission;
pub mod policy;
pub mod role;
pub mod scope;
pub mod self_check;
pub mod types;

pub use assignment::{visible_administrations, AdministrationAssignment, AssignmentAnchor};
pub use enrollment::Enrollment;
pub use error::{AccessError, ConfigurationError, InvalidInputError, Result};
pub use filter::{AccessFilterRequest, MembershipRecord, NodeRecord, ParsedAccessFilter};
pub use hierarchy::{HierarchyNode, HierarchyProvider, NodeCatalog, NodeKind, NodePath};
pub use membership::{is_active, is_authorized, AllowedRoles, Membership, MembershipTarget};
pub use permission::{
	Permission, PermissionGrant, UnknownPermission, Wildcard, PERMISSION_CATALOG_VERSION,
};
pub use policy::{classify, roles_for_permission, AccessPolicy, PolicySnapshot, RoleDescription};
pub use role::{Role, RoleClassifier, RoleTier, SUPERVISED_ROLES, SUPERVISORY_ROLES};
pub use scope::{compute_visible_nodes, AccessScope, VisibleNodes};
pub use self_check::{run_startup_check, PolicyReport};
pub use types::{AdministrationId, GroupId, NodeId, UserId};
