// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role memberships held by a principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::enrollment::Enrollment;
use crate::error::InvalidInputError;
use crate::role::Role;
use crate::types::{GroupId, NodeId, UserId};

/// What a membership is attached to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum MembershipTarget {
	/// A district, school or class.
	Node(NodeId),
	/// A flat group outside the org tree.
	Group(GroupId),
}

/// A user's role at a node or group for a period of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
	pub user_id: UserId,
	pub target: MembershipTarget,
	pub role: Role,
	pub enrollment: Enrollment,
}

impl Membership {
	pub fn new(user_id: UserId, target: MembershipTarget, role: Role, enrollment: Enrollment) -> Self {
		Self {
			user_id,
			target,
			role,
			enrollment,
		}
	}

	pub fn at_node(user_id: UserId, node_id: NodeId, role: Role, enrollment: Enrollment) -> Self {
		Self::new(user_id, MembershipTarget::Node(node_id), role, enrollment)
	}

	pub fn in_group(user_id: UserId, group_id: GroupId, role: Role, enrollment: Enrollment) -> Self {
		Self::new(user_id, MembershipTarget::Group(group_id), role, enrollment)
	}
}

/// Non-empty set of roles a query accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoles(BTreeSet<Role>);

impl AllowedRoles {
	pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, InvalidInputError> {
		let roles: BTreeSet<Role> = roles.into_iter().collect();
		if roles.is_empty() {
			return Err(InvalidInputError::EmptyAllowedRoles);
		}
		Ok(Self(roles))
	}

	pub fn contains(&self, role: Role) -> bool {
		self.0.contains(&role)
	}

	pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
		self.0.iter().copied()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Never true: construction rejects an empty set.
	pub fn is_empty(&self) -> bool {
		false
	}
}

/// Returns true if the membership's enrollment window contains `now`.
pub fn is_active(membership: &Membership, now: DateTime<Utc>) -> bool {
	membership.enrollment.is_active(now)
}

/// Returns true if the membership belongs to `user_id`, carries one of the allowed
/// roles and is currently active.
pub fn is_authorized(
	membership: &Membership,
	user_id: &UserId,
	allowed_roles: &AllowedRoles,
	now: DateTime<Utc>,
) -> bool {
	membership.user_id == *user_id
		&& allowed_roles.contains(membership.role)
		&& is_active(membership, now)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
	}

	fn user(s: &str) -> UserId {
		UserId::new(s).unwrap()
	}

	fn teacher_at_school(user_id: &str, enrollment: Enrollment) -> Membership {
		Membership::at_node(
			user(user_id),
			NodeId::new("school_A").unwrap(),
			Role::Teacher,
			enrollment,
		)
	}

	#[test]
	fn empty_allowed_roles_is_invalid_input() {
		assert_eq!(
			AllowedRoles::new(Vec::new()),
			Err(InvalidInputError::EmptyAllowedRoles)
		);
	}

	#[test]
	fn authorized_requires_user_role_and_activity() {
		let allowed = AllowedRoles::new([Role::Teacher, Role::Principal]).unwrap();
		let active = teacher_at_school("u1", Enrollment::open_ended(now() - Duration::days(30)));

		assert!(is_authorized(&active, &user("u1"), &allowed, now()));
		assert!(!is_authorized(&active, &user("u2"), &allowed, now()));

		let students_only = AllowedRoles::new([Role::Student]).unwrap();
		assert!(!is_authorized(&active, &user("u1"), &students_only, now()));

		let expired = teacher_at_school(
			"u1",
			Enrollment::new(now() - Duration::days(30), Some(now() - Duration::days(1))).unwrap(),
		);
		assert!(!is_active(&expired, now()));
		assert!(!is_authorized(&expired, &user("u1"), &allowed, now()));
	}

	#[test]
	fn future_enrollment_is_not_yet_authorized() {
		let allowed = AllowedRoles::new([Role::Teacher]).unwrap();
		let future = teacher_at_school("u1", Enrollment::open_ended(now() + Duration::days(1)));
		assert!(!is_authorized(&future, &user("u1"), &allowed, now()));
	}

	#[test]
	fn target_serializes_tagged() {
		let target = MembershipTarget::Group(GroupId::new("g-7").unwrap());
		assert_eq!(
			serde_json::to_string(&target).unwrap(),
			r#"{"type":"group","id":"g-7"}"#
		);
	}

	#[test]
	fn membership_with_inverted_enrollment_fails_to_deserialize() {
		let json = r#"{
			"user_id": "u1",
			"target": {"type": "node", "id": "school_A"},
			"role": "teacher",
			"enrollment": {"start": "2025-06-15T00:00:00Z", "end": "2024-08-15T00:00:00Z"}
		}"#;
		assert!(serde_json::from_str::<Membership>(json).is_err());
	}
}
