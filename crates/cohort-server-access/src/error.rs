// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy for the access engine.
//!
//! Two kinds of failure exist and they must never be conflated:
//!
//! - [`ConfigurationError`]: the deployed policy is broken (unmatched permission,
//!   incomplete role classification). Surfaces as a 5xx.
//! - [`InvalidInputError`]: the caller handed us something malformed. Surfaces as a 4xx.
//!
//! A principal who can see nothing is neither; it is an empty, successful result.

use http::StatusCode;
use thiserror::Error;

use crate::permission::Wildcard;
use crate::role::Role;

/// Defects in the static access policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	#[error("no role is granted permission '{permission}'")]
	UnmatchedPermission { permission: String },

	#[error("role '{role}' is not classified as supervisory or supervised")]
	UnclassifiedRole { role: Role },

	#[error(
		"role classification is inconsistent: unclassified={unclassified:?}, overlapping={overlapping:?}"
	)]
	RoleClassification {
		unclassified: Vec<Role>,
		overlapping: Vec<Role>,
	},

	#[error("role '{role}' has no permission grants configured")]
	MissingGrants { role: Role },

	#[error("wildcard '{wildcard}' does not cover any catalog permission")]
	DeadWildcard { wildcard: Wildcard },
}

/// Caller contract violations, rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
	#[error("{kind} must not be empty")]
	EmptyId { kind: &'static str },

	#[error("invalid {kind}: '{value}'")]
	InvalidId { kind: &'static str, value: String },

	#[error("allowed role list must not be empty")]
	EmptyAllowedRoles,

	#[error("malformed hierarchy path '{path}': {reason}")]
	MalformedPath { path: String, reason: &'static str },

	#[error("unknown role '{0}'")]
	UnknownRole(String),

	#[error("enrollment ends before it starts")]
	InvalidEnrollment,

	#[error("membership must target exactly one node or group")]
	AmbiguousTarget,

	#[error("path '{path}' does not end with node '{node_id}'")]
	PathMismatch { node_id: String, path: String },

	#[error("node '{node_id}' already recorded with a different path")]
	ConflictingNode { node_id: String },
}

/// Any failure the engine can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
	#[error("access policy configuration defect: {0}")]
	Configuration(#[from] ConfigurationError),

	#[error("invalid access request: {0}")]
	InvalidInput(#[from] InvalidInputError),
}

impl AccessError {
	/// Returns true if this error means the deployment is broken rather than the request.
	pub fn is_configuration_defect(&self) -> bool {
		matches!(self, Self::Configuration(_))
	}

	/// HTTP status the host service should answer with.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
		}
	}
}

pub type Result<T, E = AccessError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn configuration_defects_map_to_server_error() {
		let err = AccessError::from(ConfigurationError::UnmatchedPermission {
			permission: "unknown.permission".to_string(),
		});
		assert!(err.is_configuration_defect());
		assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
		assert!(err.to_string().contains("unknown.permission"));
	}

	#[test]
	fn invalid_input_maps_to_bad_request() {
		let err = AccessError::from(InvalidInputError::EmptyAllowedRoles);
		assert!(!err.is_configuration_defect());
		assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
	}

	#[test]
	fn classification_error_names_offending_roles() {
		let err = ConfigurationError::RoleClassification {
			unclassified: vec![Role::Proctor],
			overlapping: vec![Role::Teacher],
		};
		let msg = err.to_string();
		assert!(msg.contains("Proctor"));
		assert!(msg.contains("Teacher"));
	}
}
