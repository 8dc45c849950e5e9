// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier newtypes.
//!
//! IDs are opaque strings handed to us by the rostering subsystem. Each kind gets
//! its own type so a [`GroupId`] can never be passed where a [`NodeId`] is expected.
//! Construction validates the string; deserialization goes through the same check.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvalidInputError;

macro_rules! define_id_type {
	($name:ident, $kind:expr, $validate:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);

		impl $name {
			/// Create a new ID, rejecting empty or malformed values.
			pub fn new(id: impl Into<String>) -> Result<Self, InvalidInputError> {
				let id = id.into();
				$validate($kind, &id)?;
				Ok(Self(id))
			}

			/// Get the ID as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}

			/// Get the inner string value.
			pub fn into_inner(self) -> String {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl TryFrom<String> for $name {
			type Error = InvalidInputError;

			fn try_from(id: String) -> Result<Self, Self::Error> {
				Self::new(id)
			}
		}

		impl From<$name> for String {
			fn from(id: $name) -> Self {
				id.0
			}
		}

		impl std::str::FromStr for $name {
			type Err = InvalidInputError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

fn validate_opaque(kind: &'static str, id: &str) -> Result<(), InvalidInputError> {
	if id.is_empty() {
		return Err(InvalidInputError::EmptyId { kind });
	}
	if id.trim() != id {
		return Err(InvalidInputError::InvalidId {
			kind,
			value: id.to_string(),
		});
	}
	Ok(())
}

/// Node IDs double as path segments, so the separator and anything else outside
/// `[A-Za-z0-9_-]` is refused.
fn validate_segment(kind: &'static str, id: &str) -> Result<(), InvalidInputError> {
	if id.is_empty() {
		return Err(InvalidInputError::EmptyId { kind });
	}
	if !id
		.bytes()
		.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
	{
		return Err(InvalidInputError::InvalidId {
			kind,
			value: id.to_string(),
		});
	}
	Ok(())
}

define_id_type!(
	UserId,
	"user id",
	validate_opaque,
	"Unique identifier for an authenticated principal."
);
define_id_type!(
	NodeId,
	"node id",
	validate_segment,
	"Unique identifier for a district, school or class."
);
define_id_type!(
	GroupId,
	"group id",
	validate_opaque,
	"Unique identifier for a flat group outside the org tree."
);
define_id_type!(
	AdministrationId,
	"administration id",
	validate_opaque,
	"Unique identifier for an assessment administration."
);
