// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Enrollment validity windows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;

/// The period during which a membership is in force.
///
/// Both bounds are inclusive. A missing `end` means the enrollment is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EnrollmentRecord")]
pub struct Enrollment {
	start: DateTime<Utc>,
	end: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct EnrollmentRecord {
	start: DateTime<Utc>,
	#[serde(default)]
	end: Option<DateTime<Utc>>,
}

impl TryFrom<EnrollmentRecord> for Enrollment {
	type Error = InvalidInputError;

	fn try_from(record: EnrollmentRecord) -> Result<Self, Self::Error> {
		Enrollment::new(record.start, record.end)
	}
}

impl Enrollment {
	/// Creates an enrollment window, rejecting one that ends before it starts.
	pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<Self, InvalidInputError> {
		if end.is_some_and(|end| end < start) {
			return Err(InvalidInputError::InvalidEnrollment);
		}
		Ok(Self { start, end })
	}

	/// An enrollment with no end date.
	pub fn open_ended(start: DateTime<Utc>) -> Self {
		Self { start, end: None }
	}

	pub fn start(&self) -> DateTime<Utc> {
		self.start
	}

	pub fn end(&self) -> Option<DateTime<Utc>> {
		self.end
	}

	/// Returns true if `now` falls within the window.
	pub fn is_active(&self, now: DateTime<Utc>) -> bool {
		self.start <= now && self.end.map_or(true, |end| end >= now)
	}
}
