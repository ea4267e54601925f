//! Conversion Record - funnel events reached by an assigned subject

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::AssignmentId;
use crate::Error;

/// The catalogue of funnel events a conversion can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    /// Subject opened the onboarding flow.
    StartedOnboarding,
    /// Onboarding step 1 done.
    #[serde(rename = "completed_step_1")]
    CompletedStep1,
    /// Onboarding step 2 done.
    #[serde(rename = "completed_step_2")]
    CompletedStep2,
    /// Onboarding step 3 done.
    #[serde(rename = "completed_step_3")]
    CompletedStep3,
    /// Onboarding step 4 done.
    #[serde(rename = "completed_step_4")]
    CompletedStep4,
    /// Onboarding step 5 done.
    #[serde(rename = "completed_step_5")]
    CompletedStep5,
    /// Whole onboarding flow done.
    CompletedOnboarding,
    /// Followed another user.
    FollowedUser,
    /// Published a first post.
    FirstPost,
    /// Recorded a first daily check-in.
    FirstCheckin,
    /// Came back the day after signing up.
    #[serde(rename = "day_1_return")]
    Day1Return,
    /// Came back a week after signing up.
    #[serde(rename = "day_7_return")]
    Day7Return,
}

impl ConversionKind {
    /// Every kind, in reporting order.
    pub const ALL: [Self; 12] = [
        Self::StartedOnboarding,
        Self::CompletedStep1,
        Self::CompletedStep2,
        Self::CompletedStep3,
        Self::CompletedStep4,
        Self::CompletedStep5,
        Self::CompletedOnboarding,
        Self::FollowedUser,
        Self::FirstPost,
        Self::FirstCheckin,
        Self::Day1Return,
        Self::Day7Return,
    ];

    /// Stable identifier, as stored and reported.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartedOnboarding => "started_onboarding",
            Self::CompletedStep1 => "completed_step_1",
            Self::CompletedStep2 => "completed_step_2",
            Self::CompletedStep3 => "completed_step_3",
            Self::CompletedStep4 => "completed_step_4",
            Self::CompletedStep5 => "completed_step_5",
            Self::CompletedOnboarding => "completed_onboarding",
            Self::FollowedUser => "followed_user",
            Self::FirstPost => "first_post",
            Self::FirstCheckin => "first_checkin",
            Self::Day1Return => "day_1_return",
            Self::Day7Return => "day_7_return",
        }
    }

    /// Human-readable label for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartedOnboarding => "Started Onboarding",
            Self::CompletedStep1 => "Completed Step 1",
            Self::CompletedStep2 => "Completed Step 2",
            Self::CompletedStep3 => "Completed Step 3",
            Self::CompletedStep4 => "Completed Step 4",
            Self::CompletedStep5 => "Completed Step 5",
            Self::CompletedOnboarding => "Completed Onboarding",
            Self::FollowedUser => "Followed a User",
            Self::FirstPost => "Made First Post",
            Self::FirstCheckin => "First Check-in",
            Self::Day1Return => "Returned Day 1",
            Self::Day7Return => "Returned Day 7",
        }
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown conversion kind: {s}")))
    }
}

/// Conversion Record marks that an assignment reached a funnel event.
///
/// At most one exists per `(assignment, kind)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionRecord {
    assignment_id: AssignmentId,
    kind: ConversionKind,
    #[serde(default = "empty_metadata")]
    metadata: serde_json::Value,
    converted_at: DateTime<Utc>,
}

fn empty_metadata() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl ConversionRecord {
    /// Create a conversion record.
    ///
    /// A `None` metadata becomes an empty JSON object.
    #[must_use]
    pub fn new(
        assignment_id: AssignmentId,
        kind: ConversionKind,
        metadata: Option<serde_json::Value>,
        converted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            assignment_id,
            kind,
            metadata: metadata.unwrap_or_else(empty_metadata),
            converted_at,
        }
    }

    /// Get the owning assignment id.
    #[must_use]
    pub const fn assignment_id(&self) -> &AssignmentId {
        &self.assignment_id
    }

    /// Get the event kind.
    #[must_use]
    pub const fn kind(&self) -> ConversionKind {
        self.kind
    }

    /// Get the metadata payload.
    #[must_use]
    pub const fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    /// Get the conversion timestamp.
    #[must_use]
    pub const fn converted_at(&self) -> DateTime<Utc> {
        self.converted_at
    }
}
