use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::enums::{MilestonePriority, MilestoneStatus};

// Milestone models
#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::milestones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Milestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub status: MilestoneStatus,
    pub priority: MilestonePriority,
    pub estimated_hours: f64,
    pub actual_hours: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub blocking_reason: Option<String>,
    /// Optimistic concurrency token, bumped on every successful save.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::milestones)]
pub struct NewMilestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub status: MilestoneStatus,
    pub priority: MilestonePriority,
    pub estimated_hours: f64,
}

/// Full-row changeset written by a versioned save. Nullable columns are
/// written as NULL when `None` so that clearing a field sticks.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::milestones)]
#[diesel(treat_none_as_null = true)]
pub struct MilestoneChangeset<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub due_date: NaiveDate,
    pub status: MilestoneStatus,
    pub priority: MilestonePriority,
    pub estimated_hours: f64,
    pub actual_hours: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub blocking_reason: Option<&'a str>,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

impl<'a> MilestoneChangeset<'a> {
    pub fn next_version_of(milestone: &'a Milestone) -> Self {
        Self {
            title: &milestone.title,
            description: milestone.description.as_deref(),
            due_date: milestone.due_date,
            status: milestone.status,
            priority: milestone.priority,
            estimated_hours: milestone.estimated_hours,
            actual_hours: milestone.actual_hours,
            completed_at: milestone.completed_at,
            blocking_reason: milestone.blocking_reason.as_deref(),
            version: milestone.version.wrapping_add(1),
            updated_at: Utc::now(),
        }
    }
}

/// Body of a status update. Every field is optional; a request with no
/// `status` only records progress (hours and/or notes).
#[derive(Deserialize, Validate, Debug, Clone, Default)]
pub struct MilestoneStatusUpdate {
    pub status: Option<MilestoneStatus>,
    #[validate(length(max = 2000, message = "Blocking reason is too long"))]
    pub blocking_reason: Option<String>,
    #[validate(range(min = 0.0, message = "Actual hours must be non-negative"))]
    pub actual_hours: Option<f64>,
    #[validate(length(max = 10000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
pub struct UnblockMilestoneRequest {
    #[validate(length(max = 10000, message = "Resolution note is too long"))]
    pub resolution_note: Option<String>,
}

#[derive(Deserialize, Validate, Debug, Clone)]
pub struct CreateMilestoneRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub priority: Option<MilestonePriority>,
    #[validate(range(min = 0.0, message = "Estimated hours must be non-negative"))]
    pub estimated_hours: f64,
}

#[derive(Deserialize, Validate, Debug, Clone, Default)]
pub struct UpdateMilestoneRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<MilestonePriority>,
    #[validate(range(min = 0.0, message = "Estimated hours must be non-negative"))]
    pub estimated_hours: Option<f64>,
}

/// Outcome of `update_status`. The notification flag is only a signal for an
/// external notifier; nothing is dispatched here.
#[derive(Serialize, Debug, Clone)]
pub struct StatusTransitionResult {
    pub milestone: Milestone,
    pub supervisor_notified: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransitionCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct AllowedTransitions {
    pub current: MilestoneStatus,
    pub allowed: Vec<MilestoneStatus>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompletionMetrics {
    pub estimated_hours: f64,
    pub actual_hours: f64,
    pub variance: f64,
    pub variance_percentage: f64,
    pub is_under_estimate: bool,
    pub is_over_estimate: bool,
}

impl Milestone {
    /// Estimated-vs-actual effort, defined only once the milestone is completed.
    /// A missing actual figure counts as zero hours.
    pub fn completion_metrics(&self) -> Option<CompletionMetrics> {
        if self.status != MilestoneStatus::Completed {
            return None;
        }

        let actual_hours = self.actual_hours.unwrap_or(0.0);
        let variance = actual_hours - self.estimated_hours;
        let variance_percentage = if self.estimated_hours == 0.0 {
            0.0
        } else {
            variance / self.estimated_hours * 100.0
        };

        Some(CompletionMetrics {
            estimated_hours: self.estimated_hours,
            actual_hours,
            variance,
            variance_percentage,
            is_under_estimate: variance < 0.0,
            is_over_estimate: variance > 0.0,
        })
    }
}
