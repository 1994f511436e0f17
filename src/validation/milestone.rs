//! Milestone status transition rules and field validation.
//!
//! The transition table is plain data so it can be audited and tested on its
//! own, and mirrored by clients for pre-validation.

use crate::db::enums::MilestoneStatus;
use crate::db::models::milestone::TransitionCheck;
use crate::error::AppError;

use MilestoneStatus::*;

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_NOTE_LENGTH: usize = 10_000;
pub const MAX_BLOCKING_REASON_LENGTH: usize = 2_000;

/// Allowed moves, keyed by the current status.
pub const TRANSITIONS: &[(MilestoneStatus, &[MilestoneStatus])] = &[
    (NotStarted, &[InProgress, Cancelled]),
    (InProgress, &[Completed, Blocked, Cancelled, NotStarted]),
    (Blocked, &[InProgress, Cancelled]),
    (Completed, &[InProgress]),
    (Cancelled, &[]),
];

/// Returns the set of statuses that `from` may move to.
pub fn allowed_transitions(from: MilestoneStatus) -> &'static [MilestoneStatus] {
    TRANSITIONS
        .iter()
        .find(|(state, _)| *state == from)
        .map(|(_, next)| *next)
        .unwrap_or(&[])
}

pub fn is_terminal(status: MilestoneStatus) -> bool {
    allowed_transitions(status).is_empty()
}

/// Pure table lookup, no I/O.
pub fn validate_status_transition(from: MilestoneStatus, to: MilestoneStatus) -> TransitionCheck {
    if allowed_transitions(from).contains(&to) {
        TransitionCheck {
            is_valid: true,
            reason: None,
        }
    } else {
        TransitionCheck {
            is_valid: false,
            reason: Some(format!("Cannot transition from {} to {}", from, to)),
        }
    }
}

pub fn ensure_transition_allowed(from: MilestoneStatus, to: MilestoneStatus) -> Result<(), AppError> {
    if validate_status_transition(from, to).is_valid {
        Ok(())
    } else {
        Err(AppError::InvalidMilestoneStatus { from, to })
    }
}

/// Returns the trimmed reason, which must be present and non-empty.
pub fn validate_blocking_reason(reason: Option<&str>) -> Result<String, AppError> {
    let reason = reason.map(str::trim).unwrap_or_default();
    if reason.is_empty() {
        return Err(AppError::milestone_validation(
            "A blocking reason is required when blocking a milestone",
        ));
    }
    if reason.chars().count() > MAX_BLOCKING_REASON_LENGTH {
        return Err(AppError::milestone_validation(format!(
            "Blocking reason is too long (max {} characters)",
            MAX_BLOCKING_REASON_LENGTH
        )));
    }
    Ok(reason.to_string())
}

pub fn validate_hours(field: &str, hours: f64) -> Result<(), AppError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(AppError::milestone_validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}

pub fn validate_note(content: &str) -> Result<(), AppError> {
    if content.chars().count() > MAX_NOTE_LENGTH {
        return Err(AppError::milestone_validation(format!(
            "Note is too long (max {} characters)",
            MAX_NOTE_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::milestone_validation("Milestone title is required"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::milestone_validation(format!(
            "Milestone title is too long (max {} characters)",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}
