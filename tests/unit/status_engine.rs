// Engine scenarios against the in-memory stores

use chrono::NaiveDate;
use projecthub_backend::db::enums::{MilestonePriority, MilestoneStatus};
use projecthub_backend::db::models::{
    CreateMilestoneRequest, MilestoneStatusUpdate, UpdateMilestoneRequest,
};
use projecthub_backend::error::AppError;
use projecthub_backend::services::MilestoneStatusEngine;
use projecthub_backend::stores::{MilestoneStore, UserStore};
use uuid::Uuid;

use crate::common::{Fixture, user};

fn to(status: MilestoneStatus) -> MilestoneStatusUpdate {
    MilestoneStatusUpdate {
        status: Some(status),
        ..Default::default()
    }
}

#[tokio::test]
async fn starting_work_moves_to_in_progress_and_records_a_note() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::NotStarted).await;

    let result = fx
        .engine
        .update_status(milestone.id, to(MilestoneStatus::InProgress), fx.student.id)
        .await
        .unwrap();

    assert_eq!(result.milestone.status, MilestoneStatus::InProgress);
    assert!(!result.supervisor_notified);
    assert_eq!(result.milestone.version, 1);

    let history = fx
        .engine
        .get_status_history(milestone.id, fx.student.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_id, fx.student.id);
    assert_eq!(
        history[0].reason,
        "Status changed from not_started to in_progress"
    );
}

#[tokio::test]
async fn every_successful_update_appends_exactly_one_note() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::NotStarted).await;

    let updates = [
        to(MilestoneStatus::InProgress),
        MilestoneStatusUpdate {
            actual_hours: Some(3.5),
            notes: Some("Set up the benchmark harness".to_string()),
            ..Default::default()
        },
        MilestoneStatusUpdate {
            status: Some(MilestoneStatus::Blocked),
            blocking_reason: Some("GPU quota exhausted".to_string()),
            ..Default::default()
        },
        to(MilestoneStatus::InProgress),
        to(MilestoneStatus::Completed),
    ];

    for (i, update) in updates.into_iter().enumerate() {
        fx.engine
            .update_status(milestone.id, update, fx.student.id)
            .await
            .unwrap();
        assert_eq!(fx.notes.len().await, i + 1);
    }

    let history = fx
        .engine
        .get_status_history(milestone.id, fx.supervisor.id)
        .await
        .unwrap();
    let reasons: Vec<&str> = history.iter().map(|h| h.reason.as_str()).collect();
    assert_eq!(
        reasons,
        vec![
            "Status changed from not_started to in_progress",
            "Set up the benchmark harness",
            "Status changed from in_progress to blocked",
            "Status changed from blocked to in_progress",
            "Status changed from in_progress to completed",
        ]
    );
}

#[tokio::test]
async fn progress_only_update_keeps_status() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    let result = fx
        .engine
        .update_status(
            milestone.id,
            MilestoneStatusUpdate {
                actual_hours: Some(12.0),
                ..Default::default()
            },
            fx.student.id,
        )
        .await
        .unwrap();

    assert_eq!(result.milestone.status, MilestoneStatus::InProgress);
    assert_eq!(result.milestone.actual_hours, Some(12.0));

    let history = fx
        .engine
        .get_status_history(milestone.id, fx.student.id)
        .await
        .unwrap();
    assert_eq!(history[0].reason, "Progress updated");
}

#[tokio::test]
async fn blocking_without_reason_fails_and_changes_nothing() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    for reason in [None, Some("   ".to_string())] {
        let update = MilestoneStatusUpdate {
            status: Some(MilestoneStatus::Blocked),
            blocking_reason: reason,
            ..Default::default()
        };
        let err = fx
            .engine
            .update_status(milestone.id, update, fx.student.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MilestoneValidation { .. }));
    }

    let stored = fx.milestones.find_by_id(milestone.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MilestoneStatus::InProgress);
    assert_eq!(stored.version, 0);
    assert_eq!(fx.notes.len().await, 0);
}

#[tokio::test]
async fn blocking_sets_reason_and_flags_the_supervisor() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    let result = fx
        .engine
        .update_status(
            milestone.id,
            MilestoneStatusUpdate {
                status: Some(MilestoneStatus::Blocked),
                blocking_reason: Some("  Ethics approval pending ".to_string()),
                ..Default::default()
            },
            fx.student.id,
        )
        .await
        .unwrap();

    assert!(result.supervisor_notified);
    assert_eq!(result.milestone.status, MilestoneStatus::Blocked);
    assert_eq!(
        result.milestone.blocking_reason.as_deref(),
        Some("Ethics approval pending")
    );
}

#[tokio::test]
async fn updating_a_blocked_milestone_still_flags_the_supervisor() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::Blocked).await;

    let result = fx
        .engine
        .update_status(
            milestone.id,
            MilestoneStatusUpdate {
                blocking_reason: Some("Lab closed until Monday".to_string()),
                ..Default::default()
            },
            fx.student.id,
        )
        .await
        .unwrap();

    assert!(result.supervisor_notified);
    assert_eq!(
        result.milestone.blocking_reason.as_deref(),
        Some("Lab closed until Monday")
    );
}

#[tokio::test]
async fn completing_stamps_and_reopening_clears_completed_at() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    let completed = fx
        .engine
        .update_status(milestone.id, to(MilestoneStatus::Completed), fx.student.id)
        .await
        .unwrap()
        .milestone;
    assert!(completed.completed_at.is_some());

    let reopened = fx
        .engine
        .update_status(milestone.id, to(MilestoneStatus::InProgress), fx.supervisor.id)
        .await
        .unwrap()
        .milestone;
    assert_eq!(reopened.status, MilestoneStatus::InProgress);
    assert!(reopened.completed_at.is_none());
}

#[tokio::test]
async fn leaving_blocked_clears_the_reason() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::Blocked).await;

    let result = fx
        .engine
        .update_status(milestone.id, to(MilestoneStatus::Cancelled), fx.supervisor.id)
        .await
        .unwrap();

    assert_eq!(result.milestone.status, MilestoneStatus::Cancelled);
    assert!(result.milestone.blocking_reason.is_none());
    assert!(!result.supervisor_notified);
}

#[tokio::test]
async fn cancelled_milestones_reject_every_update() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::Cancelled).await;

    let updates = [
        to(MilestoneStatus::InProgress),
        to(MilestoneStatus::Cancelled),
        MilestoneStatusUpdate {
            notes: Some("Just a note".to_string()),
            ..Default::default()
        },
    ];

    for update in updates {
        let err = fx
            .engine
            .update_status(milestone.id, update, fx.student.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidMilestoneStatus {
                from: MilestoneStatus::Cancelled,
                ..
            }
        ));
    }
    assert_eq!(fx.notes.len().await, 0);
}

#[tokio::test]
async fn transitions_outside_the_table_are_rejected() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::NotStarted).await;

    let err = fx
        .engine
        .update_status(milestone.id, to(MilestoneStatus::Completed), fx.student.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot transition from not_started to completed");
}

#[tokio::test]
async fn negative_or_non_finite_hours_are_rejected() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    for hours in [-1.0, f64::NAN, f64::INFINITY] {
        let err = fx
            .engine
            .update_status(
                milestone.id,
                MilestoneStatusUpdate {
                    actual_hours: Some(hours),
                    ..Default::default()
                },
                fx.student.id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MilestoneValidation { .. }));
    }
}

#[tokio::test]
async fn overlong_notes_are_rejected() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    let err = fx
        .engine
        .update_status(
            milestone.id,
            MilestoneStatusUpdate {
                notes: Some("x".repeat(10_001)),
                ..Default::default()
            },
            fx.student.id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestoneValidation { .. }));
}

#[tokio::test]
async fn only_owner_and_supervisor_may_act() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::NotStarted).await;

    let err = fx
        .engine
        .update_status(milestone.id, to(MilestoneStatus::InProgress), fx.outsider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestonePermission { .. }));

    let err = fx
        .engine
        .get_status_history(milestone.id, fx.outsider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestonePermission { .. }));

    // Unknown acting users are refused the same way.
    let err = fx
        .engine
        .get_milestone(milestone.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestonePermission { .. }));
}

#[tokio::test]
async fn inactive_users_cannot_act() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::NotStarted).await;

    let mut student = fx.student.clone();
    student.is_active = false;
    fx.users.put_user(student.clone()).await;
    assert!(fx.users.find_by_id(student.id).await.unwrap().is_none());

    let err = fx
        .engine
        .update_status(milestone.id, to(MilestoneStatus::InProgress), student.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestonePermission { .. }));
}

#[tokio::test]
async fn missing_milestone_is_not_found() {
    let fx = Fixture::new().await;
    let missing = Uuid::new_v4();

    let err = fx
        .engine
        .update_status(missing, to(MilestoneStatus::InProgress), fx.student.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestoneNotFound { milestone_id } if milestone_id == missing));
}

#[tokio::test]
async fn unblock_returns_to_in_progress_with_resolution_note() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::Blocked).await;

    let result = fx
        .engine
        .unblock_milestone(
            milestone.id,
            fx.supervisor.id,
            Some("Access granted by IT".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(result.milestone.status, MilestoneStatus::InProgress);
    assert!(result.milestone.blocking_reason.is_none());
    assert!(!result.supervisor_notified);

    let history = fx
        .engine
        .get_status_history(milestone.id, fx.supervisor.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_id, fx.supervisor.id);
    assert_eq!(history[0].reason, "Access granted by IT");
}

#[tokio::test]
async fn unblock_with_blank_note_synthesizes_one() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::Blocked).await;

    fx.engine
        .unblock_milestone(milestone.id, fx.student.id, Some("  ".to_string()))
        .await
        .unwrap();

    let history = fx
        .engine
        .get_status_history(milestone.id, fx.student.id)
        .await
        .unwrap();
    assert_eq!(history[0].reason, "Status changed from blocked to in_progress");
}

#[tokio::test]
async fn unblock_requires_a_blocked_milestone() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    let err = fx
        .engine
        .unblock_milestone(milestone.id, fx.student.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestoneValidation { .. }));
}

#[tokio::test]
async fn completion_metrics_follow_estimate_and_actual() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    assert!(
        fx.engine
            .get_completion_metrics(milestone.id, fx.student.id)
            .await
            .unwrap()
            .is_none()
    );

    fx.engine
        .update_status(
            milestone.id,
            MilestoneStatusUpdate {
                status: Some(MilestoneStatus::Completed),
                actual_hours: Some(35.0),
                ..Default::default()
            },
            fx.student.id,
        )
        .await
        .unwrap();

    let metrics = fx
        .engine
        .get_completion_metrics(milestone.id, fx.student.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(metrics.estimated_hours, 40.0);
    assert_eq!(metrics.actual_hours, 35.0);
    assert_eq!(metrics.variance, -5.0);
    assert_eq!(metrics.variance_percentage, -12.5);
    assert!(metrics.is_under_estimate);
    assert!(!metrics.is_over_estimate);
}

#[tokio::test]
async fn blocked_list_is_scoped_to_the_supervisor() {
    let fx = Fixture::new().await;
    let later = fx
        .milestone_due(MilestoneStatus::Blocked, NaiveDate::from_ymd_opt(2027, 5, 1).unwrap())
        .await;
    let sooner = fx
        .milestone_due(MilestoneStatus::Blocked, NaiveDate::from_ymd_opt(2027, 2, 1).unwrap())
        .await;
    fx.milestone(MilestoneStatus::InProgress).await;

    let blocked = fx
        .engine
        .get_blocked_milestones(fx.supervisor.id)
        .await
        .unwrap();
    let ids: Vec<Uuid> = blocked.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);
    assert!(blocked.iter().all(|m| m.status == MilestoneStatus::Blocked));

    assert!(
        fx.engine
            .get_blocked_milestones(fx.outsider.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn stale_writes_surface_as_version_conflicts() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    let mut concurrent = milestone.clone();
    concurrent.title = "Renamed elsewhere".to_string();
    fx.milestones.save(&concurrent).await.unwrap();

    let mut stale = milestone.clone();
    stale.status = MilestoneStatus::Completed;
    let err = fx.milestones.save(&stale).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict { ref code, .. } if code.as_deref() == Some("MILESTONE_VERSION_CONFLICT")));
}

#[tokio::test]
async fn allowed_transitions_mirror_the_table() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::Blocked).await;

    let transitions = fx
        .engine
        .allowed_transitions(milestone.id, fx.student.id)
        .await
        .unwrap();
    assert_eq!(transitions.current, MilestoneStatus::Blocked);
    assert_eq!(
        transitions.allowed,
        vec![MilestoneStatus::InProgress, MilestoneStatus::Cancelled]
    );

    let check = MilestoneStatusEngine::validate_status_transition(
        MilestoneStatus::Completed,
        MilestoneStatus::Completed,
    );
    assert!(!check.is_valid);
    assert_eq!(
        check.reason.as_deref(),
        Some("Cannot transition from completed to completed")
    );
}

#[tokio::test]
async fn create_milestone_defaults_and_ownership() {
    let fx = Fixture::new().await;

    let created = fx
        .engine
        .create_milestone(
            fx.project.id,
            CreateMilestoneRequest {
                title: "  Literature review  ".to_string(),
                description: Some("Survey of prior work".to_string()),
                due_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
                priority: None,
                estimated_hours: 25.0,
            },
            fx.supervisor.id,
        )
        .await
        .unwrap();

    assert_eq!(created.title, "Literature review");
    assert_eq!(created.status, MilestoneStatus::NotStarted);
    assert_eq!(created.priority, MilestonePriority::Medium);
    assert_eq!(created.student_id, fx.student.id);
    assert_eq!(created.version, 0);

    let listed = fx
        .engine
        .list_project_milestones(fx.project.id, fx.student.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn create_milestone_checks_project_and_membership() {
    let fx = Fixture::new().await;
    let request = CreateMilestoneRequest {
        title: "Data collection".to_string(),
        description: None,
        due_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
        priority: Some(MilestonePriority::High),
        estimated_hours: 10.0,
    };

    let err = fx
        .engine
        .create_milestone(Uuid::new_v4(), request.clone(), fx.student.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    let err = fx
        .engine
        .create_milestone(fx.project.id, request.clone(), fx.outsider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestonePermission { .. }));

    let err = fx
        .engine
        .create_milestone(
            fx.project.id,
            CreateMilestoneRequest {
                estimated_hours: -2.0,
                ..request
            },
            fx.student.id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestoneValidation { .. }));
}

#[tokio::test]
async fn update_milestone_edits_fields_but_not_cancelled_ones() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::InProgress).await;

    let updated = fx
        .engine
        .update_milestone(
            milestone.id,
            UpdateMilestoneRequest {
                title: Some("Prototype evaluation v2".to_string()),
                priority: Some(MilestonePriority::Critical),
                ..Default::default()
            },
            fx.student.id,
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Prototype evaluation v2");
    assert_eq!(updated.priority, MilestonePriority::Critical);
    assert_eq!(updated.status, MilestoneStatus::InProgress);
    assert_eq!(updated.version, 1);

    let cancelled = fx.milestone(MilestoneStatus::Cancelled).await;
    let err = fx
        .engine
        .update_milestone(
            cancelled.id,
            UpdateMilestoneRequest {
                title: Some("Revived".to_string()),
                ..Default::default()
            },
            fx.supervisor.id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestoneValidation { .. }));
}

#[tokio::test]
async fn admins_are_not_implicitly_authorized() {
    let fx = Fixture::new().await;
    let admin = user(projecthub_backend::db::enums::UserRole::Admin, "admin");
    fx.users.put_user(admin.clone()).await;
    let milestone = fx.milestone(MilestoneStatus::NotStarted).await;

    let err = fx
        .engine
        .get_milestone(milestone.id, admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MilestonePermission { .. }));
}

#[tokio::test]
async fn failed_note_append_rolls_back_the_transition() {
    let fx = Fixture::new().await;
    let milestone = fx.milestone(MilestoneStatus::NotStarted).await;

    fx.notes.fail_next_write();
    let result = fx
        .engine
        .update_status(milestone.id, to(MilestoneStatus::InProgress), fx.student.id)
        .await;
    assert!(result.is_err());

    let stored = fx.milestones.find_by_id(milestone.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MilestoneStatus::NotStarted);
    assert_eq!(stored.version, 0);
    assert_eq!(fx.notes.len().await, 0);

    // A retry after the failure goes through with exactly one note.
    let result = fx
        .engine
        .update_status(milestone.id, to(MilestoneStatus::InProgress), fx.student.id)
        .await
        .unwrap();
    assert_eq!(result.milestone.version, 1);
    assert_eq!(fx.notes.len().await, 1);
}
