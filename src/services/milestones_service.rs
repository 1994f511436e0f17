//! Milestone status engine.
//!
//! Validates and applies status transitions, enforces the per-state field
//! rules, appends a history note for every status update and derives the
//! completion metrics. All persistence goes through the injected stores.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::enums::{MilestonePriority, MilestoneStatus};
use crate::db::models::{
    AllowedTransitions, CompletionMetrics, CreateMilestoneRequest, Milestone,
    MilestoneStatusUpdate, NOTE_TYPE_PROGRESS, NewMilestone, NewMilestoneNote, Project,
    StatusHistoryEntry, StatusTransitionResult, TransitionCheck, UpdateMilestoneRequest, User,
};
use crate::error::{AppError, AppResult};
use crate::stores::{MilestoneNoteStore, MilestoneStore, UserStore};
use crate::validation::milestone as rules;

/// True when `user` may act on `milestone`: the owning student or the
/// supervisor of the owning project.
pub fn can_act_on_milestone(milestone: &Milestone, project: Option<&Project>, user: &User) -> bool {
    milestone.student_id == user.id || project.is_some_and(|p| p.supervisor_id == user.id)
}

fn can_act_on_project(project: &Project, user: &User) -> bool {
    project.supervisor_id == user.id || project.student_id == Some(user.id)
}

#[derive(Clone)]
pub struct MilestoneStatusEngine {
    milestones: Arc<dyn MilestoneStore>,
    notes: Arc<dyn MilestoneNoteStore>,
    users: Arc<dyn UserStore>,
}

impl MilestoneStatusEngine {
    pub fn new(
        milestones: Arc<dyn MilestoneStore>,
        notes: Arc<dyn MilestoneNoteStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            milestones,
            notes,
            users,
        }
    }

    /// Pure check against the transition table.
    pub fn validate_status_transition(from: MilestoneStatus, to: MilestoneStatus) -> TransitionCheck {
        rules::validate_status_transition(from, to)
    }

    pub async fn update_status(
        &self,
        milestone_id: Uuid,
        update: MilestoneStatusUpdate,
        acting_user_id: Uuid,
    ) -> AppResult<StatusTransitionResult> {
        let (milestone, user) = self.load_authorized(milestone_id, acting_user_id).await?;
        self.apply_status_update(milestone, &user, update).await
    }

    pub async fn unblock_milestone(
        &self,
        milestone_id: Uuid,
        acting_user_id: Uuid,
        resolution_note: Option<String>,
    ) -> AppResult<StatusTransitionResult> {
        let (milestone, user) = self.load_authorized(milestone_id, acting_user_id).await?;

        if milestone.status != MilestoneStatus::Blocked {
            return Err(AppError::milestone_validation(format!(
                "Only blocked milestones can be unblocked (current status: {})",
                milestone.status
            )));
        }

        let update = MilestoneStatusUpdate {
            status: Some(MilestoneStatus::InProgress),
            notes: resolution_note.filter(|n| !n.trim().is_empty()),
            ..Default::default()
        };
        self.apply_status_update(milestone, &user, update).await
    }

    pub async fn get_status_history(
        &self,
        milestone_id: Uuid,
        acting_user_id: Uuid,
    ) -> AppResult<Vec<StatusHistoryEntry>> {
        self.load_authorized(milestone_id, acting_user_id).await?;

        let notes = self.notes.list_by_milestone(milestone_id).await?;
        Ok(notes.into_iter().map(StatusHistoryEntry::from).collect())
    }

    pub async fn get_completion_metrics(
        &self,
        milestone_id: Uuid,
        acting_user_id: Uuid,
    ) -> AppResult<Option<CompletionMetrics>> {
        let (milestone, _) = self.load_authorized(milestone_id, acting_user_id).await?;
        Ok(milestone.completion_metrics())
    }

    /// Blocked milestones in projects supervised by `supervisor_id`. The filter
    /// itself is the only scoping applied.
    pub async fn get_blocked_milestones(&self, supervisor_id: Uuid) -> AppResult<Vec<Milestone>> {
        self.milestones.list_blocked_by_supervisor(supervisor_id).await
    }

    pub async fn get_milestone(&self, milestone_id: Uuid, acting_user_id: Uuid) -> AppResult<Milestone> {
        let (milestone, _) = self.load_authorized(milestone_id, acting_user_id).await?;
        Ok(milestone)
    }

    pub async fn allowed_transitions(
        &self,
        milestone_id: Uuid,
        acting_user_id: Uuid,
    ) -> AppResult<AllowedTransitions> {
        let (milestone, _) = self.load_authorized(milestone_id, acting_user_id).await?;
        Ok(AllowedTransitions {
            current: milestone.status,
            allowed: rules::allowed_transitions(milestone.status).to_vec(),
        })
    }

    pub async fn list_project_milestones(
        &self,
        project_id: Uuid,
        acting_user_id: Uuid,
    ) -> AppResult<Vec<Milestone>> {
        let (project, _) = self.load_project_authorized(project_id, acting_user_id).await?;
        self.milestones.list_by_project(project.id).await
    }

    pub async fn create_milestone(
        &self,
        project_id: Uuid,
        request: CreateMilestoneRequest,
        acting_user_id: Uuid,
    ) -> AppResult<Milestone> {
        let (project, user) = self.load_project_authorized(project_id, acting_user_id).await?;

        rules::validate_title(&request.title)?;
        rules::validate_hours("Estimated hours", request.estimated_hours)?;
        let student_id = project.student_id.ok_or_else(|| {
            AppError::milestone_validation("Project has no assigned student yet")
        })?;

        let milestone = self
            .milestones
            .insert(NewMilestone {
                id: Uuid::new_v4(),
                project_id: project.id,
                student_id,
                title: request.title.trim().to_string(),
                description: request.description,
                due_date: request.due_date,
                status: MilestoneStatus::NotStarted,
                priority: request.priority.unwrap_or(MilestonePriority::Medium),
                estimated_hours: request.estimated_hours,
            })
            .await?;

        tracing::info!(
            milestone_id = %milestone.id,
            project_id = %project.id,
            user_id = %user.id,
            "Milestone created"
        );
        Ok(milestone)
    }

    /// Edits descriptive fields. Status only moves through `update_status`.
    pub async fn update_milestone(
        &self,
        milestone_id: Uuid,
        request: UpdateMilestoneRequest,
        acting_user_id: Uuid,
    ) -> AppResult<Milestone> {
        let (mut milestone, _) = self.load_authorized(milestone_id, acting_user_id).await?;

        if rules::is_terminal(milestone.status) {
            return Err(AppError::milestone_validation(format!(
                "A {} milestone cannot be edited",
                milestone.status
            )));
        }

        if let Some(title) = request.title {
            rules::validate_title(&title)?;
            milestone.title = title.trim().to_string();
        }
        if let Some(description) = request.description {
            milestone.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(due_date) = request.due_date {
            milestone.due_date = due_date;
        }
        if let Some(priority) = request.priority {
            milestone.priority = priority;
        }
        if let Some(hours) = request.estimated_hours {
            rules::validate_hours("Estimated hours", hours)?;
            milestone.estimated_hours = hours;
        }

        self.milestones.save(&milestone).await
    }

    async fn load_authorized(&self, milestone_id: Uuid, acting_user_id: Uuid) -> AppResult<(Milestone, User)> {
        let milestone = self
            .milestones
            .find_by_id(milestone_id)
            .await?
            .ok_or_else(|| AppError::milestone_not_found(milestone_id))?;

        let user = self.find_acting_user(acting_user_id).await?;
        let project = self.milestones.find_project(milestone.project_id).await?;

        if !can_act_on_milestone(&milestone, project.as_ref(), &user) {
            tracing::warn!(
                milestone_id = %milestone_id,
                user_id = %acting_user_id,
                "Milestone access denied"
            );
            return Err(AppError::milestone_permission(
                "Only the owning student or the project supervisor can access this milestone",
            ));
        }

        Ok((milestone, user))
    }

    async fn load_project_authorized(&self, project_id: Uuid, acting_user_id: Uuid) -> AppResult<(Project, User)> {
        let project = self
            .milestones
            .find_project(project_id)
            .await?
            .ok_or_else(|| AppError::not_found("project"))?;

        let user = self.find_acting_user(acting_user_id).await?;
        if !can_act_on_project(&project, &user) {
            return Err(AppError::milestone_permission(
                "Only the project's student or supervisor can manage its milestones",
            ));
        }

        Ok((project, user))
    }

    async fn find_acting_user(&self, acting_user_id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(acting_user_id)
            .await?
            .ok_or_else(|| AppError::milestone_permission("Acting user not found or inactive"))
    }

    async fn apply_status_update(
        &self,
        mut milestone: Milestone,
        user: &User,
        update: MilestoneStatusUpdate,
    ) -> AppResult<StatusTransitionResult> {
        let from = milestone.status;
        let to = update.status.unwrap_or(from);

        // Terminal milestones reject every update, including no-op ones.
        if rules::is_terminal(from) || to != from {
            rules::ensure_transition_allowed(from, to)?;
        }

        if let Some(notes) = update.notes.as_deref() {
            rules::validate_note(notes)?;
        }

        if to == MilestoneStatus::Blocked {
            if from != MilestoneStatus::Blocked || update.blocking_reason.is_some() {
                let reason = rules::validate_blocking_reason(update.blocking_reason.as_deref())?;
                milestone.blocking_reason = Some(reason);
            }
        } else if from == MilestoneStatus::Blocked {
            milestone.blocking_reason = None;
        }

        if to == MilestoneStatus::Completed && from != MilestoneStatus::Completed {
            milestone.completed_at = Some(Utc::now());
        } else if from == MilestoneStatus::Completed && to != MilestoneStatus::Completed {
            milestone.completed_at = None;
        }

        if let Some(hours) = update.actual_hours {
            rules::validate_hours("Actual hours", hours)?;
            milestone.actual_hours = Some(hours);
        }

        milestone.status = to;
        let content = update
            .notes
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| describe_update(from, to));

        // The row and its history note are stored together or not at all.
        let (saved, _note) = self
            .milestones
            .save_with_note(
                &milestone,
                NewMilestoneNote {
                    milestone_id: milestone.id,
                    author_id: user.id,
                    content,
                    note_type: NOTE_TYPE_PROGRESS.to_string(),
                },
            )
            .await?;

        let supervisor_notified = saved.status == MilestoneStatus::Blocked;
        tracing::info!(
            milestone_id = %saved.id,
            user_id = %user.id,
            from = %from,
            to = %to,
            supervisor_notified,
            "Milestone status updated"
        );

        Ok(StatusTransitionResult {
            milestone: saved,
            supervisor_notified,
        })
    }
}

fn describe_update(from: MilestoneStatus, to: MilestoneStatus) -> String {
    if from == to {
        "Progress updated".to_string()
    } else {
        format!("Status changed from {} to {}", from, to)
    }
}
