//! In-process stores backed by `tokio::sync::RwLock` maps. Used by the test
//! suite and for running the API without PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MilestoneNoteStore, MilestoneStore, UserStore, version_conflict};
use crate::db::enums::MilestoneStatus;
use crate::db::models::{
    Milestone, MilestoneNote, NewMilestone, NewMilestoneNote, Project, User,
};
use crate::error::{AppError, AppResult};

/// Milestones and projects, plus the note log that status updates append to.
#[derive(Default)]
pub struct MemoryMilestoneStore {
    milestones: RwLock<HashMap<Uuid, Milestone>>,
    projects: RwLock<HashMap<Uuid, Project>>,
    notes: Arc<MemoryMilestoneNoteStore>,
}

impl MemoryMilestoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The note store written by `save_with_note`, for the read side.
    pub fn notes(&self) -> Arc<MemoryMilestoneNoteStore> {
        self.notes.clone()
    }

    pub async fn put_project(&self, project: Project) {
        self.projects.write().await.insert(project.id, project);
    }

    /// Stores the milestone as-is, replacing any existing row and version.
    pub async fn put_milestone(&self, milestone: Milestone) {
        self.milestones.write().await.insert(milestone.id, milestone);
    }

    fn sorted_by_due_date(mut milestones: Vec<Milestone>) -> Vec<Milestone> {
        milestones.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        milestones
    }
}

#[async_trait]
impl MilestoneStore for MemoryMilestoneStore {
    async fn find_by_id(&self, milestone_id: Uuid) -> AppResult<Option<Milestone>> {
        Ok(self.milestones.read().await.get(&milestone_id).cloned())
    }

    async fn find_project(&self, project_id: Uuid) -> AppResult<Option<Project>> {
        Ok(self.projects.read().await.get(&project_id).cloned())
    }

    async fn insert(&self, new_milestone: NewMilestone) -> AppResult<Milestone> {
        let mut milestones = self.milestones.write().await;
        if milestones.contains_key(&new_milestone.id) {
            return Err(AppError::conflict_with_code(
                "Milestone already exists",
                Some("id".to_string()),
                "MILESTONE_EXISTS",
            ));
        }

        let now = Utc::now();
        let milestone = Milestone {
            id: new_milestone.id,
            project_id: new_milestone.project_id,
            student_id: new_milestone.student_id,
            title: new_milestone.title,
            description: new_milestone.description,
            due_date: new_milestone.due_date,
            status: new_milestone.status,
            priority: new_milestone.priority,
            estimated_hours: new_milestone.estimated_hours,
            actual_hours: None,
            completed_at: None,
            blocking_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        milestones.insert(milestone.id, milestone.clone());
        Ok(milestone)
    }

    async fn save(&self, milestone: &Milestone) -> AppResult<Milestone> {
        let mut milestones = self.milestones.write().await;
        let stored = milestones
            .get_mut(&milestone.id)
            .ok_or_else(|| AppError::milestone_not_found(milestone.id))?;

        if stored.version != milestone.version {
            return Err(version_conflict(milestone.id));
        }

        let saved = next_version(milestone);
        *stored = saved.clone();
        Ok(saved)
    }

    async fn save_with_note(
        &self,
        milestone: &Milestone,
        new_note: NewMilestoneNote,
    ) -> AppResult<(Milestone, MilestoneNote)> {
        // Both locks are taken before either side is touched.
        let mut milestones = self.milestones.write().await;
        let mut notes = self.notes.notes.write().await;

        let stored = milestones
            .get_mut(&milestone.id)
            .ok_or_else(|| AppError::milestone_not_found(milestone.id))?;
        if stored.version != milestone.version {
            return Err(version_conflict(milestone.id));
        }
        let note = self.notes.build_note(new_note)?;

        let saved = next_version(milestone);
        *stored = saved.clone();
        notes.push(note.clone());
        Ok((saved, note))
    }

    async fn list_by_project(&self, project_id: Uuid) -> AppResult<Vec<Milestone>> {
        let milestones = self
            .milestones
            .read()
            .await
            .values()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        Ok(Self::sorted_by_due_date(milestones))
    }

    async fn list_blocked_by_supervisor(&self, supervisor_id: Uuid) -> AppResult<Vec<Milestone>> {
        let projects = self.projects.read().await;
        let milestones = self
            .milestones
            .read()
            .await
            .values()
            .filter(|m| m.status == MilestoneStatus::Blocked)
            .filter(|m| {
                projects
                    .get(&m.project_id)
                    .is_some_and(|p| p.supervisor_id == supervisor_id)
            })
            .cloned()
            .collect();
        Ok(Self::sorted_by_due_date(milestones))
    }
}

fn next_version(milestone: &Milestone) -> Milestone {
    let mut saved = milestone.clone();
    saved.version = saved.version.wrapping_add(1);
    saved.updated_at = Utc::now();
    saved
}

#[derive(Default)]
pub struct MemoryMilestoneNoteStore {
    notes: RwLock<Vec<MilestoneNote>>,
    fail_next_write: AtomicBool,
}

impl MemoryMilestoneNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    /// Makes the next note write fail, as a database error would.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn build_note(&self, new_note: NewMilestoneNote) -> AppResult<MilestoneNote> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(AppError::internal("Note write failed"));
        }
        Ok(MilestoneNote {
            id: Uuid::new_v4(),
            milestone_id: new_note.milestone_id,
            author_id: new_note.author_id,
            content: new_note.content,
            note_type: new_note.note_type,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl MilestoneNoteStore for MemoryMilestoneNoteStore {
    async fn list_by_milestone(&self, milestone_id: Uuid) -> AppResult<Vec<MilestoneNote>> {
        // Insertion order breaks ties between identical timestamps.
        let mut notes: Vec<MilestoneNote> = self
            .notes
            .read()
            .await
            .iter()
            .filter(|n| n.milestone_id == milestone_id)
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.created_at);
        Ok(notes)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .get(&user_id)
            .filter(|u| u.is_active)
            .cloned())
    }
}
