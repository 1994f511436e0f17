//! Storage seams of the milestone subsystem.
//!
//! The status engine only talks to these traits; PostgreSQL, in-memory and
//! cached implementations live in the submodules.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{
    Milestone, MilestoneNote, NewMilestone, NewMilestoneNote, Project, User,
};
use crate::error::AppResult;

pub use memory::{MemoryMilestoneNoteStore, MemoryMilestoneStore, MemoryUserStore};
pub use pg::{PgMilestoneNoteStore, PgMilestoneStore, PgUserStore};

#[async_trait]
pub trait MilestoneStore: Send + Sync {
    async fn find_by_id(&self, milestone_id: Uuid) -> AppResult<Option<Milestone>>;

    async fn find_project(&self, project_id: Uuid) -> AppResult<Option<Project>>;

    async fn insert(&self, new_milestone: NewMilestone) -> AppResult<Milestone>;

    /// Persists `milestone` only if the stored row still carries
    /// `milestone.version`, returning the row with the bumped version.
    /// A stale version fails with a `MILESTONE_VERSION_CONFLICT` conflict.
    async fn save(&self, milestone: &Milestone) -> AppResult<Milestone>;

    /// `save` plus a history note as one unit: either both are stored or
    /// neither is. Implementations hold a transaction (or both locks) across
    /// the two writes.
    async fn save_with_note(
        &self,
        milestone: &Milestone,
        new_note: NewMilestoneNote,
    ) -> AppResult<(Milestone, MilestoneNote)>;

    async fn list_by_project(&self, project_id: Uuid) -> AppResult<Vec<Milestone>>;

    async fn list_blocked_by_supervisor(&self, supervisor_id: Uuid) -> AppResult<Vec<Milestone>>;
}

/// Read side of the note history. Notes are only written through
/// `MilestoneStore::save_with_note`.
#[async_trait]
pub trait MilestoneNoteStore: Send + Sync {
    /// Notes for a milestone, oldest first.
    async fn list_by_milestone(&self, milestone_id: Uuid) -> AppResult<Vec<MilestoneNote>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Active users only.
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>>;
}

pub(crate) fn version_conflict(milestone_id: Uuid) -> crate::error::AppError {
    crate::error::AppError::conflict_with_code(
        format!("Milestone {} was modified concurrently, reload and retry", milestone_id),
        Some("version".to_string()),
        crate::db::models::api::error_codes::MILESTONE_VERSION_CONFLICT,
    )
}
