use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use super::{MilestoneNoteStore, MilestoneStore, UserStore, version_conflict};
use crate::db::DbPool;
use crate::db::models::{
    Milestone, MilestoneNote, NewMilestone, NewMilestoneNote, Project, User,
};
use crate::db::repositories::{
    milestone_notes::MilestoneNoteRepo, milestones::MilestoneRepo, projects::ProjectsRepo,
    users::UsersRepo,
};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgMilestoneStore {
    pool: DbPool,
}

impl PgMilestoneStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MilestoneStore for PgMilestoneStore {
    async fn find_by_id(&self, milestone_id: Uuid) -> AppResult<Option<Milestone>> {
        let mut conn = self.pool.get()?;
        Ok(MilestoneRepo::find_by_id(&mut conn, milestone_id)?)
    }

    async fn find_project(&self, project_id: Uuid) -> AppResult<Option<Project>> {
        let mut conn = self.pool.get()?;
        Ok(ProjectsRepo::find_by_id(&mut conn, project_id)?)
    }

    async fn insert(&self, new_milestone: NewMilestone) -> AppResult<Milestone> {
        let mut conn = self.pool.get()?;
        Ok(MilestoneRepo::insert(&mut conn, &new_milestone)?)
    }

    async fn save(&self, milestone: &Milestone) -> AppResult<Milestone> {
        let mut conn = self.pool.get()?;
        match MilestoneRepo::update_if_version(&mut conn, milestone)? {
            Some(saved) => Ok(saved),
            None => Err(stale_write(milestone)),
        }
    }

    async fn save_with_note(
        &self,
        milestone: &Milestone,
        new_note: NewMilestoneNote,
    ) -> AppResult<(Milestone, MilestoneNote)> {
        let mut conn = self.pool.get()?;
        // The row update and the note insert commit or roll back together.
        conn.transaction::<_, AppError, _>(|tx| {
            let saved = MilestoneRepo::update_if_version(tx, milestone)?
                .ok_or_else(|| stale_write(milestone))?;
            let note = MilestoneNoteRepo::insert(tx, &new_note)?;
            Ok((saved, note))
        })
    }

    async fn list_by_project(&self, project_id: Uuid) -> AppResult<Vec<Milestone>> {
        let mut conn = self.pool.get()?;
        Ok(MilestoneRepo::list_by_project(&mut conn, project_id)?)
    }

    async fn list_blocked_by_supervisor(&self, supervisor_id: Uuid) -> AppResult<Vec<Milestone>> {
        let mut conn = self.pool.get()?;
        Ok(MilestoneRepo::list_blocked_by_supervisor(&mut conn, supervisor_id)?)
    }
}

#[derive(Clone)]
pub struct PgMilestoneNoteStore {
    pool: DbPool,
}

impl PgMilestoneNoteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MilestoneNoteStore for PgMilestoneNoteStore {
    async fn list_by_milestone(&self, milestone_id: Uuid) -> AppResult<Vec<MilestoneNote>> {
        let mut conn = self.pool.get()?;
        Ok(MilestoneNoteRepo::list_by_milestone(&mut conn, milestone_id)?)
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let mut conn = self.pool.get()?;
        Ok(UsersRepo::find_active_by_id(&mut conn, user_id)?)
    }
}

fn stale_write(milestone: &Milestone) -> AppError {
    tracing::warn!(
        milestone_id = %milestone.id,
        expected_version = milestone.version,
        "Milestone save rejected by version check"
    );
    version_conflict(milestone.id)
}
