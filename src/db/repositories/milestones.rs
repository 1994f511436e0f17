use diesel::prelude::*;

use crate::db::enums::MilestoneStatus;
use crate::db::models::milestone::{Milestone, MilestoneChangeset, NewMilestone};

pub struct MilestoneRepo;

impl MilestoneRepo {
    pub fn find_by_id(
        conn: &mut PgConnection,
        milestone_id: uuid::Uuid,
    ) -> Result<Option<Milestone>, diesel::result::Error> {
        use crate::schema::milestones::dsl::*;
        milestones
            .filter(id.eq(milestone_id))
            .select(Milestone::as_select())
            .first(conn)
            .optional()
    }

    pub fn insert(
        conn: &mut PgConnection,
        new_milestone: &NewMilestone,
    ) -> Result<Milestone, diesel::result::Error> {
        diesel::insert_into(crate::schema::milestones::table)
            .values(new_milestone)
            .returning(Milestone::as_returning())
            .get_result(conn)
    }

    /// Writes the whole row only if the stored version still matches the one
    /// the caller read. `None` means another writer got there first.
    pub fn update_if_version(
        conn: &mut PgConnection,
        milestone: &Milestone,
    ) -> Result<Option<Milestone>, diesel::result::Error> {
        use crate::schema::milestones::dsl::*;
        diesel::update(
            milestones
                .filter(id.eq(milestone.id))
                .filter(version.eq(milestone.version)),
        )
        .set(&MilestoneChangeset::next_version_of(milestone))
        .returning(Milestone::as_returning())
        .get_result(conn)
        .optional()
    }

    pub fn list_by_project(
        conn: &mut PgConnection,
        target_project_id: uuid::Uuid,
    ) -> Result<Vec<Milestone>, diesel::result::Error> {
        use crate::schema::milestones::dsl::*;
        milestones
            .filter(project_id.eq(target_project_id))
            .order((due_date.asc(), created_at.asc()))
            .select(Milestone::as_select())
            .load(conn)
    }

    pub fn list_blocked_by_supervisor(
        conn: &mut PgConnection,
        target_supervisor_id: uuid::Uuid,
    ) -> Result<Vec<Milestone>, diesel::result::Error> {
        use crate::schema::{milestones as m, projects as p};
        m::table
            .inner_join(p::table)
            .filter(p::supervisor_id.eq(target_supervisor_id))
            .filter(m::status.eq(MilestoneStatus::Blocked))
            .order((m::due_date.asc(), m::created_at.asc()))
            .select(Milestone::as_select())
            .load(conn)
    }
}
