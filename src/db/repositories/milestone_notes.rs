use diesel::prelude::*;

use crate::db::models::milestone_note::{MilestoneNote, NewMilestoneNote};

pub struct MilestoneNoteRepo;

impl MilestoneNoteRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_note: &NewMilestoneNote,
    ) -> Result<MilestoneNote, diesel::result::Error> {
        diesel::insert_into(crate::schema::milestone_notes::table)
            .values(new_note)
            .returning(MilestoneNote::as_returning())
            .get_result(conn)
    }

    pub fn list_by_milestone(
        conn: &mut PgConnection,
        target_milestone_id: uuid::Uuid,
    ) -> Result<Vec<MilestoneNote>, diesel::result::Error> {
        use crate::schema::milestone_notes::dsl::*;
        milestone_notes
            .filter(milestone_id.eq(target_milestone_id))
            .order((created_at.asc(), id.asc()))
            .select(MilestoneNote::as_select())
            .load(conn)
    }
}
