use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Note type recorded for status changes.
pub const NOTE_TYPE_PROGRESS: &str = "progress";

// MilestoneNote models. Notes are append-only.
#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::milestone_notes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MilestoneNote {
    pub id: Uuid,
    pub milestone_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub note_type: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::milestone_notes)]
pub struct NewMilestoneNote {
    pub milestone_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub note_type: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusHistoryEntry {
    pub user_id: Uuid,
    pub reason: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<MilestoneNote> for StatusHistoryEntry {
    fn from(note: MilestoneNote) -> Self {
        Self {
            user_id: note.author_id,
            reason: note.content,
            timestamp: note.created_at,
        }
    }
}
