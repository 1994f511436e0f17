pub mod milestone_notes;
pub mod milestones;
pub mod projects;
pub mod users;
