pub mod milestones_service;

pub use milestones_service::{MilestoneStatusEngine, can_act_on_milestone};
