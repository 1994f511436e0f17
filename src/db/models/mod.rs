// Sub-modules organized by functional domain
pub mod api;
pub mod auth;
pub mod milestone;
pub mod milestone_note;
pub mod project;

// API response structures
pub use api::*;

// Authentication and user models
pub use auth::*;

// Milestone models
pub use milestone::*;
pub use milestone_note::*;

// Project models
pub use project::*;
