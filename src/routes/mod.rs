pub mod milestones;
pub mod supervisors;

use crate::AppState;
use crate::db::models::api::ApiResponse;
use crate::middleware::auth::auth_middleware;
use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/projects/:project_id/milestones",
            post(milestones::create_milestone).get(milestones::get_project_milestones),
        )
        .route(
            "/milestones/:milestone_id",
            get(milestones::get_milestone).put(milestones::update_milestone),
        )
        .route(
            "/milestones/:milestone_id/status",
            patch(milestones::update_milestone_status),
        )
        .route(
            "/milestones/:milestone_id/history",
            get(milestones::get_milestone_history),
        )
        .route(
            "/milestones/:milestone_id/metrics",
            get(milestones::get_milestone_metrics),
        )
        .route(
            "/milestones/:milestone_id/unblock",
            post(milestones::unblock_milestone),
        )
        .route(
            "/milestones/:milestone_id/transitions",
            get(milestones::get_milestone_transitions),
        )
        .route(
            "/milestone-transitions/validate",
            get(milestones::validate_transition),
        )
        .route(
            "/supervisors/:supervisor_id/blocked-milestones",
            get(supervisors::get_blocked_milestones),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::ok("OK"))
}
