use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::AppState;
use crate::db::models::AuthUser;
use crate::db::models::api::ApiResponse;

// 获取导师名下被阻塞的里程碑
pub async fn get_blocked_milestones(
    State(state): State<AppState>,
    Path(supervisor_id): Path<Uuid>,
    _auth_user: AuthUser,
) -> impl IntoResponse {
    match state.milestones.get_blocked_milestones(supervisor_id).await {
        Ok(milestones) => {
            let response =
                ApiResponse::success(milestones, "Blocked milestones retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
