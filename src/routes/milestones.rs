use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::db::enums::MilestoneStatus;
use crate::db::models::api::ApiResponse;
use crate::db::models::{
    AuthUser, CreateMilestoneRequest, MilestoneStatusUpdate, UnblockMilestoneRequest,
    UpdateMilestoneRequest,
};
use crate::services::MilestoneStatusEngine;
use crate::validation::ValidatedJson;

#[derive(Deserialize)]
pub struct TransitionQuery {
    pub from: MilestoneStatus,
    pub to: MilestoneStatus,
}

// 创建里程碑
pub async fn create_milestone(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateMilestoneRequest>,
) -> impl IntoResponse {
    match state
        .milestones
        .create_milestone(project_id, payload, auth_user.id)
        .await
    {
        Ok(milestone) => {
            let response = ApiResponse::created(milestone, "Milestone created successfully");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 获取项目的里程碑列表
pub async fn get_project_milestones(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    auth_user: AuthUser,
) -> impl IntoResponse {
    match state
        .milestones
        .list_project_milestones(project_id, auth_user.id)
        .await
    {
        Ok(milestones) => {
            let response = ApiResponse::success(milestones, "Milestones retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 获取单个里程碑
pub async fn get_milestone(
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    auth_user: AuthUser,
) -> impl IntoResponse {
    match state.milestones.get_milestone(milestone_id, auth_user.id).await {
        Ok(milestone) => {
            let response = ApiResponse::success(milestone, "Milestone retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 更新里程碑字段
pub async fn update_milestone(
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateMilestoneRequest>,
) -> impl IntoResponse {
    match state
        .milestones
        .update_milestone(milestone_id, payload, auth_user.id)
        .await
    {
        Ok(milestone) => {
            let response = ApiResponse::success(milestone, "Milestone updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 更新里程碑状态
pub async fn update_milestone_status(
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<MilestoneStatusUpdate>,
) -> impl IntoResponse {
    match state
        .milestones
        .update_status(milestone_id, payload, auth_user.id)
        .await
    {
        Ok(result) => {
            let response = ApiResponse::success(result, "Milestone status updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 解除阻塞
pub async fn unblock_milestone(
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<UnblockMilestoneRequest>,
) -> impl IntoResponse {
    match state
        .milestones
        .unblock_milestone(milestone_id, auth_user.id, payload.resolution_note)
        .await
    {
        Ok(result) => {
            let response = ApiResponse::success(result, "Milestone unblocked successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 获取状态历史
pub async fn get_milestone_history(
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    auth_user: AuthUser,
) -> impl IntoResponse {
    match state
        .milestones
        .get_status_history(milestone_id, auth_user.id)
        .await
    {
        Ok(history) => {
            let response = ApiResponse::success(history, "Status history retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 获取完成指标，未完成时 data 为 null
pub async fn get_milestone_metrics(
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    auth_user: AuthUser,
) -> impl IntoResponse {
    match state
        .milestones
        .get_completion_metrics(milestone_id, auth_user.id)
        .await
    {
        Ok(Some(metrics)) => {
            let response = ApiResponse::success(metrics, "Completion metrics retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => {
            let response = ApiResponse::<()>::ok("Milestone is not completed");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 获取当前状态可用的转换
pub async fn get_milestone_transitions(
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    auth_user: AuthUser,
) -> impl IntoResponse {
    match state
        .milestones
        .allowed_transitions(milestone_id, auth_user.id)
        .await
    {
        Ok(transitions) => {
            let response = ApiResponse::success(transitions, "Transitions retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 校验状态转换（纯查询，不访问存储）
pub async fn validate_transition(Query(query): Query<TransitionQuery>) -> impl IntoResponse {
    let check = MilestoneStatusEngine::validate_status_transition(query.from, query.to);
    let response = ApiResponse::success(check, "Transition checked");
    (StatusCode::OK, Json(response))
}
