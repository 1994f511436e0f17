use crate::db::enums::MilestoneStatus;
use crate::db::models::api::{ApiResponse, error_codes};
use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Milestone {milestone_id} not found")]
    MilestoneNotFound { milestone_id: Uuid },

    #[error("Permission denied: {message}")]
    MilestonePermission { message: String },

    #[error("Cannot transition from {from} to {to}")]
    InvalidMilestoneStatus {
        from: MilestoneStatus,
        to: MilestoneStatus,
    },

    #[error("Milestone validation error: {message}")]
    MilestoneValidation { message: String },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        field: Option<String>,
        code: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth { .. } | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. }
            | AppError::InvalidMilestoneStatus { .. }
            | AppError::MilestoneValidation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } | AppError::MilestoneNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            AppError::MilestonePermission { .. } => StatusCode::FORBIDDEN,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Redis(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let response = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                ApiResponse::<()>::internal_error("Database error")
            }
            AppError::Pool(ref e) => {
                tracing::error!("Connection pool error: {}", e);
                ApiResponse::<()>::internal_error("Connection error")
            }
            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                ApiResponse::<()>::internal_error("Cache error")
            }
            AppError::Auth { ref message } => ApiResponse::<()>::unauthorized(message),
            AppError::Jwt(ref e) => {
                tracing::debug!("JWT error: {}", e);
                ApiResponse::<()>::unauthorized("Invalid token")
            }
            AppError::Validation { ref message } => {
                ApiResponse::<()>::bad_request(message, error_codes::BAD_REQUEST)
            }
            AppError::NotFound { ref resource } => ApiResponse::<()>::not_found(
                &format!("{} not found", resource),
                error_codes::NOT_FOUND,
            ),
            AppError::MilestoneNotFound { .. } => ApiResponse::<()>::not_found(
                &self.to_string(),
                error_codes::MILESTONE_NOT_FOUND,
            ),
            AppError::MilestonePermission { ref message } => {
                ApiResponse::<()>::forbidden(message, error_codes::MILESTONE_FORBIDDEN)
            }
            AppError::InvalidMilestoneStatus { .. } => ApiResponse::<()>::bad_request(
                &self.to_string(),
                error_codes::MILESTONE_INVALID_STATUS,
            ),
            AppError::MilestoneValidation { ref message } => {
                ApiResponse::<()>::bad_request(message, error_codes::MILESTONE_VALIDATION)
            }
            AppError::Conflict {
                ref message,
                ref field,
                ref code,
            } => ApiResponse::<()>::conflict(
                message,
                field.clone(),
                code.as_deref().unwrap_or("CONFLICT"),
            ),
            AppError::Config(ref e) => {
                tracing::error!("Configuration error: {}", e);
                ApiResponse::<()>::internal_error("Configuration error")
            }
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                ApiResponse::<()>::internal_error(message)
            }
        };

        (status, Json(response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// 便捷的错误创建函数
impl AppError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn milestone_not_found(milestone_id: Uuid) -> Self {
        Self::MilestoneNotFound { milestone_id }
    }

    pub fn milestone_permission(message: impl Into<String>) -> Self {
        Self::MilestonePermission {
            message: message.into(),
        }
    }

    pub fn milestone_validation(message: impl Into<String>) -> Self {
        Self::MilestoneValidation {
            message: message.into(),
        }
    }

    pub fn conflict_with_code(
        message: impl Into<String>,
        field: Option<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            message: message.into(),
            field,
            code: Some(code.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
