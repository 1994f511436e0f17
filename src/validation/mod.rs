pub mod milestone;

use axum::{
    Json, async_trait,
    extract::FromRequest,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::{
    db::models::api::{ApiResponse, ErrorDetail},
    error::AppError,
};

/// 验证的 JSON 提取器
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S, axum::body::Body> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request<axum::body::Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            AppError::validation(format!("Invalid JSON body: {}", rejection.body_text()))
                .into_response()
        })?;

        value
            .validate()
            .map_err(|errors| validation_error_response(error_details(&errors)).into_response())?;

        Ok(ValidatedJson(value))
    }
}

/// 将 validator 的错误展开为逐字段的错误详情
pub fn error_details(errors: &ValidationErrors) -> Vec<ErrorDetail> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| ErrorDetail {
                field: Some(field.to_string()),
                code: error.code.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation failed for field: {}", field)),
            })
        })
        .collect()
}

/// 验证错误响应辅助函数
pub fn validation_error_response(errors: Vec<ErrorDetail>) -> (StatusCode, Json<ApiResponse<()>>) {
    let response = ApiResponse::validation_error(errors);
    (StatusCode::BAD_REQUEST, Json(response))
}
