use serde::Serialize;

// 统一API响应结构
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
    pub timestamp: String,
}

#[derive(Serialize, Debug)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub code: String,
    pub message: String,
}

// 便捷构造函数
impl<T> ApiResponse<T> {
    pub fn success(data: T, message: &str) -> Self {
        Self {
            success: true,
            code: 200,
            message: message.to_string(),
            data: Some(data),
            errors: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn created(data: T, message: &str) -> Self {
        Self {
            success: true,
            code: 201,
            message: message.to_string(),
            data: Some(data),
            errors: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            code: 200,
            message: message.to_string(),
            data: None,
            errors: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// 携带单个错误详情的失败响应
    pub fn failure(code: u16, message: &str, error_code: &str, field: Option<String>) -> Self {
        Self {
            success: false,
            code,
            message: message.to_string(),
            data: None,
            errors: Some(vec![ErrorDetail {
                field,
                code: error_code.to_string(),
                message: message.to_string(),
            }]),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn validation_error(errors: Vec<ErrorDetail>) -> Self {
        Self {
            success: false,
            code: 400,
            message: "Validation failed".to_string(),
            data: None,
            errors: Some(errors),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::failure(401, message, "UNAUTHORIZED", None)
    }

    pub fn forbidden(message: &str, error_code: &str) -> Self {
        Self::failure(403, message, error_code, None)
    }

    pub fn not_found(message: &str, error_code: &str) -> Self {
        Self::failure(404, message, error_code, None)
    }

    pub fn conflict(message: &str, field: Option<String>, error_code: &str) -> Self {
        Self::failure(409, message, error_code, field)
    }

    pub fn bad_request(message: &str, error_code: &str) -> Self {
        Self::failure(400, message, error_code, None)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::failure(500, message, "INTERNAL_ERROR", None)
    }
}

// 业务错误码常量
pub mod error_codes {
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";

    // 里程碑相关
    pub const MILESTONE_NOT_FOUND: &str = "MILESTONE_NOT_FOUND";
    pub const MILESTONE_FORBIDDEN: &str = "MILESTONE_FORBIDDEN";
    pub const MILESTONE_INVALID_STATUS: &str = "MILESTONE_INVALID_STATUS";
    pub const MILESTONE_VALIDATION: &str = "MILESTONE_VALIDATION";
    pub const MILESTONE_VERSION_CONFLICT: &str = "MILESTONE_VERSION_CONFLICT";
}
