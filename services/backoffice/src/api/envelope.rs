//! 响应信封
//!
//! 成功: {"success": true, "data": ...} 或 {"success": true, "message": ...}
//! 失败: {"success": false, "message": ..., "error": ...?}

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use stockdesk_errors::AppError;

/// 成功信封
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.into()),
        })
    }
}

/// 错误信封
///
/// 守卫类错误原样透传；内部错误返回泛化消息，
/// 原始错误文本放在 error 字段里（诊断便利）
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = if self.0.is_client_facing() {
            json!({
                "success": false,
                "message": self.0.message(),
            })
        } else {
            tracing::error!(error = %self.0, "Request failed");
            json!({
                "success": false,
                "message": "Internal server error",
                "error": self.0.message(),
            })
        };

        (status, Json(body)).into_response()
    }
}

/// Handler 返回类型别名
pub type ApiResult<T> = Result<T, ApiError>;
