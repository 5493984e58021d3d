//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! 응답 본문 형식은 모든 에러에서 동일합니다:
//! `{ "error": { "code": "not_found", "message": "..." } }`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// `#[from]` 덕분에 sqlx 함수 호출 뒤 `?`만 붙이면 자동 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 인증 실패 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 인증은 되었지만 권한이 없음 (HTTP 403)
    /// 예: 다른 사람의 댓글 수정, 일반 사용자의 관리자 API 호출
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 비활성화된 계정으로 로그인 시도 (HTTP 403)
    #[error("Account is deactivated")]
    InactiveAccount,

    /// 리소스 충돌 (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 요청 빈도 제한 초과 (HTTP 429)
    #[error("Too many requests")]
    TooManyRequests,
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, Internal)는 실제 에러 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Unauthorized(ref msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone())
            }
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::InactiveAccount => (
                StatusCode::FORBIDDEN,
                "inactive_account",
                "This account has been deactivated".to_string(),
            ),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_requests",
                "Too many requests, please slow down".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// UNIQUE 제약조건 위반인지 확인합니다.
///
/// 동시에 같은 사용자명으로 가입하는 경우처럼, 사전 중복 확인을 통과했어도
/// INSERT 단계에서 충돌이 날 수 있습니다. 이때 500 대신 409를 돌려주기 위해 사용합니다.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_variants() {
        let cases = [
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::InactiveAccount, StatusCode::FORBIDDEN),
            (AppError::TooManyRequests, StatusCode::TOO_MANY_REQUESTS),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
