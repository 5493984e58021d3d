//! # 푸시 기기 API
//!
//! | 메서드 | 경로 | 권한 | 설명 |
//! |--------|------|------|------|
//! | POST | /push/devices | 로그인 | 기기 토큰 등록 (이미 있으면 소유자와 플랫폼 갱신) |
//! | GET | /push/devices | 로그인 | 내 기기 목록 |
//! | DELETE | /push/devices/{token} | 로그인 | 내 기기 토큰 삭제 |
//! | POST | /admin/push/send | admin | 특정 사용자에게 직접 푸시 (알림함에는 남지 않음) |

use crate::{
    db::{devices as db_devices, users as db_users},
    error::AppError,
    middleware::auth::{AdminUser, AuthUser},
    models::*,
    services::{notify, push::PushMessage},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn register_device(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceToken>), AppError> {
    let token = req.token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("Device token is required".to_string()));
    }

    let device = db_devices::upsert(&state.pool, &auth_user.user_id, token, req.platform).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn list_devices(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let devices = db_devices::list_for_user(&state.pool, &auth_user.user_id).await?;
    Ok(Json(json!({ "devices": devices })))
}

pub async fn delete_device(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(token): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db_devices::delete_for_user(&state.pool, &auth_user.user_id, &token).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// 관리자가 특정 사용자에게 푸시를 직접 보냅니다. 알림 행은 만들지 않습니다.
pub async fn send(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<SendPushRequest>,
) -> Result<Json<Value>, AppError> {
    db_users::find_by_id(&state.pool, &req.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let message = PushMessage {
        title: req.title,
        body: req.body,
        data: None,
    };
    let report = notify::push_to_user(&state, &req.user_id, &message).await;
    tracing::info!(
        "Direct push to {} by {}: {} sent, {} failed",
        req.user_id,
        admin.user_id,
        report.sent,
        report.failed
    );

    Ok(Json(json!({ "sent": report.sent, "failed": report.failed })))
}
