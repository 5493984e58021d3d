//! # 알림함 API
//!
//! | 메서드 | 경로 | 권한 | 설명 |
//! |--------|------|------|------|
//! | GET | /notifications | 로그인 | 내 알림 목록 (`unread_only=true`로 안 읽은 것만) |
//! | GET | /notifications/unread-count | 로그인 | 안 읽은 알림 수 |
//! | PATCH | /notifications/{id}/read | 로그인 | 읽음 처리 |
//! | POST | /notifications/read-all | 로그인 | 전체 읽음 처리 |
//! | DELETE | /notifications/{id} | 로그인 | 알림 삭제 |
//! | POST | /admin/notifications/broadcast | admin | 활성 사용자 전체에게 공지 |
//!
//! 다른 사용자의 알림은 존재 여부도 드러내지 않도록 404로 응답합니다.

use crate::{
    db::{notifications as db_notifications, users as db_users},
    error::AppError,
    middleware::auth::{AdminUser, AuthUser},
    models::*,
    services::{
        notify,
        pagination::{PageQuery, Paginated},
        validation::{self, MAX_COMMENT_CHARS, MAX_TITLE_CHARS},
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn list_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<NotificationFilter>,
) -> Result<Json<Paginated<Notification>>, AppError> {
    let page = page.resolve();
    let (items, total) =
        db_notifications::list_for_user(&state.pool, &auth_user.user_id, filter.unread_only, page)
            .await?;

    Ok(Json(Paginated::new(items, page, total)))
}

pub async fn unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let count = db_notifications::unread_count(&state.pool, &auth_user.user_id).await?;
    Ok(Json(json!({ "count": count })))
}

/// 다른 사용자의 알림은 존재 여부를 드러내지 않도록 404로 응답합니다.
pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Notification>, AppError> {
    let notification = db_notifications::mark_read(&state.pool, &id, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let updated = db_notifications::mark_all_read(&state.pool, &auth_user.user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db_notifications::delete(&state.pool, &id, &auth_user.user_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// 활성 사용자 전원에게 공지를 보냅니다.
///
/// 사용자별 알림 행을 만든 뒤, 접속 중인 모든 WebSocket에 `announcement` 이벤트를 한 번 더 보냅니다.
pub async fn broadcast(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<BroadcastRequest>,
) -> Result<Json<Value>, AppError> {
    let title = validation::required_text("Title", &req.title, MAX_TITLE_CHARS)?;
    let body = validation::required_text("Body", &req.body, MAX_COMMENT_CHARS)?;
    let kind = req
        .kind
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or("announcement")
        .to_string();

    let user_ids = db_users::list_active_user_ids(&state.pool).await?;
    let mut delivered = 0usize;
    for user_id in &user_ids {
        match notify::notify(&state, user_id, NewNotification::new(&kind, &title, &body)).await {
            Ok(_) => delivered += 1,
            Err(e) => tracing::warn!("Broadcast to {} failed: {}", user_id, e),
        }
    }

    state.realtime.publish_all(
        "announcement",
        json!({ "kind": kind, "title": title, "body": body }),
    );
    tracing::info!("Broadcast \"{}\" delivered to {} users by {}", title, delivered, admin.user_id);

    Ok(Json(json!({ "delivered": delivered })))
}
