use crate::{
    db::moderation as db_moderation,
    error::AppError,
    middleware::auth::{AuthUser, ModeratorUser},
    models::*,
    services::{
        notify,
        pagination::{PageQuery, Paginated},
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

pub async fn queue(
    State(state): State<AppState>,
    ModeratorUser(_moderator): ModeratorUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ModerationQueueFilter>,
) -> Result<Json<Paginated<ModerationItem>>, AppError> {
    let status = filter.status.unwrap_or(ModerationStatus::Pending);
    let page = page.resolve();
    let (items, total) = db_moderation::list_queue(&state.pool, filter.kind, status, page).await?;

    Ok(Json(Paginated::new(items, page, total)))
}

/// 검토 결과를 반영하고, 상태가 실제로 바뀌었으면 작성자에게 알립니다.
pub async fn update_status(
    State(state): State<AppState>,
    ModeratorUser(moderator): ModeratorUser,
    Path((kind, id)): Path<(ContentKind, String)>,
    Json(req): Json<UpdateModerationRequest>,
) -> Result<Json<Value>, AppError> {
    let change = db_moderation::set_status(&state.pool, kind, &id, req.status)
        .await?
        .ok_or(AppError::NotFound)?;

    if change.changed() {
        tracing::info!(
            "{} {} moved {} -> {} by {}",
            kind.as_str(),
            id,
            change.previous,
            change.current,
            moderator.user_id
        );

        let body = match req.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => format!("Your {} is now {}: {}", kind.as_str(), change.current, reason),
            None => format!("Your {} is now {}", kind.as_str(), change.current),
        };
        notify::notify_quietly(
            &state,
            &change.author_id,
            NewNotification::new("moderation", "Moderation update", body).with_data(json!({
                "kind": kind,
                "id": id,
                "status": change.current,
            })),
        )
        .await;
    }

    Ok(Json(json!({
        "kind": kind,
        "id": id,
        "previous_status": change.previous,
        "status": change.current,
    })))
}

/// 사용자 신고. 승인된 콘텐츠만 검토 대기(`under_review`)로 옮깁니다.
pub async fn flag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((kind, id)): Path<(ContentKind, String)>,
    body: Option<Json<FlagRequest>>,
) -> Result<Json<Value>, AppError> {
    let status = db_moderation::flag(&state.pool, kind, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    let reason = body.and_then(|Json(req)| req.reason);
    tracing::info!(
        "{} {} flagged by {} ({})",
        kind.as_str(),
        id,
        auth_user.user_id,
        reason.as_deref().unwrap_or("no reason")
    );

    Ok(Json(json!({ "status": status })))
}
