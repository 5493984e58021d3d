//! # 미디어 댓글 API
//!
//! | 메서드 | 경로 | 권한 | 설명 |
//! |--------|------|------|------|
//! | GET | /media/{id}/comments | 공개 | 승인된 댓글 목록 (작성순) |
//! | POST | /media/{id}/comments | 로그인 | 댓글 / 답글 작성 |
//! | PATCH | /comments/{id} | 작성자 | 댓글 수정 |
//! | DELETE | /comments/{id} | 작성자, 검토 권한자 | 댓글과 하위 답글 삭제 |
//!
//! 비공개 미디어의 댓글은 관리자에게만 보입니다.

use crate::{
    db::{self, comments as db_comments, media as db_media},
    error::AppError,
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::*,
    services::{
        notify,
        pagination::{PageQuery, Paginated},
        validation::{self, MAX_COMMENT_CHARS},
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

pub async fn list_comments(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(media_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Comment>>, AppError> {
    let media = db_media::find_by_id(&state.pool, &media_id)
        .await?
        .filter(|m| m.is_published || viewer.is_admin())
        .ok_or(AppError::NotFound)?;

    let page = page.resolve();
    let (comments, total) = db_comments::list_for_media(&state.pool, &media.id, page).await?;

    Ok(Json(Paginated::new(comments, page, total)))
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(media_id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    state.rate_limiter.check(&format!("content:{}", auth_user.user_id))?;

    let content = validation::required_text("Content", &req.content, MAX_COMMENT_CHARS)?;
    let media = db_media::find_by_id(&state.pool, &media_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !media.is_published && !auth_user.role.is_admin() {
        return Err(AppError::NotFound);
    }

    let parent = match req.parent_id.as_deref() {
        Some(parent_id) => {
            let parent = db_comments::find_by_id(&state.pool, parent_id)
                .await?
                .filter(|p| {
                    p.media_id == media.id
                        && (p.moderation_status.is_visible()
                            || p.author_id == auth_user.user_id
                            || auth_user.role.can_moderate())
                })
                .ok_or(AppError::BadRequest(
                    "Parent comment does not belong to this media".to_string(),
                ))?;
            Some(parent)
        }
        None => None,
    };

    let status = ModerationStatus::initial(state.config.auto_approve_content);
    let comment = db_comments::create_comment(
        &state.pool,
        &db::new_id(),
        &media.id,
        &auth_user.user_id,
        parent.as_ref().map(|p| p.id.as_str()),
        &content,
        status,
    )
    .await?;

    if let Some(parent) = parent.filter(|p| p.author_id != auth_user.user_id) {
        notify::notify_quietly(
            &state,
            &parent.author_id,
            NewNotification::new(
                "comment_reply",
                "New reply to your comment",
                format!("{} replied to your comment on \"{}\"", comment.author_username, media.title),
            )
            .with_data(json!({ "media_id": media.id, "comment_id": comment.id })),
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    let comment = db_comments::find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    auth_user.ensure_owner(&comment.author_id)?;

    let content = validation::required_text("Content", &req.content, MAX_COMMENT_CHARS)?;
    let comment = db_comments::update_content(&state.pool, &id, &content)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let comment = db_comments::find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    auth_user.ensure_can_modify(&comment.author_id)?;

    db_comments::delete_comment(&state.pool, &comment).await?;
    Ok(StatusCode::NO_CONTENT)
}
