//! # 미디어 라이브러리 API
//!
//! | 메서드 | 경로 | 권한 | 설명 |
//! |--------|------|------|------|
//! | GET | /media | 공개 | 목록 (카테고리/종류/검색어/정렬) |
//! | GET | /media/categories | 공개 | 카테고리별 개수 |
//! | GET | /media/{id} | 공개 | 상세 (로그인 시 liked/bookmarked 포함) |
//! | POST | /media | admin | 등록 |
//! | PATCH | /media/{id} | admin | 수정 |
//! | DELETE | /media/{id} | admin | 삭제 |
//! | POST, DELETE | /media/{id}/like | 로그인 | 좋아요 / 취소 (멱등) |
//! | POST | /media/{id}/share | 로그인 | 공유 기록 |
//!
//! 비공개(`is_published = false`) 항목은 관리자에게만 보입니다.

use crate::{
    db::{self, bookmarks as db_bookmarks, media as db_media},
    error::AppError,
    middleware::auth::{AdminUser, AuthUser, MaybeAuthUser},
    models::*,
    services::pagination::{PageQuery, Paginated},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

/// 호출자가 볼 수 있는 미디어를 찾습니다. 비공개 항목은 관리자가 아니면 404입니다.
async fn load_visible(state: &AppState, id: &str, is_admin: bool) -> Result<Media, AppError> {
    let media = db_media::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !media.is_published && !is_admin {
        return Err(AppError::NotFound);
    }
    Ok(media)
}

pub async fn list_media(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<MediaFilter>,
) -> Result<Json<Paginated<Media>>, AppError> {
    let page = page.resolve();
    let (items, total) = db_media::list_media(&state.pool, &filter, viewer.is_admin(), page).await?;

    Ok(Json(Paginated::new(items, page, total)))
}

pub async fn list_categories(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
) -> Result<Json<Value>, AppError> {
    let categories = db_media::list_categories(&state.pool, viewer.is_admin()).await?;
    Ok(Json(json!({ "categories": categories })))
}

pub async fn get_media(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<Json<MediaDetail>, AppError> {
    let media = load_visible(&state, &id, viewer.is_admin()).await?;

    let (liked, bookmarked) = match viewer.user_id() {
        Some(user_id) => (
            Some(db_media::is_liked(&state.pool, &id, user_id).await?),
            Some(db_bookmarks::find(&state.pool, user_id, &id).await?.is_some()),
        ),
        None => (None, None),
    };

    Ok(Json(MediaDetail {
        media,
        liked,
        bookmarked,
    }))
}

pub async fn create_media(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateMediaRequest>,
) -> Result<(StatusCode, Json<Media>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    if req.url.trim().is_empty() {
        return Err(AppError::BadRequest("URL is required".to_string()));
    }
    if req.duration_seconds.is_some_and(|d| d < 0) {
        return Err(AppError::BadRequest("Duration cannot be negative".to_string()));
    }

    let media = db_media::create_media(&state.pool, &db::new_id(), &req, &admin.user_id).await?;
    tracing::info!("Media created: {} ({})", media.title, media.id);

    Ok((StatusCode::CREATED, Json(media)))
}

pub async fn update_media(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateMediaRequest>,
) -> Result<Json<Media>, AppError> {
    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest("Title cannot be empty".to_string()));
    }
    if req.url.as_deref().is_some_and(|u| u.trim().is_empty()) {
        return Err(AppError::BadRequest("URL cannot be empty".to_string()));
    }

    let media = db_media::update_media(&state.pool, &id, &req)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(media))
}

pub async fn delete_media(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db_media::delete_media(&state.pool, &id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_media(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LikeState>, AppError> {
    load_visible(&state, &id, auth_user.role.is_admin()).await?;
    let likes_count = db_media::like(&state.pool, &id, &auth_user.user_id).await?;

    Ok(Json(LikeState {
        liked: true,
        likes_count,
    }))
}

pub async fn unlike_media(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LikeState>, AppError> {
    db_media::find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let likes_count = db_media::unlike(&state.pool, &id, &auth_user.user_id).await?;

    Ok(Json(LikeState {
        liked: false,
        likes_count,
    }))
}

pub async fn share_media(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<ShareRequest>>,
) -> Result<Json<Value>, AppError> {
    load_visible(&state, &id, auth_user.role.is_admin()).await?;

    let channel = body.and_then(|Json(req)| req.channel);
    let shares_count =
        db_media::share(&state.pool, &id, &auth_user.user_id, channel.as_deref()).await?;

    Ok(Json(json!({ "shared": true, "shares_count": shares_count })))
}
