use crate::{
    db::{bookmarks as db_bookmarks, media as db_media},
    error::AppError,
    middleware::auth::AuthUser,
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

pub async fn list_bookmarks(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<BookmarkedMedia>>, AppError> {
    let page = page.resolve();
    let (items, total) = db_bookmarks::list_for_user(&state.pool, &auth_user.user_id, page).await?;

    Ok(Json(Paginated::new(items, page, total)))
}

/// 북마크 추가. 새로 만들면 201, 이미 있으면 200을 돌려줍니다.
pub async fn create_bookmark(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<Bookmark>), AppError> {
    db_media::find_by_id(&state.pool, &req.media_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let (bookmark, created) =
        db_bookmarks::create_bookmark(&state.pool, &auth_user.user_id, &req.media_id).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };

    Ok((status, Json(bookmark)))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(media_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db_bookmarks::delete_bookmark(&state.pool, &auth_user.user_id, &media_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bookmark_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(media_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let bookmarked = db_bookmarks::find(&state.pool, &auth_user.user_id, &media_id)
        .await?
        .is_some();

    Ok(Json(json!({ "bookmarked": bookmarked })))
}
