//! # 재생 세션 API
//!
//! 세션은 시작한 사용자만 갱신/종료할 수 있습니다. 다른 사용자의 세션은 403입니다.

use crate::{
    db::{self, media as db_media, playback as db_playback},
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

fn check_position(position_seconds: i64) -> Result<(), AppError> {
    if position_seconds < 0 {
        return Err(AppError::BadRequest("position_seconds must be >= 0".to_string()));
    }
    Ok(())
}

async fn load_own_session(
    state: &AppState,
    id: &str,
    auth_user: &AuthUser,
) -> Result<PlaybackSession, AppError> {
    let session = db_playback::find_session(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    auth_user.ensure_owner(&session.user_id)?;
    Ok(session)
}

pub async fn start(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<StartPlaybackRequest>,
) -> Result<(StatusCode, Json<PlaybackSession>), AppError> {
    let position = req.position_seconds.unwrap_or(0);
    check_position(position)?;

    let media = db_media::find_by_id(&state.pool, &req.media_id)
        .await?
        .filter(|m| m.is_published || auth_user.role.is_admin())
        .ok_or(AppError::NotFound)?;

    let session = db_playback::start_session(
        &state.pool,
        &db::new_id(),
        &auth_user.user_id,
        &media.id,
        position,
        req.device.as_deref(),
    )
    .await?;
    tracing::debug!("Playback {} started for media {}", session.id, media.id);

    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn update(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePlaybackRequest>,
) -> Result<Json<PlaybackSession>, AppError> {
    check_position(req.position_seconds)?;
    let session = load_own_session(&state, &id, &auth_user).await?;

    let duration = req.duration_seconds.or(session.duration_seconds);
    let completed = session.completed || is_completed(req.position_seconds, duration);

    let session =
        db_playback::update_progress(&state.pool, &id, req.position_seconds, duration, completed)
            .await?
            .ok_or(AppError::NotFound)?;

    Ok(Json(session))
}

pub async fn end(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<EndPlaybackRequest>>,
) -> Result<Json<PlaybackSession>, AppError> {
    let session = load_own_session(&state, &id, &auth_user).await?;

    let position = body
        .and_then(|Json(req)| req.position_seconds)
        .unwrap_or(session.position_seconds);
    check_position(position)?;
    let completed = session.completed || is_completed(position, session.duration_seconds);

    let session = db_playback::end_session(&state.pool, &id, position, completed)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(session))
}

pub async fn history(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<PlaybackHistoryItem>>, AppError> {
    let page = page.resolve();
    let (items, total) = db_playback::list_history(&state.pool, &auth_user.user_id, page).await?;

    Ok(Json(Paginated::new(items, page, total)))
}

pub async fn resume(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(media_id): Path<String>,
) -> Result<Json<ResumePosition>, AppError> {
    let latest = db_playback::latest_for_media(&state.pool, &auth_user.user_id, &media_id).await?;

    let resume = match latest {
        Some(session) => ResumePosition {
            media_id: session.media_id,
            position_seconds: session.position_seconds,
            completed: session.completed,
        },
        None => ResumePosition {
            media_id,
            position_seconds: 0,
            completed: false,
        },
    };

    Ok(Json(resume))
}
