use std::collections::HashSet;

use crate::{
    db::{self, polls as db_polls},
    error::AppError,
    middleware::auth::{AdminUser, AuthUser, MaybeAuthUser, ModeratorUser},
    models::*,
    services::{
        pagination::{PageQuery, Paginated},
        validation::{self, MAX_TITLE_CHARS},
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 10;

/// 선택지를 다듬고 개수와 중복을 검사합니다.
fn clean_options(raw: &[String]) -> Result<Vec<String>, AppError> {
    if raw.len() < MIN_OPTIONS || raw.len() > MAX_OPTIONS {
        return Err(AppError::BadRequest(format!(
            "A poll needs between {} and {} options",
            MIN_OPTIONS, MAX_OPTIONS
        )));
    }

    let mut seen = HashSet::new();
    let mut options = Vec::with_capacity(raw.len());
    for option in raw {
        let text = validation::required_text("Option", option, MAX_TITLE_CHARS)?;
        if !seen.insert(text.to_lowercase()) {
            return Err(AppError::BadRequest(format!("Duplicate option: {}", text)));
        }
        options.push(text);
    }
    Ok(options)
}

/// RFC3339 마감 시각을 DB 비교용 UTC 형식으로 바꿉니다. 과거 시각이면 400.
fn normalize_expiry(raw: &str, now: DateTime<Utc>) -> Result<String, AppError> {
    let expires = DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|_| AppError::BadRequest("expires_at must be an RFC3339 timestamp".to_string()))?
        .with_timezone(&Utc);
    if expires <= now {
        return Err(AppError::BadRequest("expires_at must be in the future".to_string()));
    }
    Ok(expires.to_rfc3339_opts(SecondsFormat::Millis, true))
}

async fn load_detail(
    state: &AppState,
    poll: Poll,
    viewer_id: Option<&str>,
) -> Result<PollDetail, AppError> {
    let options = db_polls::list_options(&state.pool, &poll.id).await?;
    let my_votes = match viewer_id {
        Some(user_id) => Some(db_polls::user_votes(&state.pool, &poll.id, user_id).await?),
        None => None,
    };
    Ok(PollDetail::new(poll, options, my_votes, Utc::now()))
}

async fn find_poll(state: &AppState, id: &str) -> Result<Poll, AppError> {
    db_polls::find_poll(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn list_polls(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<PollFilter>,
) -> Result<Json<Paginated<PollDetail>>, AppError> {
    let page = page.resolve();
    let (polls, total) = db_polls::list_polls(&state.pool, filter.status, page).await?;

    let ids: Vec<String> = polls.iter().map(|p| p.id.clone()).collect();
    let mut options = db_polls::list_options_for_polls(&state.pool, &ids).await?;
    let now = Utc::now();

    let details = polls
        .into_iter()
        .map(|poll| {
            let poll_options = options.remove(&poll.id).unwrap_or_default();
            PollDetail::new(poll, poll_options, None, now)
        })
        .collect();

    Ok(Json(Paginated::new(details, page, total)))
}

pub async fn create_poll(
    State(state): State<AppState>,
    ModeratorUser(moderator): ModeratorUser,
    Json(req): Json<CreatePollRequest>,
) -> Result<(StatusCode, Json<PollDetail>), AppError> {
    validation::required_text("Question", &req.question, MAX_TITLE_CHARS)?;
    let options = clean_options(&req.options)?;
    let expires_at = req
        .expires_at
        .as_deref()
        .map(|raw| normalize_expiry(raw, Utc::now()))
        .transpose()?;

    let poll = db_polls::create_poll(
        &state.pool,
        &db::new_id(),
        &req,
        &options,
        expires_at.as_deref(),
        &moderator.user_id,
    )
    .await?;
    tracing::info!("Poll created: {} ({} options)", poll.id, options.len());

    let detail = load_detail(&state, poll, None).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn get_poll(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<Json<PollDetail>, AppError> {
    let poll = find_poll(&state, &id).await?;
    Ok(Json(load_detail(&state, poll, viewer.user_id()).await?))
}

pub async fn vote(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<PollDetail>, AppError> {
    let poll = find_poll(&state, &id).await?;
    if !poll.is_open_at(Utc::now()) {
        return Err(AppError::BadRequest("This poll is closed".to_string()));
    }

    let mut option_ids: Vec<String> = Vec::with_capacity(req.option_ids.len());
    for option_id in req.option_ids {
        if !option_ids.contains(&option_id) {
            option_ids.push(option_id);
        }
    }
    if option_ids.is_empty() {
        return Err(AppError::BadRequest("Select at least one option".to_string()));
    }
    if !poll.allow_multiple && option_ids.len() != 1 {
        return Err(AppError::BadRequest(
            "This poll allows only one option".to_string(),
        ));
    }

    let valid: HashSet<String> = db_polls::list_options(&state.pool, &poll.id)
        .await?
        .into_iter()
        .map(|o| o.id)
        .collect();
    if let Some(unknown) = option_ids.iter().find(|id| !valid.contains(*id)) {
        return Err(AppError::BadRequest(format!(
            "Option {} does not belong to this poll",
            unknown
        )));
    }

    db_polls::cast_votes(&state.pool, &poll, &auth_user.user_id, &option_ids).await?;

    let poll = find_poll(&state, &id).await?;
    Ok(Json(load_detail(&state, poll, Some(&auth_user.user_id)).await?))
}

pub async fn retract_vote(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PollDetail>, AppError> {
    let poll = find_poll(&state, &id).await?;
    if !poll.is_open_at(Utc::now()) {
        return Err(AppError::BadRequest("This poll is closed".to_string()));
    }

    db_polls::retract_votes(&state.pool, &poll.id, &auth_user.user_id).await?;

    let poll = find_poll(&state, &id).await?;
    Ok(Json(load_detail(&state, poll, Some(&auth_user.user_id)).await?))
}

pub async fn close_poll(
    State(state): State<AppState>,
    ModeratorUser(moderator): ModeratorUser,
    Path(id): Path<String>,
) -> Result<Json<PollDetail>, AppError> {
    let poll = db_polls::close_poll(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!("Poll {} closed by {}", poll.id, moderator.user_id);

    Ok(Json(load_detail(&state, poll, None).await?))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db_polls::delete_poll(&state.pool, &id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
