//! # 기도 요청 API
//!
//! 익명 글의 작성자 정보는 [`PrayerPost::into_view`]에서 보는 사람에 맞게 가려집니다.
//! 목록과 상세 응답에는 로그인한 사용자가 이미 "함께 기도"했는지(`prayed`)가 포함됩니다.

use crate::{
    db::{self, prayers as db_prayers},
    error::AppError,
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::*,
    services::{
        notify,
        pagination::{PageQuery, Paginated},
        validation::{self, MAX_POST_CHARS, MAX_TITLE_CHARS},
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

fn check_title(title: Option<&str>) -> Result<(), AppError> {
    if let Some(title) = title {
        if title.trim().chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::BadRequest(format!(
                "Title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }
    }
    Ok(())
}

/// 승인되지 않은 기도 요청은 작성자와 검토 권한자에게만 보입니다.
async fn load_visible(
    state: &AppState,
    id: &str,
    viewer: &MaybeAuthUser,
) -> Result<PrayerPost, AppError> {
    let prayer = db_prayers::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let is_author = viewer.user_id() == Some(prayer.author_id.as_str());
    if !prayer.moderation_status.is_visible() && !is_author && !viewer.can_moderate() {
        return Err(AppError::NotFound);
    }
    Ok(prayer)
}

async fn to_view(
    state: &AppState,
    prayer: PrayerPost,
    viewer: &MaybeAuthUser,
) -> Result<PrayerView, AppError> {
    let prayed = match viewer.user_id() {
        Some(user_id) => Some(
            db_prayers::prayed_ids(&state.pool, user_id, std::slice::from_ref(&prayer.id))
                .await?
                .contains(&prayer.id),
        ),
        None => None,
    };
    let mut view = prayer.into_view(viewer.user_id(), viewer.can_moderate());
    view.prayed = prayed;
    Ok(view)
}

pub async fn list_prayers(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<PrayerFilter>,
) -> Result<Json<Paginated<PrayerView>>, AppError> {
    let mine_of = if filter.mine {
        Some(viewer.user_id().ok_or(AppError::Unauthorized(
            "Login required to list your own prayers".to_string(),
        ))?)
    } else {
        None
    };

    let page = page.resolve();
    let (prayers, total) = db_prayers::list_prayers(&state.pool, &filter, mine_of, page).await?;

    let prayed = match viewer.user_id() {
        Some(user_id) => {
            let ids: Vec<String> = prayers.iter().map(|p| p.id.clone()).collect();
            Some(db_prayers::prayed_ids(&state.pool, user_id, &ids).await?)
        }
        None => None,
    };

    let views = prayers
        .into_iter()
        .map(|prayer| {
            let flag = prayed.as_ref().map(|ids| ids.contains(&prayer.id));
            let mut view = prayer.into_view(viewer.user_id(), viewer.can_moderate());
            view.prayed = flag;
            view
        })
        .collect();

    Ok(Json(Paginated::new(views, page, total)))
}

pub async fn create_prayer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreatePrayerRequest>,
) -> Result<(StatusCode, Json<PrayerView>), AppError> {
    state.rate_limiter.check(&format!("content:{}", auth_user.user_id))?;

    let content = validation::required_text("Content", &req.content, MAX_POST_CHARS)?;
    check_title(req.title.as_deref())?;

    let status = ModerationStatus::initial(state.config.auto_approve_content);
    let prayer = db_prayers::create_prayer(
        &state.pool,
        &db::new_id(),
        &auth_user.user_id,
        &req,
        &content,
        status,
    )
    .await?;

    let view = prayer.into_view(Some(&auth_user.user_id), auth_user.role.can_moderate());
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_prayer(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<Json<PrayerView>, AppError> {
    let prayer = load_visible(&state, &id, &viewer).await?;
    Ok(Json(to_view(&state, prayer, &viewer).await?))
}

/// 작성자만 수정할 수 있습니다.
///
/// 자동 승인이 꺼져 있으면 이미 승인된 글을 고칠 때 다시 `pending`으로 돌려 검토를 받게 합니다.
pub async fn update_prayer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePrayerRequest>,
) -> Result<Json<PrayerView>, AppError> {
    let prayer = db_prayers::find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    auth_user.ensure_owner(&prayer.author_id)?;

    let content = req
        .content
        .as_deref()
        .map(|c| validation::required_text("Content", c, MAX_POST_CHARS))
        .transpose()?;
    check_title(req.title.as_deref())?;

    let new_status = (!state.config.auto_approve_content
        && prayer.moderation_status == ModerationStatus::Approved)
        .then_some(ModerationStatus::Pending);

    let prayer = db_prayers::update_prayer(&state.pool, &id, &req, content.as_deref(), new_status)
        .await?
        .ok_or(AppError::NotFound)?;
    if new_status.is_some() {
        tracing::debug!("Prayer {} returned to pending after edit", prayer.id);
    }

    let viewer = MaybeAuthUser(Some(auth_user));
    Ok(Json(to_view(&state, prayer, &viewer).await?))
}

pub async fn delete_prayer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let prayer = db_prayers::find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    auth_user.ensure_can_modify(&prayer.author_id)?;

    db_prayers::delete_prayer(&state.pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn pray(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let viewer = MaybeAuthUser(Some(auth_user.clone()));
    let prayer = load_visible(&state, &id, &viewer).await?;

    let (newly, prayer_count) = db_prayers::pray(&state.pool, &prayer.id, &auth_user.user_id).await?;

    if newly && prayer.author_id != auth_user.user_id {
        notify::notify_quietly(
            &state,
            &prayer.author_id,
            NewNotification::new(
                "prayer_support",
                "Someone prayed for you",
                "Someone is praying for your request",
            )
            .with_data(json!({ "prayer_id": prayer.id })),
        )
        .await;
    }

    Ok(Json(json!({ "prayed": true, "prayer_count": prayer_count })))
}

pub async fn unpray(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    db_prayers::find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let prayer_count = db_prayers::unpray(&state.pool, &id, &auth_user.user_id).await?;

    Ok(Json(json!({ "prayed": false, "prayer_count": prayer_count })))
}
