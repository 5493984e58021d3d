//! # 포럼 / 게시글 API
//!
//! | 메서드 | 경로 | 권한 | 설명 |
//! |--------|------|------|------|
//! | GET | /forums | 공개 | 포럼 목록 (비활성 포럼은 검토 권한자만) |
//! | POST | /forums | moderator | 포럼 생성 (slug 자동 생성) |
//! | GET | /forums/{id_or_slug} | 공개 | 포럼 상세 |
//! | PATCH | /forums/{id} | moderator | 포럼 수정 |
//! | DELETE | /forums/{id} | admin | 포럼 삭제 |
//! | GET, POST | /forums/{id}/posts | 공개 / 로그인 | 최상위 글 목록 / 글 작성 |
//! | GET | /forum-posts/{id}/replies | 공개 | 답글 목록 |
//! | GET, PATCH, DELETE | /forum-posts/{id} | 공개 / 작성자 (삭제는 검토 권한자도) | 글 조회 / 수정 / 삭제 |
//! | POST, DELETE | /forum-posts/{id}/like | 로그인 | 좋아요 / 취소 |

use crate::{
    db::{self, forums as db_forums},
    error::AppError,
    middleware::auth::{AdminUser, AuthUser, MaybeAuthUser, ModeratorUser},
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
use serde_json::json;

/// 비활성 포럼은 검토 권한자가 아니면 없는 것으로 취급합니다.
async fn load_forum(state: &AppState, key: &str, can_moderate: bool) -> Result<Forum, AppError> {
    db_forums::find_by_id_or_slug(&state.pool, key)
        .await?
        .filter(|f| f.is_active || can_moderate)
        .ok_or(AppError::NotFound)
}

/// 승인되지 않은 글은 작성자와 검토 권한자에게만 보입니다.
async fn load_post(state: &AppState, id: &str, viewer: &MaybeAuthUser) -> Result<ForumPost, AppError> {
    let post = db_forums::find_post(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let is_author = viewer.user_id() == Some(post.author_id.as_str());
    if !post.moderation_status.is_visible() && !is_author && !viewer.can_moderate() {
        return Err(AppError::NotFound);
    }
    Ok(post)
}

pub async fn list_forums(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ForumFilter>,
) -> Result<Json<Paginated<Forum>>, AppError> {
    let page = page.resolve();
    let (forums, total) =
        db_forums::list_forums(&state.pool, &filter, viewer.can_moderate(), page).await?;

    Ok(Json(Paginated::new(forums, page, total)))
}

pub async fn create_forum(
    State(state): State<AppState>,
    ModeratorUser(moderator): ModeratorUser,
    Json(req): Json<CreateForumRequest>,
) -> Result<(StatusCode, Json<Forum>), AppError> {
    let title = validation::required_text("Title", &req.title, MAX_TITLE_CHARS)?;

    let slug = db_forums::unique_slug(&state.pool, &title).await?;
    let forum =
        db_forums::create_forum(&state.pool, &db::new_id(), &req, &slug, &moderator.user_id).await?;
    tracing::info!("Forum created: {} ({})", forum.title, forum.slug);

    Ok((StatusCode::CREATED, Json(forum)))
}

pub async fn get_forum(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(key): Path<String>,
) -> Result<Json<Forum>, AppError> {
    Ok(Json(load_forum(&state, &key, viewer.can_moderate()).await?))
}

pub async fn update_forum(
    State(state): State<AppState>,
    ModeratorUser(_moderator): ModeratorUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateForumRequest>,
) -> Result<Json<Forum>, AppError> {
    if let Some(title) = req.title.as_deref() {
        validation::required_text("Title", title, MAX_TITLE_CHARS)?;
    }

    let forum = db_forums::update_forum(&state.pool, &id, &req)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(forum))
}

pub async fn delete_forum(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db_forums::delete_forum(&state.pool, &id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!("Forum {} deleted by {}", id, admin.user_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_posts(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(key): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<ForumPost>>, AppError> {
    let forum = load_forum(&state, &key, viewer.can_moderate()).await?;

    let page = page.resolve();
    let (posts, total) = db_forums::list_posts(&state.pool, &forum.id, page).await?;

    Ok(Json(Paginated::new(posts, page, total)))
}

pub async fn create_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(key): Path<String>,
    Json(req): Json<CreateForumPostRequest>,
) -> Result<(StatusCode, Json<ForumPost>), AppError> {
    state.rate_limiter.check(&format!("content:{}", auth_user.user_id))?;

    let content = validation::required_text("Content", &req.content, MAX_POST_CHARS)?;
    let forum = load_forum(&state, &key, auth_user.role.can_moderate()).await?;
    if !forum.is_active {
        return Err(AppError::Forbidden("This forum is not accepting posts".to_string()));
    }

    // 숨겨진 글은 작성자와 검토 권한자 외에는 없는 글로 취급합니다.
    let can_reply_to = |p: &ForumPost| {
        p.moderation_status.is_visible()
            || p.author_id == auth_user.user_id
            || auth_user.role.can_moderate()
    };
    let parent = match req.parent_id.as_deref() {
        Some(parent_id) => Some(
            db_forums::find_post(&state.pool, parent_id)
                .await?
                .filter(|p| p.forum_id == forum.id && can_reply_to(p))
                .ok_or(AppError::BadRequest(
                    "Parent post does not belong to this forum".to_string(),
                ))?,
        ),
        None => None,
    };

    let status = ModerationStatus::initial(state.config.auto_approve_content);
    let post = db_forums::create_post(
        &state.pool,
        &db::new_id(),
        &forum.id,
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
                "forum_reply",
                "New reply to your post",
                format!("{} replied to your post in {}", post.author_username, forum.title),
            )
            .with_data(json!({ "forum_id": forum.id, "post_id": post.id, "parent_id": parent.id })),
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_replies(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<ForumPost>>, AppError> {
    let post = load_post(&state, &id, &viewer).await?;

    let page = page.resolve();
    let (replies, total) = db_forums::list_replies(&state.pool, &post.id, page).await?;

    Ok(Json(Paginated::new(replies, page, total)))
}

pub async fn get_post(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<Json<ForumPostDetail>, AppError> {
    let post = load_post(&state, &id, &viewer).await?;
    let liked = match viewer.user_id() {
        Some(user_id) => Some(db_forums::is_post_liked(&state.pool, &post.id, user_id).await?),
        None => None,
    };

    Ok(Json(ForumPostDetail { post, liked }))
}

pub async fn update_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateForumPostRequest>,
) -> Result<Json<ForumPost>, AppError> {
    let post = db_forums::find_post(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    auth_user.ensure_owner(&post.author_id)?;

    let content = validation::required_text("Content", &req.content, MAX_POST_CHARS)?;
    let post = db_forums::update_post_content(&state.pool, &id, &content)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let post = db_forums::find_post(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    auth_user.ensure_can_modify(&post.author_id)?;

    db_forums::delete_post(&state.pool, &post).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LikeState>, AppError> {
    let post = load_post(&state, &id, &MaybeAuthUser(Some(auth_user.clone()))).await?;
    let likes_count = db_forums::like_post(&state.pool, &post.id, &auth_user.user_id).await?;

    Ok(Json(LikeState {
        liked: true,
        likes_count,
    }))
}

pub async fn unlike_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LikeState>, AppError> {
    db_forums::find_post(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    let likes_count = db_forums::unlike_post(&state.pool, &id, &auth_user.user_id).await?;

    Ok(Json(LikeState {
        liked: false,
        likes_count,
    }))
}
