//! # 라우트 핸들러 모듈
//!
//! 각 하위 모듈은 한 기능 영역의 HTTP 핸들러를 담고 있고,
//! [`router`]가 이들을 `/api/v1` 아래에 모아 하나의 `Router`로 만듭니다.
//!
//! 권한 검사는 핸들러 인자의 추출자(`AuthUser`, `ModeratorUser`, `AdminUser`)가 담당합니다.

pub mod auth;
pub mod bookmarks;
pub mod comments;
pub mod forums;
pub mod health;
pub mod media;
pub mod moderation;
pub mod notifications;
pub mod playback;
pub mod polls;
pub mod prayers;
pub mod push;
pub mod search;
pub mod users;
pub mod ws;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// 전체 애플리케이션 라우터를 만듭니다. `main`과 통합 테스트가 함께 사용합니다.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    let user_routes = Router::new()
        .route("/users/me", patch(users::update_me))
        .route("/users/me/password", post(users::change_password))
        .route("/users/{id}", get(users::get_profile))
        .route("/admin/users", get(users::list_users))
        .route("/admin/users/{id}", delete(users::delete_user))
        .route("/admin/users/{id}/role", patch(users::update_role))
        .route("/admin/users/{id}/status", patch(users::update_status));

    let media_routes = Router::new()
        .route("/media", get(media::list_media).post(media::create_media))
        .route("/media/categories", get(media::list_categories))
        .route(
            "/media/{id}",
            get(media::get_media)
                .patch(media::update_media)
                .delete(media::delete_media),
        )
        .route("/media/{id}/like", post(media::like_media).delete(media::unlike_media))
        .route("/media/{id}/share", post(media::share_media))
        .route(
            "/media/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/comments/{id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/bookmarks", get(bookmarks::list_bookmarks).post(bookmarks::create_bookmark))
        .route("/bookmarks/{media_id}", delete(bookmarks::delete_bookmark))
        .route("/bookmarks/{media_id}/status", get(bookmarks::bookmark_status))
        .route("/playback", post(playback::start))
        .route("/playback/history", get(playback::history))
        .route("/playback/resume/{media_id}", get(playback::resume))
        .route("/playback/{id}", patch(playback::update))
        .route("/playback/{id}/end", post(playback::end));

    let community_routes = Router::new()
        .route("/forums", get(forums::list_forums).post(forums::create_forum))
        .route(
            "/forums/{id}",
            get(forums::get_forum)
                .patch(forums::update_forum)
                .delete(forums::delete_forum),
        )
        .route("/forums/{id}/posts", get(forums::list_posts).post(forums::create_post))
        .route(
            "/forum-posts/{id}",
            get(forums::get_post)
                .patch(forums::update_post)
                .delete(forums::delete_post),
        )
        .route("/forum-posts/{id}/replies", get(forums::list_replies))
        .route("/forum-posts/{id}/like", post(forums::like_post).delete(forums::unlike_post))
        .route("/polls", get(polls::list_polls).post(polls::create_poll))
        .route("/polls/{id}", get(polls::get_poll).delete(polls::delete_poll))
        .route("/polls/{id}/vote", post(polls::vote).delete(polls::retract_vote))
        .route("/polls/{id}/close", post(polls::close_poll))
        .route("/prayers", get(prayers::list_prayers).post(prayers::create_prayer))
        .route(
            "/prayers/{id}",
            get(prayers::get_prayer)
                .patch(prayers::update_prayer)
                .delete(prayers::delete_prayer),
        )
        .route("/prayers/{id}/pray", post(prayers::pray).delete(prayers::unpray));

    let moderation_routes = Router::new()
        .route("/admin/moderation", get(moderation::queue))
        .route("/admin/moderation/{kind}/{id}", patch(moderation::update_status))
        .route("/moderation/{kind}/{id}/flag", post(moderation::flag));

    let notification_routes = Router::new()
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route(
            "/notifications/{id}",
            delete(notifications::delete_notification),
        )
        .route("/notifications/{id}/read", patch(notifications::mark_read))
        .route("/admin/notifications/broadcast", post(notifications::broadcast))
        .route("/push/devices", get(push::list_devices).post(push::register_device))
        .route("/push/devices/{token}", delete(push::delete_device))
        .route("/admin/push/send", post(push::send))
        .route("/ws", get(ws::realtime_ws));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .merge(media_routes)
        .merge(community_routes)
        .merge(moderation_routes)
        .merge(notification_routes)
        .route("/search", get(search::search))
        .route("/health", get(health::health_check));

    // 개발 편의를 위해 모든 출처를 허용합니다. 운영에서는 허용 도메인을 좁혀야 합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
