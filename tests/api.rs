//! API 통합 테스트
//!
//! 인메모리 SQLite에 마이그레이션을 적용하고, 포트를 열지 않은 채
//! `routes::router`에 `oneshot`으로 요청을 보냅니다.
//!
//! 인메모리 DB는 연결마다 따로 생기므로 풀 크기는 1로 둡니다 (`Config::for_tests`).

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt; // for .collect()
use serde_json::{json, Value};
use tower::ServiceExt; // for .oneshot()

use fellowship::{
    config::Config,
    db,
    models::Platform,
    routes,
    services::push::{PushError, PushMessage, PushSender},
    state::AppState,
};

struct TestApp {
    router: Router,
    state: AppState,
}

struct TestUser {
    id: String,
    token: String,
    refresh_token: String,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(Config::for_tests()).await
    }

    async fn with_config(config: Config) -> Self {
        Self::from_state(Self::build_state(config).await)
    }

    async fn with_push_sender(sender: Arc<dyn PushSender>) -> Self {
        let state = Self::build_state(Config::for_tests()).await.with_push_sender(sender);
        Self::from_state(state)
    }

    async fn build_state(config: Config) -> AppState {
        let pool = db::connect(&config.database_url, config.db_max_connections)
            .await
            .expect("Failed to create in-memory SQLite pool");
        db::migrate(&pool).await.expect("Migration failed");

        AppState::new(pool, config)
    }

    fn from_state(state: AppState) -> Self {
        Self {
            router: routes::router(state.clone()),
            state,
        }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    async fn register(&self, username: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/api/v1/auth/register",
                None,
                json!({ "username": username, "password": "password123" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    async fn create_media(&self, admin: &TestUser, title: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/media",
                Some(&admin.token),
                json!({
                    "title": title,
                    "media_type": "audio",
                    "url": "https://cdn.example.org/sermon.mp3",
                    "description": "Sunday message on hope and grace",
                    "speaker": "Pastor Lee",
                    "duration_seconds": 100
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create media: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}

// ── health / auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");

    let (status, _) = app.get("/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn first_user_becomes_admin() {
    let app = TestApp::new().await;
    let admin = app.register("pastor").await;
    let member = app.register("member").await;

    let (_, me) = app.get("/api/v1/auth/me", Some(&admin.token)).await;
    assert_eq!(me["role"], "admin");
    let (_, me) = app.get("/api/v1/auth/me", Some(&member.token)).await;
    assert_eq!(me["role"], "user");
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() {
    let app = TestApp::new().await;
    app.register("grace").await;

    let (status, _) = app
        .post("/api/v1/auth/register", None, json!({ "username": "grace", "password": "password123" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post("/api/v1/auth/register", None, json!({ "username": "ab", "password": "password123" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/v1/auth/register", None, json!({ "username": "shortpw", "password": "short" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_and_refresh_rotation() {
    let app = TestApp::new().await;
    let user = app.register("joseph").await;

    let (status, body) = app
        .post("/api/v1/auth/login", None, json!({ "username": "joseph", "password": "wrong-password" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, body) = app
        .post("/api/v1/auth/login", None, json!({ "username": "joseph", "password": "password123" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    let (status, rotated) = app
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refresh_token"], json!(user.refresh_token));

    // 이미 사용한 refresh 토큰은 폐기되었습니다.
    let (status, _) = app
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // access 토큰은 refresh 용도로 쓸 수 없습니다.
    let (status, _) = app
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": user.token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_user_is_locked_out() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("silas").await;

    let (status, body) = app
        .patch(
            &format!("/api/v1/admin/users/{}/status", user.id),
            Some(&admin.token),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, body) = app
        .post("/api/v1/auth/login", None, json!({ "username": "silas", "password": "password123" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "inactive_account");

    // 이미 발급된 access 토큰도 즉시 거부됩니다.
    let (status, body) = app.get("/api/v1/auth/me", Some(&user.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "inactive_account");

    // 관리자는 자기 자신을 비활성화할 수 없습니다.
    let (status, _) = app
        .patch(
            &format!("/api/v1/admin/users/{}/status", admin.id),
            Some(&admin.token),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("lydia").await;

    let (status, _) = app.get("/api/v1/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/v1/admin/users", Some(&user.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/api/v1/admin/users?q=lyd", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["items"][0]["username"], "lydia");

    let (status, _) = app
        .patch(
            &format!("/api/v1/admin/users/{}/role", user.id),
            Some(&admin.token),
            json!({ "role": "bishop" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .patch(
            &format!("/api/v1/admin/users/{}/role", user.id),
            Some(&admin.token),
            json!({ "role": "moderator" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "moderator");
}

#[tokio::test]
async fn password_change_requires_current_password() {
    let app = TestApp::new().await;
    let user = app.register("timothy").await;

    let (status, _) = app
        .post(
            "/api/v1/users/me/password",
            Some(&user.token),
            json!({ "current_password": "not-it", "new_password": "newpassword1" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/v1/users/me/password",
            Some(&user.token),
            json!({ "current_password": "password123", "new_password": "newpassword1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/api/v1/auth/login", None, json!({ "username": "timothy", "password": "newpassword1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

// ── media / comments / bookmarks ─────────────────────────────────────────────

#[tokio::test]
async fn media_like_is_idempotent() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("ruth").await;
    let media_id = app.create_media(&admin, "Amazing Grace").await;
    let like_uri = format!("/api/v1/media/{media_id}/like");

    for _ in 0..2 {
        let (status, body) = app.post(&like_uri, Some(&user.token), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["liked"], true);
        assert_eq!(body["likes_count"], 1);
    }

    let (_, detail) = app.get(&format!("/api/v1/media/{media_id}"), Some(&user.token)).await;
    assert_eq!(detail["liked"], true);
    assert_eq!(detail["bookmarked"], false);

    for _ in 0..2 {
        let (status, body) = app.delete(&like_uri, Some(&user.token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["likes_count"], 0);
    }

    let (_, anonymous) = app.get(&format!("/api/v1/media/{media_id}"), None).await;
    assert!(anonymous.get("liked").is_none());
}

#[tokio::test]
async fn media_write_requires_admin_and_hides_unpublished() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("mark").await;

    let (status, _) = app
        .post(
            "/api/v1/media",
            Some(&user.token),
            json!({ "title": "x", "media_type": "audio", "url": "https://e.org/a.mp3" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/v1/media",
            Some(&admin.token),
            json!({
                "title": "Draft",
                "media_type": "video",
                "url": "https://e.org/draft.mp4",
                "is_published": false
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let draft_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = app.get(&format!("/api/v1/media/{draft_id}"), Some(&user.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/api/v1/media/{draft_id}"), Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = app.get("/api/v1/media", None).await;
    assert_eq!(list["pagination"]["total"], 0);
    let (_, list) = app.get("/api/v1/media", Some(&admin.token)).await;
    assert_eq!(list["pagination"]["total"], 1);
}

#[tokio::test]
async fn share_increments_counter() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let media_id = app.create_media(&admin, "Psalm 23").await;

    let (status, body) = app
        .post(
            &format!("/api/v1/media/{media_id}/share"),
            Some(&admin.token),
            json!({ "channel": "copy_link" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shares_count"], 1);
}

#[tokio::test]
async fn comment_reply_notifies_parent_author() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let media_id = app.create_media(&admin, "Evening Prayer").await;
    let comments_uri = format!("/api/v1/media/{media_id}/comments");

    let (status, parent) = app
        .post(&comments_uri, Some(&alice.token), json!({ "content": "  Blessed message  " }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(parent["content"], "Blessed message");
    assert_eq!(parent["author_username"], "alice");
    let parent_id = parent["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            &comments_uri,
            Some(&bob.token),
            json!({ "content": "Amen", "parent_id": parent_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, media) = app.get(&format!("/api/v1/media/{media_id}"), None).await;
    assert_eq!(media["comments_count"], 2);

    let (_, count) = app.get("/api/v1/notifications/unread-count", Some(&alice.token)).await;
    assert_eq!(count["count"], 1);
    let (_, notifications) = app.get("/api/v1/notifications", Some(&alice.token)).await;
    assert_eq!(notifications["items"][0]["kind"], "comment_reply");

    let (_, count) = app.get("/api/v1/notifications/unread-count", Some(&bob.token)).await;
    assert_eq!(count["count"], 0);

    let (status, _) = app
        .post(&comments_uri, Some(&bob.token), json!({ "content": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comment_parent_must_belong_to_same_media() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let first = app.create_media(&admin, "First").await;
    let second = app.create_media(&admin, "Second").await;

    let (_, parent) = app
        .post(
            &format!("/api/v1/media/{first}/comments"),
            Some(&admin.token),
            json!({ "content": "On the first" }),
        )
        .await;

    let (status, _) = app
        .post(
            &format!("/api/v1/media/{second}/comments"),
            Some(&admin.token),
            json!({ "content": "Wrong thread", "parent_id": parent["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comment_edit_and_delete_permissions() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let author = app.register("author").await;
    let other = app.register("other").await;
    let media_id = app.create_media(&admin, "Hymns").await;

    let (_, comment) = app
        .post(
            &format!("/api/v1/media/{media_id}/comments"),
            Some(&author.token),
            json!({ "content": "Original" }),
        )
        .await;
    let comment_uri = format!("/api/v1/comments/{}", comment["id"].as_str().unwrap());

    let (status, _) = app.patch(&comment_uri, Some(&other.token), json!({ "content": "Hijack" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // 관리자도 남의 글을 수정할 수는 없습니다.
    let (status, _) = app.patch(&comment_uri, Some(&admin.token), json!({ "content": "Edit" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.patch(&comment_uri, Some(&author.token), json!({ "content": "Edited" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Edited");

    let (status, _) = app.delete(&comment_uri, Some(&other.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&comment_uri, Some(&admin.token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, media) = app.get(&format!("/api/v1/media/{media_id}"), None).await;
    assert_eq!(media["comments_count"], 0);
}

#[tokio::test]
async fn bookmarks_created_once() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("naomi").await;
    let media_id = app.create_media(&admin, "Morning Devotion").await;

    let (status, _) = app
        .post("/api/v1/bookmarks", Some(&user.token), json!({ "media_id": media_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post("/api/v1/bookmarks", Some(&user.token), json!({ "media_id": media_id }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/v1/bookmarks", Some(&user.token), json!({ "media_id": "missing" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.get("/api/v1/bookmarks", Some(&user.token)).await;
    assert_eq!(list["pagination"]["total"], 1);

    let status_uri = format!("/api/v1/bookmarks/{media_id}/status");
    let (_, body) = app.get(&status_uri, Some(&user.token)).await;
    assert_eq!(body["bookmarked"], true);

    let bookmark_uri = format!("/api/v1/bookmarks/{media_id}");
    let (status, _) = app.delete(&bookmark_uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&bookmark_uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get(&status_uri, Some(&user.token)).await;
    assert_eq!(body["bookmarked"], false);
}

// ── forums ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn forum_slugs_are_unique() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("peter").await;

    let (status, _) = app
        .post("/api/v1/forums", Some(&user.token), json!({ "title": "Youth" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, first) = app
        .post("/api/v1/forums", Some(&admin.token), json!({ "title": "Sunday Worship" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["slug"], "sunday-worship");

    let (_, second) = app
        .post("/api/v1/forums", Some(&admin.token), json!({ "title": "Sunday Worship!" }))
        .await;
    assert_eq!(second["slug"], "sunday-worship-2");

    let (status, by_slug) = app.get("/api/v1/forums/sunday-worship-2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["id"], second["id"]);
}

#[tokio::test]
async fn forum_posts_and_replies_keep_counters() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let (_, forum) = app
        .post("/api/v1/forums", Some(&admin.token), json!({ "title": "Bible Study" }))
        .await;
    let forum_id = forum["id"].as_str().unwrap().to_string();
    let posts_uri = format!("/api/v1/forums/{forum_id}/posts");

    let (status, post) = app
        .post(&posts_uri, Some(&alice.token), json!({ "content": "Romans 8 thoughts" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = post["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            &posts_uri,
            Some(&bob.token),
            json!({ "content": "Verse 28 stands out", "parent_id": post_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, forum) = app.get(&format!("/api/v1/forums/{forum_id}"), None).await;
    assert_eq!(forum["posts_count"], 2);

    let (_, top_level) = app.get(&posts_uri, None).await;
    assert_eq!(top_level["pagination"]["total"], 1);
    assert_eq!(top_level["items"][0]["replies_count"], 1);

    let (_, replies) = app
        .get(&format!("/api/v1/forum-posts/{post_id}/replies"), None)
        .await;
    assert_eq!(replies["items"][0]["author_username"], "bob");

    let like_uri = format!("/api/v1/forum-posts/{post_id}/like");
    app.post(&like_uri, Some(&bob.token), json!({})).await;
    let (_, liked) = app.post(&like_uri, Some(&bob.token), json!({})).await;
    assert_eq!(liked["likes_count"], 1);

    let (_, count) = app.get("/api/v1/notifications/unread-count", Some(&alice.token)).await;
    assert_eq!(count["count"], 1);

    let (status, _) = app
        .delete(&format!("/api/v1/forum-posts/{post_id}"), Some(&alice.token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, forum) = app.get(&format!("/api/v1/forums/{forum_id}"), None).await;
    assert_eq!(forum["posts_count"], 0);
}

#[tokio::test]
async fn inactive_forum_rejects_posts() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("andrew").await;

    let (_, forum) = app
        .post("/api/v1/forums", Some(&admin.token), json!({ "title": "Archive" }))
        .await;
    let forum_id = forum["id"].as_str().unwrap().to_string();
    app.patch(
        &format!("/api/v1/forums/{forum_id}"),
        Some(&admin.token),
        json!({ "is_active": false }),
    )
    .await;

    let (status, _) = app.get(&format!("/api/v1/forums/{forum_id}"), Some(&user.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            &format!("/api/v1/forums/{forum_id}/posts"),
            Some(&admin.token),
            json!({ "content": "Still here?" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, all) = app.get("/api/v1/forums", Some(&admin.token)).await;
    assert_eq!(all["pagination"]["total"], 1);
    let (_, visible) = app.get("/api/v1/forums", Some(&user.token)).await;
    assert_eq!(visible["pagination"]["total"], 0);
}

// ── polls ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_choice_poll_voting() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("martha").await;

    let (status, _) = app
        .post(
            "/api/v1/polls",
            Some(&admin.token),
            json!({ "question": "Retreat?", "options": ["Yes", " yes "] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, poll) = app
        .post(
            "/api/v1/polls",
            Some(&admin.token),
            json!({ "question": "Picnic date?", "options": ["Saturday", "Sunday"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let poll_id = poll["id"].as_str().unwrap().to_string();
    let saturday = poll["options"][0]["id"].as_str().unwrap().to_string();
    let sunday = poll["options"][1]["id"].as_str().unwrap().to_string();
    let vote_uri = format!("/api/v1/polls/{poll_id}/vote");

    let (status, _) = app
        .post(&vote_uri, Some(&user.token), json!({ "option_ids": [saturday, sunday] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(&vote_uri, Some(&user.token), json!({ "option_ids": ["not-an-option"] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, voted) = app
        .post(&vote_uri, Some(&user.token), json!({ "option_ids": [saturday] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voted["total_votes"], 1);
    assert_eq!(voted["options"][0]["percentage"], 100.0);
    assert_eq!(voted["options"][1]["percentage"], 0.0);
    assert_eq!(voted["my_votes"], json!([saturday]));

    let (status, _) = app
        .post(&vote_uri, Some(&user.token), json!({ "option_ids": [sunday] }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, retracted) = app.delete(&vote_uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retracted["total_votes"], 0);

    let (status, _) = app
        .post(&format!("/api/v1/polls/{poll_id}/close"), Some(&admin.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post(&vote_uri, Some(&user.token), json!({ "option_ids": [sunday] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, open) = app.get("/api/v1/polls?status=open", None).await;
    assert_eq!(open["pagination"]["total"], 0);
    let (_, closed) = app.get("/api/v1/polls?status=closed", None).await;
    assert_eq!(closed["pagination"]["total"], 1);
}

#[tokio::test]
async fn multiple_choice_poll_skips_repeat_votes() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;

    let (_, poll) = app
        .post(
            "/api/v1/polls",
            Some(&admin.token),
            json!({
                "question": "Which songs?",
                "options": ["A", "B", "C"],
                "allow_multiple": true,
                "expires_at": "2999-12-31T00:00:00Z"
            }),
        )
        .await;
    let poll_id = poll["id"].as_str().unwrap().to_string();
    let a = poll["options"][0]["id"].as_str().unwrap().to_string();
    let b = poll["options"][1]["id"].as_str().unwrap().to_string();
    let vote_uri = format!("/api/v1/polls/{poll_id}/vote");

    app.post(&vote_uri, Some(&admin.token), json!({ "option_ids": [a] })).await;
    let (status, voted) = app
        .post(&vote_uri, Some(&admin.token), json!({ "option_ids": [a, b] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voted["total_votes"], 2);
    assert_eq!(voted["options"][0]["percentage"], 50.0);

    let (status, _) = app
        .post(
            "/api/v1/polls",
            Some(&admin.token),
            json!({ "question": "Old?", "options": ["x", "y"], "expires_at": "2000-01-01T00:00:00Z" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── prayers ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_prayer_hides_author() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let author = app.register("hannah").await;
    let friend = app.register("eli").await;

    let (status, prayer) = app
        .post(
            "/api/v1/prayers",
            Some(&author.token),
            json!({ "content": "Please pray for my exam", "is_anonymous": true }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(prayer["author_name"], "hannah");
    let prayer_id = prayer["id"].as_str().unwrap().to_string();

    let (_, list) = app.get("/api/v1/prayers", None).await;
    assert_eq!(list["items"][0]["author_name"], "Anonymous");
    assert!(list["items"][0]["author_id"].is_null());

    let (_, as_admin) = app.get(&format!("/api/v1/prayers/{prayer_id}"), Some(&admin.token)).await;
    assert_eq!(as_admin["author_name"], "hannah");

    let pray_uri = format!("/api/v1/prayers/{prayer_id}/pray");
    for _ in 0..2 {
        let (status, body) = app.post(&pray_uri, Some(&friend.token), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prayer_count"], 1);
    }

    let (_, as_friend) = app.get(&format!("/api/v1/prayers/{prayer_id}"), Some(&friend.token)).await;
    assert_eq!(as_friend["prayed"], true);

    let (_, notifications) = app.get("/api/v1/notifications", Some(&author.token)).await;
    assert_eq!(notifications["pagination"]["total"], 1);
    assert_eq!(notifications["items"][0]["kind"], "prayer_support");

    let (status, body) = app.delete(&pray_uri, Some(&friend.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prayer_count"], 0);
}

#[tokio::test]
async fn mine_filter_requires_login() {
    let app = TestApp::new().await;
    let user = app.register("abigail").await;
    app.post("/api/v1/prayers", Some(&user.token), json!({ "content": "Healing" })).await;

    let (status, _) = app.get("/api/v1/prayers?mine=true", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, mine) = app.get("/api/v1/prayers?mine=true", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["pagination"]["total"], 1);
}

#[tokio::test]
async fn editing_prayer_returns_to_review_without_auto_approve() {
    let mut config = Config::for_tests();
    config.auto_approve_content = false;
    let app = TestApp::with_config(config).await;
    let admin = app.register("admin").await;
    let author = app.register("deborah").await;

    let (_, prayer) = app
        .post("/api/v1/prayers", Some(&author.token), json!({ "content": "Guidance" }))
        .await;
    assert_eq!(prayer["moderation_status"], "pending");
    let prayer_id = prayer["id"].as_str().unwrap().to_string();

    let (status, _) = app.get(&format!("/api/v1/prayers/{prayer_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .patch(
            &format!("/api/v1/admin/moderation/prayer/{prayer_id}"),
            Some(&admin.token),
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/v1/prayers/{prayer_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, edited) = app
        .patch(
            &format!("/api/v1/prayers/{prayer_id}"),
            Some(&author.token),
            json!({ "content": "Guidance and peace" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["moderation_status"], "pending");
}

// ── moderation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn flag_and_review_adjust_counters() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let author = app.register("author").await;
    let reader = app.register("reader").await;
    let media_id = app.create_media(&admin, "Testimony").await;

    let (_, comment) = app
        .post(
            &format!("/api/v1/media/{media_id}/comments"),
            Some(&author.token),
            json!({ "content": "Questionable remark" }),
        )
        .await;
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let (status, flagged) = app
        .post(
            &format!("/api/v1/moderation/comment/{comment_id}/flag"),
            Some(&reader.token),
            json!({ "reason": "off topic" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flagged["status"], "under_review");

    let (_, media) = app.get(&format!("/api/v1/media/{media_id}"), None).await;
    assert_eq!(media["comments_count"], 0);

    let (status, _) = app.get("/api/v1/admin/moderation", Some(&reader.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, queue) = app
        .get("/api/v1/admin/moderation?status=under_review", Some(&admin.token))
        .await;
    assert_eq!(queue["pagination"]["total"], 1);
    assert_eq!(queue["items"][0]["kind"], "comment");

    let (status, _) = app
        .patch(
            &format!("/api/v1/admin/moderation/comment/{comment_id}"),
            Some(&admin.token),
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, media) = app.get(&format!("/api/v1/media/{media_id}"), None).await;
    assert_eq!(media["comments_count"], 1);

    let (_, notifications) = app.get("/api/v1/notifications", Some(&author.token)).await;
    assert_eq!(notifications["items"][0]["kind"], "moderation");

    let (status, _) = app
        .patch(
            "/api/v1/admin/moderation/comment/missing",
            Some(&admin.token),
            json!({ "status": "rejected" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── playback ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn playback_session_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("listener").await;
    let other = app.register("other").await;
    let media_id = app.create_media(&admin, "Long Sermon").await;

    let (_, resume) = app
        .get(&format!("/api/v1/playback/resume/{media_id}"), Some(&user.token))
        .await;
    assert_eq!(resume["position_seconds"], 0);

    let (status, session) = app
        .post("/api/v1/playback", Some(&user.token), json!({ "media_id": media_id, "device": "web" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["duration_seconds"], 100);
    let session_uri = format!("/api/v1/playback/{}", session["id"].as_str().unwrap());

    let (status, _) = app
        .patch(&session_uri, Some(&user.token), json!({ "position_seconds": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .patch(&session_uri, Some(&other.token), json!({ "position_seconds": 10 }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, updated) = app
        .patch(&session_uri, Some(&user.token), json!({ "position_seconds": 50 }))
        .await;
    assert_eq!(updated["completed"], false);
    let (_, updated) = app
        .patch(&session_uri, Some(&user.token), json!({ "position_seconds": 96 }))
        .await;
    assert_eq!(updated["completed"], true);

    let (status, ended) = app
        .post(&format!("{session_uri}/end"), Some(&user.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(ended["ended_at"].is_string());

    let (_, resume) = app
        .get(&format!("/api/v1/playback/resume/{media_id}"), Some(&user.token))
        .await;
    assert_eq!(resume["position_seconds"], 96);
    assert_eq!(resume["completed"], true);

    let (_, history) = app.get("/api/v1/playback/history", Some(&user.token)).await;
    assert_eq!(history["items"][0]["media_title"], "Long Sermon");

    let (_, media) = app.get(&format!("/api/v1/media/{media_id}"), None).await;
    assert_eq!(media["plays_count"], 1);
}

// ── notifications / push ─────────────────────────────────────────────────────

#[tokio::test]
async fn notification_read_state() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("phoebe").await;

    let (status, body) = app
        .post(
            "/api/v1/admin/notifications/broadcast",
            Some(&admin.token),
            json!({ "title": "Service moved", "body": "Sunday service starts at 11" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivered"], 2);

    let (_, list) = app.get("/api/v1/notifications?unread_only=true", Some(&user.token)).await;
    assert_eq!(list["pagination"]["total"], 1);
    assert_eq!(list["items"][0]["kind"], "announcement");
    let notification_id = list["items"][0]["id"].as_str().unwrap().to_string();

    // 다른 사용자의 알림은 보이지 않습니다.
    let (status, _) = app
        .patch(
            &format!("/api/v1/notifications/{notification_id}/read"),
            Some(&admin.token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, read) = app
        .patch(
            &format!("/api/v1/notifications/{notification_id}/read"),
            Some(&user.token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["is_read"], true);

    let (_, updated) = app
        .post("/api/v1/notifications/read-all", Some(&admin.token), json!({}))
        .await;
    assert_eq!(updated["updated"], 1);

    let (status, _) = app
        .delete(&format!("/api/v1/notifications/{notification_id}"), Some(&user.token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, count) = app.get("/api/v1/notifications/unread-count", Some(&user.token)).await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn device_tokens_move_between_users() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let first = app.register("first").await;
    let second = app.register("second").await;

    let (status, _) = app
        .post(
            "/api/v1/push/devices",
            Some(&first.token),
            json!({ "token": "fcm-token-1", "platform": "android" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    app.post(
        "/api/v1/push/devices",
        Some(&second.token),
        json!({ "token": "fcm-token-1", "platform": "android" }),
    )
    .await;

    let (_, devices) = app.get("/api/v1/push/devices", Some(&first.token)).await;
    assert_eq!(devices["devices"].as_array().unwrap().len(), 0);
    let (_, devices) = app.get("/api/v1/push/devices", Some(&second.token)).await;
    assert_eq!(devices["devices"][0]["platform"], "android");

    let (status, report) = app
        .post(
            "/api/v1/admin/push/send",
            Some(&admin.token),
            json!({ "user_id": second.id, "title": "Hello", "body": "Welcome" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["sent"], 1);
    assert_eq!(report["failed"], 0);

    let (status, _) = app
        .post(
            "/api/v1/admin/push/send",
            Some(&admin.token),
            json!({ "user_id": "nobody", "title": "Hello", "body": "Welcome" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete("/api/v1/push/devices/fcm-token-1", Some(&first.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete("/api/v1/push/devices/fcm-token-1", Some(&second.token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// ── search / rate limit ──────────────────────────────────────────────────────

#[tokio::test]
async fn unified_search_ranks_results() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    app.create_media(&admin, "Grace").await;
    app.create_media(&admin, "Amazing Grace").await;
    app.post("/api/v1/forums", Some(&admin.token), json!({ "title": "Grace Group" }))
        .await;

    let (status, body) = app.get("/api/v1/search?q=grace", None).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["title"], "Grace");
    assert_eq!(results[0]["type"], "media");
    assert!(results.iter().any(|r| r["type"] == "forum"));

    let (_, only_forums) = app.get("/api/v1/search?q=grace&types=forums", None).await;
    assert_eq!(only_forums["total"], 1);

    let (_, limited) = app.get("/api/v1/search?q=grace&limit=1", None).await;
    assert_eq!(limited["results"].as_array().unwrap().len(), 1);
    assert_eq!(limited["total"], 3);

    let (status, _) = app.get("/api/v1/search?q=g", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.get("/api/v1/search?q=grace&types=videos", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_is_rate_limited() {
    let mut config = Config::for_tests();
    config.rate_limit_max_requests = 2;
    let app = TestApp::with_config(config).await;
    app.register("eager").await;

    for _ in 0..2 {
        let (status, _) = app
            .post("/api/v1/auth/login", None, json!({ "username": "eager", "password": "nope-nope" }))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = app
        .post("/api/v1/auth/login", None, json!({ "username": "eager", "password": "password123" }))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "too_many_requests");

    // 다른 키는 영향을 받지 않습니다.
    assert!(app.state.rate_limiter.check("login:someone-else").is_ok());
}

// ── 사용자 삭제 / 토큰 회전 ───────────────────────────────────────────────────

#[tokio::test]
async fn deleting_user_settles_counters() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let member = app.register("member").await;
    let alice = app.register("alice").await;

    // 미디어: 좋아요 1, 댓글 3 (member의 댓글 아래 alice의 답글 포함)
    let media_id = app.create_media(&admin, "Vespers").await;
    let comments_uri = format!("/api/v1/media/{media_id}/comments");
    app.post(&format!("/api/v1/media/{media_id}/like"), Some(&member.token), json!({}))
        .await;
    let (_, member_comment) = app
        .post(&comments_uri, Some(&member.token), json!({ "content": "Beautiful" }))
        .await;
    app.post(
        &comments_uri,
        Some(&alice.token),
        json!({ "content": "Agreed", "parent_id": member_comment["id"] }),
    )
    .await;
    app.post(&comments_uri, Some(&alice.token), json!({ "content": "Thank you" }))
        .await;

    // 포럼: alice 글에 member 답글과 좋아요, member 글에 alice 답글
    let (_, forum) = app
        .post("/api/v1/forums", Some(&admin.token), json!({ "title": "Fellowship" }))
        .await;
    let forum_id = forum["id"].as_str().unwrap().to_string();
    let posts_uri = format!("/api/v1/forums/{forum_id}/posts");
    let (_, alice_post) = app
        .post(&posts_uri, Some(&alice.token), json!({ "content": "Welcome all" }))
        .await;
    let alice_post_id = alice_post["id"].as_str().unwrap().to_string();
    app.post(
        &posts_uri,
        Some(&member.token),
        json!({ "content": "Glad to be here", "parent_id": alice_post_id }),
    )
    .await;
    app.post(&format!("/api/v1/forum-posts/{alice_post_id}/like"), Some(&member.token), json!({}))
        .await;
    let (_, member_post) = app
        .post(&posts_uri, Some(&member.token), json!({ "content": "Prayer meeting?" }))
        .await;
    app.post(
        &posts_uri,
        Some(&alice.token),
        json!({ "content": "Count me in", "parent_id": member_post["id"] }),
    )
    .await;

    // 투표와 기도
    let (_, poll) = app
        .post(
            "/api/v1/polls",
            Some(&admin.token),
            json!({ "question": "Time?", "options": ["Morning", "Evening"] }),
        )
        .await;
    let poll_id = poll["id"].as_str().unwrap().to_string();
    let morning = poll["options"][0]["id"].as_str().unwrap().to_string();
    let vote_uri = format!("/api/v1/polls/{poll_id}/vote");
    app.post(&vote_uri, Some(&member.token), json!({ "option_ids": [morning] })).await;
    app.post(&vote_uri, Some(&alice.token), json!({ "option_ids": [morning] })).await;

    let (_, prayer) = app
        .post("/api/v1/prayers", Some(&alice.token), json!({ "content": "For my family" }))
        .await;
    let prayer_id = prayer["id"].as_str().unwrap().to_string();
    app.post(&format!("/api/v1/prayers/{prayer_id}/pray"), Some(&member.token), json!({}))
        .await;

    let (_, media) = app.get(&format!("/api/v1/media/{media_id}"), None).await;
    assert_eq!(media["likes_count"], 1);
    assert_eq!(media["comments_count"], 3);
    let (_, forum) = app.get(&format!("/api/v1/forums/{forum_id}"), None).await;
    assert_eq!(forum["posts_count"], 4);

    let (status, _) = app
        .delete(&format!("/api/v1/admin/users/{}", member.id), Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, media) = app.get(&format!("/api/v1/media/{media_id}"), None).await;
    assert_eq!(media["likes_count"], 0);
    assert_eq!(media["comments_count"], 1);
    let (_, comments) = app.get(&comments_uri, None).await;
    assert_eq!(comments["pagination"]["total"], 1);

    let (_, forum) = app.get(&format!("/api/v1/forums/{forum_id}"), None).await;
    assert_eq!(forum["posts_count"], 1);
    let (_, post) = app.get(&format!("/api/v1/forum-posts/{alice_post_id}"), None).await;
    assert_eq!(post["replies_count"], 0);
    assert_eq!(post["likes_count"], 0);

    let (_, poll) = app.get(&format!("/api/v1/polls/{poll_id}"), None).await;
    assert_eq!(poll["total_votes"], 1);
    assert_eq!(poll["options"][0]["votes_count"], 1);
    assert_eq!(poll["options"][0]["percentage"], 100.0);

    let (_, prayer) = app.get(&format!("/api/v1/prayers/{prayer_id}"), None).await;
    assert_eq!(prayer["prayer_count"], 0);
}

#[tokio::test]
async fn refresh_token_rotates_only_once_under_concurrency() {
    let app = TestApp::new().await;
    let user = app.register("barnabas").await;
    let body = json!({ "refresh_token": user.refresh_token });

    let (first, second) = tokio::join!(
        app.post("/api/v1/auth/refresh", None, body.clone()),
        app.post("/api/v1/auth/refresh", None, body.clone()),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort_by_key(|s| s.as_u16());
    assert_eq!(statuses, [StatusCode::OK, StatusCode::UNAUTHORIZED]);
}

// ── 가시성 ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn forum_post_detail_reports_liked() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let reader = app.register("reader").await;

    let (_, forum) = app
        .post("/api/v1/forums", Some(&admin.token), json!({ "title": "Testimonies" }))
        .await;
    let (_, post) = app
        .post(
            &format!("/api/v1/forums/{}/posts", forum["id"].as_str().unwrap()),
            Some(&admin.token),
            json!({ "content": "God is faithful" }),
        )
        .await;
    let post_uri = format!("/api/v1/forum-posts/{}", post["id"].as_str().unwrap());

    let (_, detail) = app.get(&post_uri, Some(&reader.token)).await;
    assert_eq!(detail["liked"], false);

    app.post(&format!("{post_uri}/like"), Some(&reader.token), json!({})).await;
    let (_, detail) = app.get(&post_uri, Some(&reader.token)).await;
    assert_eq!(detail["liked"], true);
    assert_eq!(detail["likes_count"], 1);

    let (_, anonymous) = app.get(&post_uri, None).await;
    assert!(anonymous.get("liked").is_none());
}

#[tokio::test]
async fn unpublished_media_comments_are_hidden() {
    let app = TestApp::new().await;
    let admin = app.register("admin").await;
    let user = app.register("curious").await;
    let media_id = app.create_media(&admin, "Upcoming Series").await;
    let comments_uri = format!("/api/v1/media/{media_id}/comments");

    app.post(&comments_uri, Some(&admin.token), json!({ "content": "Draft notes" }))
        .await;
    app.patch(
        &format!("/api/v1/media/{media_id}"),
        Some(&admin.token),
        json!({ "is_published": false }),
    )
    .await;

    let (status, _) = app.get(&comments_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&comments_uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get(&comments_uri, Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn replies_to_hidden_posts_are_rejected() {
    let mut config = Config::for_tests();
    config.auto_approve_content = false;
    let app = TestApp::with_config(config).await;
    let admin = app.register("admin").await;
    let author = app.register("author").await;
    let other = app.register("other").await;

    let (_, forum) = app
        .post("/api/v1/forums", Some(&admin.token), json!({ "title": "Questions" }))
        .await;
    let posts_uri = format!("/api/v1/forums/{}/posts", forum["id"].as_str().unwrap());
    let (_, pending) = app
        .post(&posts_uri, Some(&author.token), json!({ "content": "Awaiting review" }))
        .await;
    assert_eq!(pending["moderation_status"], "pending");

    let (status, _) = app
        .post(
            &posts_uri,
            Some(&other.token),
            json!({ "content": "Sneaky reply", "parent_id": pending["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, count) = app.get("/api/v1/notifications/unread-count", Some(&author.token)).await;
    assert_eq!(count["count"], 0);

    // 작성자와 검토 권한자는 답글을 달 수 있습니다.
    let (status, _) = app
        .post(
            &posts_uri,
            Some(&author.token),
            json!({ "content": "Adding detail", "parent_id": pending["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post(
            &posts_uri,
            Some(&admin.token),
            json!({ "content": "Reviewing now", "parent_id": pending["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

// ── 푸시 토큰 정리 ───────────────────────────────────────────────────────────

/// `stale-`로 시작하는 토큰은 무효라고 응답하는 전송기
struct StaleTokenSender;

#[async_trait]
impl PushSender for StaleTokenSender {
    async fn send(
        &self,
        token: &str,
        _platform: Platform,
        _message: &PushMessage,
    ) -> Result<(), PushError> {
        if token.starts_with("stale-") {
            Err(PushError::InvalidToken)
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn invalid_device_tokens_are_removed_after_notification() {
    let app = TestApp::with_push_sender(Arc::new(StaleTokenSender)).await;
    let admin = app.register("admin").await;
    let user = app.register("traveler").await;

    for token in ["stale-phone", "fresh-tablet"] {
        let (status, _) = app
            .post(
                "/api/v1/push/devices",
                Some(&user.token),
                json!({ "token": token, "platform": "ios" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .post(
            "/api/v1/admin/notifications/broadcast",
            Some(&admin.token),
            json!({ "title": "Retreat", "body": "Registration is open" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, devices) = app.get("/api/v1/push/devices", Some(&user.token)).await;
    let tokens: Vec<&str> = devices["devices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["token"].as_str().unwrap())
        .collect();
    assert_eq!(tokens, vec!["fresh-tablet"]);

    let (_, report) = app
        .post(
            "/api/v1/admin/push/send",
            Some(&admin.token),
            json!({ "user_id": user.id, "title": "Reminder", "body": "See you soon" }),
        )
        .await;
    assert_eq!(report["sent"], 1);
    assert_eq!(report["failed"], 0);
}
