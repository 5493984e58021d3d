use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub media_id: String,
    pub created_at: String,
}

/// 북마크 목록 항목: 북마크 정보와 미디어 요약을 함께 담습니다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BookmarkedMedia {
    pub bookmark_id: String,
    pub bookmarked_at: String,
    pub media_id: String,
    pub title: String,
    pub media_type: super::MediaType,
    pub category: Option<String>,
    pub speaker: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookmarkRequest {
    pub media_id: String,
}
