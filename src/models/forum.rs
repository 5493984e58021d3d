//! # 포럼 모델
//!
//! - `Forum`: 주제별 게시판 (예: "주일 말씀 나눔", "청년부")
//! - `ForumPost`: 포럼에 작성된 글. `parent_id`가 있으면 다른 글에 대한 답글입니다.
//!
//! `posts_count`, `likes_count`, `replies_count`는 승인된(approved) 글만 세는
//! 비정규화 카운터입니다.

use serde::{Deserialize, Serialize};

use super::ModerationStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Forum {
    pub id: String,
    pub title: String,
    /// URL 친화적인 식별자 (예: "sunday-sermon")
    pub slug: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_by: Option<String>,
    pub is_active: bool,
    pub posts_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ForumPost {
    pub id: String,
    pub forum_id: String,
    pub author_id: String,
    pub author_username: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub moderation_status: ModerationStatus,
    pub likes_count: i64,
    pub replies_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// 글 단건 조회 응답. 로그인한 사용자에게는 좋아요 여부를 함께 보여줍니다.
#[derive(Debug, Serialize)]
pub struct ForumPostDetail {
    #[serde(flatten)]
    pub post: ForumPost,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateForumRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateForumRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForumFilter {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateForumPostRequest {
    pub content: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateForumPostRequest {
    pub content: String,
}
