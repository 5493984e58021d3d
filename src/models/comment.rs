use serde::{Deserialize, Serialize};

use super::ModerationStatus;

/// 미디어에 달린 댓글. `author_username`은 users 테이블과 JOIN해서 채웁니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub media_id: String,
    pub author_id: String,
    pub author_username: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub moderation_status: ModerationStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}
