use serde::{Deserialize, Serialize};

use super::{ContentKind, ModerationStatus};

/// 검토 대기열의 한 항목. 댓글/포럼 글/기도 요청을 같은 형태로 보여줍니다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ModerationItem {
    pub kind: ContentKind,
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub moderation_status: ModerationStatus,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModerationQueueFilter {
    pub kind: Option<ContentKind>,
    /// 기본값: pending
    pub status: Option<ModerationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateModerationRequest {
    pub status: ModerationStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FlagRequest {
    pub reason: Option<String>,
}

/// 상태 변경 결과
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub author_id: String,
    pub previous: ModerationStatus,
    pub current: ModerationStatus,
}

impl StatusChange {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}
