use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    /// 알림 종류 (예: "comment_reply", "prayer_support", "moderation", "announcement")
    pub kind: String,
    pub title: String,
    pub body: String,
    /// 클라이언트가 해당 화면으로 이동할 때 쓰는 부가 데이터
    pub data: Option<Json<Value>>,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub title: String,
    pub body: String,
    pub kind: Option<String>,
}

/// 새 알림을 만들 때 쓰는 값 묶음
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: String,
    pub title: String,
    pub body: String,
    pub data: Option<Value>,
}

impl NewNotification {
    pub fn new(kind: &str, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            title: title.into(),
            body: body.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
