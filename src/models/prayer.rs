//! # 기도 요청(Prayer Post) 모델
//!
//! 사용자가 올리는 기도 제목입니다. 익명(`is_anonymous`)으로 올릴 수 있으며,
//! 다른 사용자는 "함께 기도했어요"(pray)로 응답합니다.
//! `prayer_count`는 이 응답 수를 담는 비정규화 카운터입니다.

use serde::{Deserialize, Serialize};

use super::ModerationStatus;

/// DB 조회 결과 그대로의 기도 요청 (작성자 정보 포함)
#[derive(Debug, Clone, Deserialize, sqlx::FromRow)]
pub struct PrayerPost {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub title: Option<String>,
    pub content: String,
    pub category: Option<String>,
    pub is_anonymous: bool,
    pub moderation_status: ModerationStatus,
    pub prayer_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// API 응답용 기도 요청
///
/// 익명 글은 작성자 본인이나 검토 권한자가 아니면 작성자 정보를 가립니다.
#[derive(Debug, Clone, Serialize)]
pub struct PrayerView {
    pub id: String,
    pub author_id: Option<String>,
    pub author_name: String,
    pub title: Option<String>,
    pub content: String,
    pub category: Option<String>,
    pub is_anonymous: bool,
    pub moderation_status: ModerationStatus,
    pub prayer_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prayed: Option<bool>,
    pub created_at: String,
    pub updated_at: String,
}

pub const ANONYMOUS_NAME: &str = "Anonymous";

impl PrayerPost {
    /// 보는 사람(`viewer_id`, `viewer_can_moderate`)에 맞춰 응답 형태로 변환합니다.
    pub fn into_view(self, viewer_id: Option<&str>, viewer_can_moderate: bool) -> PrayerView {
        let is_author = viewer_id == Some(self.author_id.as_str());
        let reveal = !self.is_anonymous || is_author || viewer_can_moderate;

        let (author_id, author_name) = if reveal {
            (Some(self.author_id), self.author_username)
        } else {
            (None, ANONYMOUS_NAME.to_string())
        };

        PrayerView {
            id: self.id,
            author_id,
            author_name,
            title: self.title,
            content: self.content,
            category: self.category,
            is_anonymous: self.is_anonymous,
            moderation_status: self.moderation_status,
            prayer_count: self.prayer_count,
            prayed: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePrayerRequest {
    pub title: Option<String>,
    pub content: String,
    pub category: Option<String>,
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePrayerRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PrayerFilter {
    pub category: Option<String>,
    #[serde(default)]
    pub mine: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anonymous_prayer() -> PrayerPost {
        PrayerPost {
            id: "pr1".into(),
            author_id: "u1".into(),
            author_username: "grace".into(),
            title: None,
            content: "Please pray for my family".into(),
            category: None,
            is_anonymous: true,
            moderation_status: ModerationStatus::Approved,
            prayer_count: 3,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn anonymous_author_hidden_from_strangers() {
        let view = anonymous_prayer().into_view(Some("u2"), false);
        assert_eq!(view.author_id, None);
        assert_eq!(view.author_name, ANONYMOUS_NAME);

        let view = anonymous_prayer().into_view(None, false);
        assert_eq!(view.author_id, None);
    }

    #[test]
    fn anonymous_author_visible_to_self_and_moderators() {
        let own = anonymous_prayer().into_view(Some("u1"), false);
        assert_eq!(own.author_id.as_deref(), Some("u1"));
        assert_eq!(own.author_name, "grace");

        let moderated = anonymous_prayer().into_view(Some("mod"), true);
        assert_eq!(moderated.author_name, "grace");
    }
}
