//! # 공통 열거형(Enum) 모델
//!
//! 여러 리소스에서 함께 쓰는 상태값들을 정의합니다.
//! DB에는 모두 소문자/스네이크케이스 TEXT로 저장되며,
//! `sqlx::Type` derive 덕분에 쿼리 결과에서 바로 열거형으로 변환됩니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 사용자 권한 등급
///
/// `user < moderator < admin` 순으로 권한이 커집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// 콘텐츠 검토(승인/반려/삭제) 권한이 있는지
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(format!(
                "Invalid role: {}. Must be one of: user, moderator, admin",
                other
            )),
        }
    }
}

/// 사용자 작성 콘텐츠(댓글, 포럼 글, 기도 요청)의 검토 상태
///
/// ## 상태 흐름
/// ```text
/// pending ──승인──▶ approved ──신고──▶ under_review ──▶ approved / rejected
///    └────반려──▶ rejected
/// ```
/// 공개 목록에는 `approved` 상태만 노출됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
    UnderReview,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
            ModerationStatus::UnderReview => "under_review",
        }
    }

    /// 새 콘텐츠의 초기 상태. 자동 승인 설정에 따라 달라집니다.
    pub fn initial(auto_approve: bool) -> Self {
        if auto_approve {
            ModerationStatus::Approved
        } else {
            ModerationStatus::Pending
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, ModerationStatus::Approved)
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "rejected" => Ok(ModerationStatus::Rejected),
            "under_review" => Ok(ModerationStatus::UnderReview),
            other => Err(format!(
                "Invalid moderation status: {}. Must be one of: pending, approved, rejected, under_review",
                other
            )),
        }
    }
}

/// 검토 대상이 되는 콘텐츠 종류
///
/// URL 경로(`/admin/moderation/{kind}/{id}`)에서 그대로 역직렬화됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ContentKind {
    Comment,
    ForumPost,
    Prayer,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Comment => "comment",
            ContentKind::ForumPost => "forum_post",
            ContentKind::Prayer => "prayer",
        }
    }
}
