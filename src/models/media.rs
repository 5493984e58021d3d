//! # 미디어(오디오/영상) 라이브러리 모델
//!
//! 설교, 찬양, 묵상 오디오 같은 미디어 항목과 그에 대한
//! 좋아요/공유 상호작용(interaction)을 표현합니다.
//!
//! `likes_count`, `comments_count`, `shares_count`, `plays_count`는
//! 상호작용 테이블에서 매번 COUNT하지 않도록 미리 계산해 둔 **비정규화 카운터**입니다.
//! 상호작용 행을 추가/삭제하는 같은 트랜잭션 안에서 함께 갱신됩니다.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Video,
}

/// 미디어 엔티티 (DB의 `media` 테이블 한 행)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Media {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub media_type: MediaType,
    pub category: Option<String>,
    /// 설교자 또는 아티스트
    pub speaker: Option<String>,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub uploaded_by: Option<String>,
    pub is_published: bool,
    pub likes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
    pub plays_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// 상세 조회 응답. 로그인한 사용자에게는 본인의 좋아요/북마크 여부를 함께 보여줍니다.
#[derive(Debug, Serialize)]
pub struct MediaDetail {
    #[serde(flatten)]
    pub media: Media,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmarked: Option<bool>,
}

/// `POST /media` 요청 본문 (관리자 전용)
#[derive(Debug, Deserialize)]
pub struct CreateMediaRequest {
    pub title: String,
    pub description: Option<String>,
    pub media_type: MediaType,
    pub category: Option<String>,
    pub speaker: Option<String>,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub is_published: Option<bool>,
}

/// `PATCH /media/{id}` 요청 본문
///
/// PATCH는 부분 업데이트이므로 모든 필드가 Option입니다.
/// None인 필드는 변경하지 않습니다.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMediaRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub speaker: Option<String>,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub is_published: Option<bool>,
}

/// 정렬 기준
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSort {
    #[default]
    Newest,
    Popular,
    MostLiked,
}

impl MediaSort {
    /// ORDER BY 절. 사용자 입력이 아닌 고정 문자열만 반환하므로 SQL에 그대로 붙여도 안전합니다.
    pub fn order_clause(&self) -> &'static str {
        match self {
            MediaSort::Newest => "created_at DESC",
            MediaSort::Popular => "plays_count DESC, created_at DESC",
            MediaSort::MostLiked => "likes_count DESC, created_at DESC",
        }
    }
}

/// `GET /media` 필터 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct MediaFilter {
    pub category: Option<String>,
    pub media_type: Option<MediaType>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: MediaSort,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShareRequest {
    /// 공유 채널 (예: "kakao", "sms", "copy_link")
    pub channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes_count: i64,
}
