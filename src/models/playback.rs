//! # 재생 세션 모델 정의
//!
//! 사용자가 미디어를 얼마나 들었는지 추적하기 위한 구조체들입니다.
//!
//! ## 세션 흐름
//! 1. 재생 시작 → `StartPlaybackRequest`로 세션 생성 (미디어의 plays_count 증가)
//! 2. 재생 중 주기적으로 `UpdatePlaybackRequest`로 위치 저장
//! 3. 재생 종료 → `EndPlaybackRequest`로 세션 종료
//! 4. 다음에 다시 열면 `resume`으로 마지막 위치부터 이어 듣기

use serde::{Deserialize, Serialize};

/// 재생 세션 엔티티 (DB의 `playback_sessions` 테이블 한 행)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlaybackSession {
    pub id: String,
    pub user_id: String,
    pub media_id: String,
    /// 재생 기기 (예: "iPhone", "web")
    pub device: Option<String>,
    pub position_seconds: i64,
    pub duration_seconds: Option<i64>,
    /// 끝까지(95% 이상) 들었는지
    pub completed: bool,
    pub started_at: String,
    pub updated_at: String,
    /// None이면 아직 진행 중인 세션
    pub ended_at: Option<String>,
}

/// 재생 기록 목록 항목 (미디어 제목 포함)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlaybackHistoryItem {
    pub id: String,
    pub media_id: String,
    pub media_title: String,
    pub position_seconds: i64,
    pub duration_seconds: Option<i64>,
    pub completed: bool,
    pub started_at: String,
    pub updated_at: String,
    pub ended_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartPlaybackRequest {
    pub media_id: String,
    pub position_seconds: Option<i64>,
    pub device: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaybackRequest {
    pub position_seconds: i64,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndPlaybackRequest {
    pub position_seconds: Option<i64>,
}

/// 이어 듣기 위치 응답
#[derive(Debug, Serialize)]
pub struct ResumePosition {
    pub media_id: String,
    pub position_seconds: i64,
    pub completed: bool,
}

/// 전체 길이의 이 비율 이상 들으면 "완료"로 봅니다.
pub const COMPLETION_RATIO: f64 = 0.95;

/// 현재 위치와 전체 길이로 완료 여부를 판단합니다.
/// 길이를 모르거나 0 이하이면 완료로 보지 않습니다.
pub fn is_completed(position_seconds: i64, duration_seconds: Option<i64>) -> bool {
    match duration_seconds {
        Some(duration) if duration > 0 => {
            position_seconds as f64 >= duration as f64 * COMPLETION_RATIO
        }
        _ => false,
    }
}
