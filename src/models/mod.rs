//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! 각 하위 모듈은 특정 도메인의 데이터 타입을 담당합니다:
//! - `common`: 권한(Role), 검토 상태(ModerationStatus) 등 공통 열거형
//! - `user`: 사용자와 인증 요청/응답
//! - `media`, `comment`, `bookmark`: 미디어 라이브러리와 상호작용
//! - `forum`, `poll`, `prayer`: 커뮤니티 콘텐츠
//! - `moderation`: 검토 대기열 항목과 상태 변경 요청
//! - `playback`: 재생 세션
//! - `notification`, `device`: 알림함과 푸시 기기 토큰
//! - `search`: 통합 검색 요청/결과
//!
//! `pub use X::*;`로 재공개하므로 `crate::models::Media`처럼 짧게 접근할 수 있습니다.

pub mod bookmark;
pub mod comment;
pub mod common;
pub mod device;
pub mod forum;
pub mod media;
pub mod moderation;
pub mod notification;
pub mod playback;
pub mod poll;
pub mod prayer;
pub mod search;
pub mod user;

pub use bookmark::*;
pub use comment::*;
pub use common::*;
pub use device::*;
pub use forum::*;
pub use media::*;
pub use moderation::*;
pub use notification::*;
pub use playback::*;
pub use poll::*;
pub use prayer::*;
pub use search::*;
pub use user::*;
