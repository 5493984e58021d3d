//! # 서비스 계층
//!
//! 라우트 핸들러와 DB 접근 계층 사이에서 재사용되는 로직을 모아둔 모듈입니다.
//! - `pagination`: 목록 API 공통 페이지 계산
//! - `ranking`: 통합 검색 점수와 스니펫
//! - `validation`, `password`: 입력 검증과 비밀번호 해싱
//! - `realtime`, `push`, `notify`: 실시간 이벤트, 푸시 전송, 알림 발송

pub mod notify;
pub mod pagination;
pub mod password;
pub mod push;
pub mod ranking;
pub mod realtime;
pub mod validation;
