//! 요청 전처리: JWT 인증 extractor와 요청 빈도 제한

pub mod auth;
pub mod rate_limit;
