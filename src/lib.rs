//! # Fellowship API
//!
//! 신앙 공동체 앱의 백엔드입니다. 미디어 라이브러리, 포럼, 투표, 기도 요청,
//! 알림과 푸시, 통합 검색을 JSON API로 제공합니다.
//!
//! 요청 흐름: `routes/` (HTTP 어댑터) → `db/` · `services/` → SQLite

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
