//! # 애플리케이션 공유 상태
//!
//! 모든 핸들러가 `State<AppState>`로 받아 쓰는 의존성 묶음입니다.
//! `Clone`이 싸도록 무거운 값은 모두 `Arc` 또는 내부적으로 Arc인 타입으로 둡니다.

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::push::{LogPushSender, PushSender};
use crate::services::realtime::RealtimeHub;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub rate_limiter: Arc<RateLimiter>,
    pub realtime: RealtimeHub,
    pub push: Arc<dyn PushSender>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let rate_limiter = RateLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        );

        Self {
            pool,
            config: Arc::new(config),
            rate_limiter: Arc::new(rate_limiter),
            realtime: RealtimeHub::new(),
            push: Arc::new(LogPushSender),
        }
    }

    /// 기본 로그 전송기 대신 다른 푸시 구현을 사용합니다.
    pub fn with_push_sender(mut self, sender: Arc<dyn PushSender>) -> Self {
        self.push = sender;
        self
    }
}
