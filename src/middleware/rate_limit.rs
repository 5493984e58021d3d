//! # 요청 빈도 제한 (고정 윈도우)
//!
//! 키(예: `"login:alice"`, `"content:<user_id>"`)마다 `(요청 수, 윈도우 시작 시각)`을 `DashMap`에 저장합니다.
//! 윈도우가 지나면 카운터를 0부터 다시 셉니다.
//! 프로세스 메모리에만 있으므로 재시작하면 초기화됩니다.
//!
//! 키에는 사용자 입력(사용자명)이 들어가므로, 항목 수가 `SWEEP_THRESHOLD`를 넘으면
//! 윈도우가 끝난 항목을 한 번에 정리합니다.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::error::AppError;

const SWEEP_THRESHOLD: usize = 10_000;

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    sweep_threshold: usize,
    buckets: DashMap<String, (u32, Instant)>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            sweep_threshold: SWEEP_THRESHOLD,
            buckets: DashMap::new(),
        }
    }

    /// 요청 한 번을 기록하고, 한도를 넘었으면 `TooManyRequests`를 반환합니다.
    pub fn check(&self, key: &str) -> Result<(), AppError> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), AppError> {
        // entry 참조를 잡기 전에 정리해야 샤드 락이 겹치지 않습니다.
        if self.buckets.len() >= self.sweep_threshold {
            self.sweep(now);
        }

        let mut entry = self.buckets.entry(key.to_string()).or_insert((0, now));
        let (count, started) = entry.value_mut();

        if now.duration_since(*started) >= self.window {
            *count = 0;
            *started = now;
        }

        if *count >= self.max_requests {
            tracing::warn!("Rate limit exceeded for {}", key);
            return Err(AppError::TooManyRequests);
        }

        *count += 1;
        Ok(())
    }

    /// 윈도우가 끝난 항목을 지웁니다.
    fn sweep(&self, now: Instant) {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, (_, started)| now.duration_since(*started) < self.window);
        tracing::debug!("Rate limiter swept {} expired keys", before.saturating_sub(self.buckets.len()));
    }
}
