//! # 푸시 알림 전송
//!
//! 실제 전송(FCM/APNs)은 `PushSender` 트레이트 뒤에 숨깁니다.
//! 기본 구현 `LogPushSender`는 전송 내용을 로그로만 남기며,
//! 운영 환경에서는 외부 제공자를 감싼 구현으로 `AppState::with_push_sender`에 교체합니다.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::{DeviceToken, Platform};

#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum PushError {
    /// 제공자가 토큰을 더 이상 유효하지 않다고 응답함. 토큰을 삭제해야 합니다.
    #[error("device token is no longer valid")]
    InvalidToken,

    #[error("push provider error: {0}")]
    Provider(String),
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        token: &str,
        platform: Platform,
        message: &PushMessage,
    ) -> Result<(), PushError>;
}

/// 전송 내용을 로그로만 남기는 기본 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(
        &self,
        token: &str,
        platform: Platform,
        message: &PushMessage,
    ) -> Result<(), PushError> {
        tracing::info!(
            platform = ?platform,
            token_prefix = %token.chars().take(8).collect::<String>(),
            title = %message.title,
            "Push notification dispatched"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    #[serde(skip)]
    pub invalid_tokens: Vec<String>,
}

/// 기기 목록 전체에 같은 메시지를 보냅니다.
///
/// 개별 기기 실패는 집계만 하고 중단하지 않습니다.
pub async fn deliver(
    sender: &dyn PushSender,
    devices: &[DeviceToken],
    message: &PushMessage,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for device in devices {
        match sender.send(&device.token, device.platform, message).await {
            Ok(()) => report.sent += 1,
            Err(PushError::InvalidToken) => {
                report.failed += 1;
                report.invalid_tokens.push(device.token.clone());
            }
            Err(e) => {
                tracing::warn!("Push to device {} failed: {}", device.id, e);
                report.failed += 1;
            }
        }
    }

    report
}
