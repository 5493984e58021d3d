//! # 알림 발송
//!
//! 알림 한 건을 만들 때 세 가지를 함께 처리합니다:
//! 1. `notifications` 테이블에 저장 (알림함)
//! 2. 실시간 허브로 해당 사용자에게 이벤트 발행
//! 3. 사용자의 등록 기기 전체에 푸시 전송
//!
//! 푸시 실패는 로그만 남기고 요청을 실패시키지 않습니다.

use serde_json::json;

use crate::db::{self, devices as db_devices, notifications as db_notifications};
use crate::error::AppError;
use crate::models::{NewNotification, Notification};
use crate::services::push::{self, DeliveryReport, PushMessage};
use crate::state::AppState;

pub async fn notify(
    state: &AppState,
    user_id: &str,
    new: NewNotification,
) -> Result<Notification, AppError> {
    let id = db::new_id();
    let notification = db_notifications::insert(&state.pool, &id, user_id, &new).await?;

    state.realtime.publish_to(
        user_id,
        "notification",
        json!({
            "id": notification.id,
            "kind": notification.kind,
            "title": notification.title,
            "body": notification.body,
            "data": new.data,
        }),
    );

    let message = PushMessage {
        title: new.title,
        body: new.body,
        data: new.data,
    };
    push_to_user(state, user_id, &message).await;

    Ok(notification)
}

/// 부수 효과로 보내는 알림용. 실패해도 원래 요청은 성공해야 하므로 에러를 로그로만 남깁니다.
pub async fn notify_quietly(state: &AppState, user_id: &str, new: NewNotification) {
    let kind = new.kind.clone();
    if let Err(e) = notify(state, user_id, new).await {
        tracing::warn!("Failed to create {} notification for {}: {}", kind, user_id, e);
    }
}

/// 사용자의 모든 기기로 푸시를 보내고, 제공자가 무효라고 응답한 토큰은 삭제합니다.
pub async fn push_to_user(state: &AppState, user_id: &str, message: &PushMessage) -> DeliveryReport {
    let devices = match db_devices::list_for_user(&state.pool, user_id).await {
        Ok(devices) => devices,
        Err(e) => {
            tracing::warn!("Could not load devices for {}: {}", user_id, e);
            return DeliveryReport::default();
        }
    };
    if devices.is_empty() {
        return DeliveryReport::default();
    }

    let report = push::deliver(state.push.as_ref(), &devices, message).await;
    tracing::debug!(
        user_id,
        sent = report.sent,
        failed = report.failed,
        "Push delivery finished"
    );

    for token in &report.invalid_tokens {
        if let Err(e) = db_devices::delete_token(&state.pool, token).await {
            tracing::warn!("Failed to remove invalid device token: {}", e);
        }
    }

    report
}
