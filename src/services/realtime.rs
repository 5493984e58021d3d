//! # 실시간 이벤트 허브
//!
//! `tokio::sync::broadcast` 채널 하나로 모든 WebSocket 연결에 이벤트를 뿌립니다.
//! 각 이벤트는 특정 사용자(`target = Some(user_id)`) 또는 전체(`target = None`)를 대상으로 하며,
//! 수신 측(routes/ws.rs)에서 자기 대상이 아닌 이벤트는 걸러냅니다.
//!
//! 느린 수신자는 밀린 이벤트를 건너뜁니다 (`RecvError::Lagged`).

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct RealtimeEvent {
    #[serde(skip)]
    pub target: Option<String>,
    pub event: String,
    pub payload: Value,
}

impl RealtimeEvent {
    /// 이 이벤트를 `user_id`에게 보내야 하는지
    pub fn is_for(&self, user_id: &str) -> bool {
        match &self.target {
            Some(target) => target == user_id,
            None => true,
        }
    }
}

#[derive(Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<RealtimeEvent>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.tx.subscribe()
    }

    pub fn publish_to(&self, user_id: &str, event: &str, payload: Value) {
        self.publish(RealtimeEvent {
            target: Some(user_id.to_string()),
            event: event.to_string(),
            payload,
        });
    }

    pub fn publish_all(&self, event: &str, payload: Value) {
        self.publish(RealtimeEvent {
            target: None,
            event: event.to_string(),
            payload,
        });
    }

    fn publish(&self, event: RealtimeEvent) {
        // 구독자가 없으면 send가 Err를 돌려주지만 정상 상황입니다.
        if let Ok(receivers) = self.tx.send(event) {
            tracing::debug!("Realtime event delivered to {} subscriber(s)", receivers);
        }
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
