use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Web,
}

/// 푸시 알림을 받을 기기 토큰 (FCM/APNs 토큰)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceToken {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub platform: Platform,
    pub created_at: String,
    pub last_seen_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub token: String,
    pub platform: Platform,
}

#[derive(Debug, Deserialize)]
pub struct SendPushRequest {
    pub user_id: String,
    pub title: String,
    pub body: String,
}
