use crate::error::AppError;
use crate::models::{DeviceToken, Platform};
use sqlx::SqlitePool;

const DEVICE_COLUMNS: &str = "id, user_id, token, platform, created_at, last_seen_at";

/// 기기 토큰 등록 (upsert)
///
/// 같은 토큰이 다른 사용자에게 등록되어 있었다면 현재 사용자로 옮깁니다.
/// 한 기기에서 계정을 바꿔 로그인한 경우입니다.
pub async fn upsert(
    pool: &SqlitePool,
    user_id: &str,
    token: &str,
    platform: Platform,
) -> Result<DeviceToken, AppError> {
    let device = sqlx::query_as::<_, DeviceToken>(&format!(
        r#"
        INSERT INTO device_tokens (id, user_id, token, platform)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(token) DO UPDATE SET
            user_id = excluded.user_id,
            platform = excluded.platform,
            last_seen_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        RETURNING {DEVICE_COLUMNS}
        "#
    ))
    .bind(super::new_id())
    .bind(user_id)
    .bind(token)
    .bind(platform)
    .fetch_one(pool)
    .await?;

    Ok(device)
}

pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<DeviceToken>, AppError> {
    let devices = sqlx::query_as::<_, DeviceToken>(&format!(
        "SELECT {DEVICE_COLUMNS} FROM device_tokens WHERE user_id = ? ORDER BY last_seen_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(devices)
}

/// 본인 기기의 토큰만 삭제합니다.
pub async fn delete_for_user(pool: &SqlitePool, user_id: &str, token: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM device_tokens WHERE user_id = ? AND token = ?")
        .bind(user_id)
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 푸시 제공자가 무효라고 알려준 토큰 삭제
pub async fn delete_token(pool: &SqlitePool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM device_tokens WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}
