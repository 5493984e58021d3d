use crate::error::AppError;
use crate::models::{NewNotification, Notification};
use crate::services::pagination::Page;
use sqlx::types::Json;
use sqlx::SqlitePool;

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, data, is_read, created_at";

pub async fn insert(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    new: &NewNotification,
) -> Result<Notification, AppError> {
    let notification = sqlx::query_as::<_, Notification>(&format!(
        r#"
        INSERT INTO notifications (id, user_id, kind, title, body, data)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(&new.kind)
    .bind(&new.title)
    .bind(&new.body)
    .bind(new.data.clone().map(Json))
    .fetch_one(pool)
    .await?;

    Ok(notification)
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    unread_only: bool,
    page: Page,
) -> Result<(Vec<Notification>, i64), AppError> {
    let unread_clause = if unread_only { " AND is_read = 0" } else { "" };

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?{unread_clause}"
    ))
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ?{unread_clause} \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    ))
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((items, total))
}

pub async fn unread_count(pool: &SqlitePool, user_id: &str) -> Result<i64, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// 본인 알림만 읽음 처리합니다. 다른 사람의 알림이거나 없으면 None.
pub async fn mark_read(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Option<Notification>, AppError> {
    let notification = sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ? RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(notification)
}

pub async fn mark_all_read(pool: &SqlitePool, user_id: &str) -> Result<u64, AppError> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, id: &str, user_id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
