use crate::error::AppError;
use crate::models::{PlaybackHistoryItem, PlaybackSession};
use crate::services::pagination::Page;
use sqlx::SqlitePool;

const SESSION_COLUMNS: &str = "id, user_id, media_id, device, position_seconds, duration_seconds, \
                               completed, started_at, updated_at, ended_at";

/// 재생 세션을 시작합니다.
///
/// 같은 미디어에 대해 열려 있는 이전 세션은 먼저 종료하고, 미디어의 `plays_count`를 1 올립니다.
/// 세션의 전체 길이는 미디어의 `duration_seconds`에서 가져옵니다.
pub async fn start_session(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    media_id: &str,
    position_seconds: i64,
    device: Option<&str>,
) -> Result<PlaybackSession, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE playback_sessions
        SET ended_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE user_id = ? AND media_id = ? AND ended_at IS NULL
        "#,
    )
    .bind(user_id)
    .bind(media_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO playback_sessions (id, user_id, media_id, device, position_seconds, duration_seconds)
        VALUES (?, ?, ?, ?, ?, (SELECT duration_seconds FROM media WHERE id = ?))
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(media_id)
    .bind(device)
    .bind(position_seconds)
    .bind(media_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE media SET plays_count = plays_count + 1 WHERE id = ?")
        .bind(media_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    find_session(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created session".to_string()))
}

pub async fn find_session(pool: &SqlitePool, id: &str) -> Result<Option<PlaybackSession>, AppError> {
    let session = sqlx::query_as::<_, PlaybackSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM playback_sessions WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

pub async fn update_progress(
    pool: &SqlitePool,
    id: &str,
    position_seconds: i64,
    duration_seconds: Option<i64>,
    completed: bool,
) -> Result<Option<PlaybackSession>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE playback_sessions
        SET position_seconds = ?, duration_seconds = ?, completed = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(position_seconds)
    .bind(duration_seconds)
    .bind(completed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_session(pool, id).await
}

pub async fn end_session(
    pool: &SqlitePool,
    id: &str,
    position_seconds: i64,
    completed: bool,
) -> Result<Option<PlaybackSession>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE playback_sessions
        SET position_seconds = ?, completed = ?,
            ended_at = COALESCE(ended_at, strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(position_seconds)
    .bind(completed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_session(pool, id).await
}

/// 재생 기록 (최근 시작 순, 미디어 제목 포함)
pub async fn list_history(
    pool: &SqlitePool,
    user_id: &str,
    page: Page,
) -> Result<(Vec<PlaybackHistoryItem>, i64), AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM playback_sessions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, PlaybackHistoryItem>(
        r#"
        SELECT s.id, s.media_id, m.title AS media_title, s.position_seconds, s.duration_seconds,
               s.completed, s.started_at, s.updated_at, s.ended_at
        FROM playback_sessions s
        JOIN media m ON m.id = s.media_id
        WHERE s.user_id = ?
        ORDER BY s.started_at DESC, s.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((items, total))
}

/// 이어 듣기용: 해당 미디어의 가장 최근 세션
pub async fn latest_for_media(
    pool: &SqlitePool,
    user_id: &str,
    media_id: &str,
) -> Result<Option<PlaybackSession>, AppError> {
    let session = sqlx::query_as::<_, PlaybackSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM playback_sessions WHERE user_id = ? AND media_id = ? \
         ORDER BY updated_at DESC, id DESC LIMIT 1"
    ))
    .bind(user_id)
    .bind(media_id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}
