use crate::error::AppError;
use crate::models::{Bookmark, BookmarkedMedia};
use crate::services::pagination::Page;
use sqlx::SqlitePool;

/// 사용자의 북마크 목록 (미디어 요약 포함, 최근 북마크 순)
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    page: Page,
) -> Result<(Vec<BookmarkedMedia>, i64), AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookmarks WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, BookmarkedMedia>(
        r#"
        SELECT b.id AS bookmark_id, b.created_at AS bookmarked_at,
               m.id AS media_id, m.title, m.media_type, m.category, m.speaker,
               m.thumbnail_url, m.duration_seconds
        FROM bookmarks b
        JOIN media m ON m.id = b.media_id
        WHERE b.user_id = ?
        ORDER BY b.created_at DESC, b.id DESC
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

pub async fn find(
    pool: &SqlitePool,
    user_id: &str,
    media_id: &str,
) -> Result<Option<Bookmark>, AppError> {
    let bookmark = sqlx::query_as::<_, Bookmark>(
        "SELECT id, user_id, media_id, created_at FROM bookmarks WHERE user_id = ? AND media_id = ?",
    )
    .bind(user_id)
    .bind(media_id)
    .fetch_optional(pool)
    .await?;

    Ok(bookmark)
}

/// 북마크를 추가합니다. 이미 있으면 기존 것을 그대로 돌려주며, 두 번째 값이 false입니다.
pub async fn create_bookmark(
    pool: &SqlitePool,
    user_id: &str,
    media_id: &str,
) -> Result<(Bookmark, bool), AppError> {
    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO bookmarks (id, user_id, media_id) VALUES (?, ?, ?)",
    )
    .bind(super::new_id())
    .bind(user_id)
    .bind(media_id)
    .execute(pool)
    .await?
    .rows_affected();

    let bookmark = find(pool, user_id, media_id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve bookmark".to_string()))?;

    Ok((bookmark, inserted > 0))
}

pub async fn delete_bookmark(pool: &SqlitePool, user_id: &str, media_id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND media_id = ?")
        .bind(user_id)
        .bind(media_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
