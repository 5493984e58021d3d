//! # 댓글 쿼리
//!
//! `media.comments_count`는 승인된 댓글(답글 포함) 수이며, 댓글 행을 바꾸는 트랜잭션 안에서 갱신합니다.

use crate::error::AppError;
use crate::models::{Comment, ModerationStatus};
use crate::services::pagination::Page;
use sqlx::SqlitePool;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.media_id, c.author_id, u.username AS author_username, c.parent_id,
           c.content, c.moderation_status, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// 미디어의 승인된 댓글 (작성순)
pub async fn list_for_media(
    pool: &SqlitePool,
    media_id: &str,
    page: Page,
) -> Result<(Vec<Comment>, i64), AppError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM comments WHERE media_id = ? AND moderation_status = 'approved'",
    )
    .bind(media_id)
    .fetch_one(pool)
    .await?;

    let comments = sqlx::query_as::<_, Comment>(&format!(
        "{COMMENT_SELECT} WHERE c.media_id = ? AND c.moderation_status = 'approved' \
         ORDER BY c.created_at ASC, c.id ASC LIMIT ? OFFSET ?"
    ))
    .bind(media_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((comments, total))
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Comment>, AppError> {
    let comment = sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(comment)
}

pub async fn create_comment(
    pool: &SqlitePool,
    id: &str,
    media_id: &str,
    author_id: &str,
    parent_id: Option<&str>,
    content: &str,
    status: ModerationStatus,
) -> Result<Comment, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO comments (id, media_id, author_id, parent_id, content, moderation_status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(media_id)
    .bind(author_id)
    .bind(parent_id)
    .bind(content)
    .bind(status)
    .execute(&mut *tx)
    .await?;

    if status.is_visible() {
        sqlx::query("UPDATE media SET comments_count = comments_count + 1 WHERE id = ?")
            .bind(media_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created comment".to_string()))
}

pub async fn update_content(
    pool: &SqlitePool,
    id: &str,
    content: &str,
) -> Result<Option<Comment>, AppError> {
    let result = sqlx::query(
        "UPDATE comments SET content = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(content)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// 댓글과 하위 답글(CASCADE)을 삭제하고, 하위 트리의 승인된 댓글 수만큼
/// 미디어의 `comments_count`를 줄입니다.
pub async fn delete_comment(pool: &SqlitePool, comment: &Comment) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let approved_in_subtree: i64 = sqlx::query_scalar(
        r#"
        WITH RECURSIVE subtree(id) AS (
            SELECT id FROM comments WHERE id = ?
            UNION ALL
            SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
        )
        SELECT COUNT(*) FROM comments
        WHERE id IN (SELECT id FROM subtree) AND moderation_status = 'approved'
        "#,
    )
    .bind(&comment.id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(&comment.id)
        .execute(&mut *tx)
        .await?;

    if approved_in_subtree > 0 {
        sqlx::query("UPDATE media SET comments_count = MAX(comments_count - ?, 0) WHERE id = ?")
            .bind(approved_in_subtree)
            .bind(&comment.media_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
