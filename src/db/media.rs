//! # 미디어 라이브러리 쿼리
//!
//! `media` 테이블 CRUD와 좋아요/공유 상호작용을 다룹니다.
//! 좋아요/공유는 `media_interactions`에 행을 추가하고, 같은 트랜잭션에서
//! 미디어의 비정규화 카운터를 함께 갱신합니다.

use crate::error::AppError;
use crate::models::*;
use crate::services::pagination::Page;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const MEDIA_COLUMNS: &str = "id, title, description, media_type, category, speaker, url, \
                             thumbnail_url, duration_seconds, uploaded_by, is_published, \
                             likes_count, comments_count, shares_count, plays_count, \
                             created_at, updated_at";

fn push_media_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    filter: &MediaFilter,
    include_unpublished: bool,
) {
    qb.push(" WHERE 1 = 1");
    if !include_unpublished {
        qb.push(" AND is_published = 1");
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    if let Some(media_type) = filter.media_type {
        qb.push(" AND media_type = ").push_bind(media_type);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = super::like_pattern(q);
        qb.push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR description LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR speaker LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// 미디어 목록. `include_unpublished`가 false면 공개된 항목만 반환합니다.
pub async fn list_media(
    pool: &SqlitePool,
    filter: &MediaFilter,
    include_unpublished: bool,
    page: Page,
) -> Result<(Vec<Media>, i64), AppError> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM media");
    push_media_filters(&mut count_qb, filter, include_unpublished);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {MEDIA_COLUMNS} FROM media"));
    push_media_filters(&mut qb, filter, include_unpublished);
    qb.push(" ORDER BY ")
        .push(filter.sort.order_clause())
        .push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = qb.build_query_as::<Media>().fetch_all(pool).await?;

    Ok((items, total))
}

/// 카테고리별 항목 수 (카테고리가 없는 항목은 제외)
pub async fn list_categories(
    pool: &SqlitePool,
    include_unpublished: bool,
) -> Result<Vec<CategoryCount>, AppError> {
    let sql = if include_unpublished {
        r#"
        SELECT category, COUNT(*) AS count
        FROM media
        WHERE category IS NOT NULL AND category != ''
        GROUP BY category
        ORDER BY category
        "#
    } else {
        r#"
        SELECT category, COUNT(*) AS count
        FROM media
        WHERE category IS NOT NULL AND category != '' AND is_published = 1
        GROUP BY category
        ORDER BY category
        "#
    };

    let categories = sqlx::query_as::<_, CategoryCount>(sql).fetch_all(pool).await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Media>, AppError> {
    let media = sqlx::query_as::<_, Media>(&format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(media)
}

pub async fn create_media(
    pool: &SqlitePool,
    id: &str,
    req: &CreateMediaRequest,
    uploaded_by: &str,
) -> Result<Media, AppError> {
    sqlx::query(
        r#"
        INSERT INTO media (id, title, description, media_type, category, speaker, url,
                           thumbnail_url, duration_seconds, uploaded_by, is_published)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(req.title.trim())
    .bind(&req.description)
    .bind(req.media_type)
    .bind(&req.category)
    .bind(&req.speaker)
    .bind(req.url.trim())
    .bind(&req.thumbnail_url)
    .bind(req.duration_seconds)
    .bind(uploaded_by)
    .bind(req.is_published.unwrap_or(true))
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created media".to_string()))
}

pub async fn update_media(
    pool: &SqlitePool,
    id: &str,
    req: &UpdateMediaRequest,
) -> Result<Option<Media>, AppError> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "UPDATE media SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
    );
    if let Some(title) = &req.title {
        qb.push(", title = ").push_bind(title.trim().to_string());
    }
    if let Some(description) = &req.description {
        qb.push(", description = ").push_bind(description.clone());
    }
    if let Some(category) = &req.category {
        qb.push(", category = ").push_bind(category.clone());
    }
    if let Some(speaker) = &req.speaker {
        qb.push(", speaker = ").push_bind(speaker.clone());
    }
    if let Some(url) = &req.url {
        qb.push(", url = ").push_bind(url.trim().to_string());
    }
    if let Some(thumbnail_url) = &req.thumbnail_url {
        qb.push(", thumbnail_url = ").push_bind(thumbnail_url.clone());
    }
    if let Some(duration) = req.duration_seconds {
        qb.push(", duration_seconds = ").push_bind(duration);
    }
    if let Some(is_published) = req.is_published {
        qb.push(", is_published = ").push_bind(is_published);
    }
    qb.push(" WHERE id = ").push_bind(id.to_string());

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

pub async fn delete_media(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM media WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_liked(pool: &SqlitePool, media_id: &str, user_id: &str) -> Result<bool, AppError> {
    let exists: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM media_interactions WHERE media_id = ? AND user_id = ? AND kind = 'like')",
    )
    .bind(media_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(exists != 0)
}

/// 좋아요. 이미 눌렀으면 아무것도 바꾸지 않고 현재 카운트를 반환합니다.
pub async fn like(pool: &SqlitePool, media_id: &str, user_id: &str) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT OR IGNORE INTO media_interactions (id, media_id, user_id, kind)
        VALUES (?, ?, ?, 'like')
        "#,
    )
    .bind(super::new_id())
    .bind(media_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if inserted > 0 {
        sqlx::query("UPDATE media SET likes_count = likes_count + 1 WHERE id = ?")
            .bind(media_id)
            .execute(&mut *tx)
            .await?;
    }

    let likes_count: i64 = sqlx::query_scalar("SELECT likes_count FROM media WHERE id = ?")
        .bind(media_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(likes_count)
}

/// 좋아요 취소. 누른 적이 없으면 아무것도 바꾸지 않습니다.
pub async fn unlike(pool: &SqlitePool, media_id: &str, user_id: &str) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query(
        "DELETE FROM media_interactions WHERE media_id = ? AND user_id = ? AND kind = 'like'",
    )
    .bind(media_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if removed > 0 {
        sqlx::query("UPDATE media SET likes_count = MAX(likes_count - 1, 0) WHERE id = ?")
            .bind(media_id)
            .execute(&mut *tx)
            .await?;
    }

    let likes_count: i64 = sqlx::query_scalar("SELECT likes_count FROM media WHERE id = ?")
        .bind(media_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(likes_count)
}

/// 공유 기록. 좋아요와 달리 같은 사용자가 여러 번 공유할 수 있습니다.
pub async fn share(
    pool: &SqlitePool,
    media_id: &str,
    user_id: &str,
    channel: Option<&str>,
) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO media_interactions (id, media_id, user_id, kind, channel)
        VALUES (?, ?, ?, 'share', ?)
        "#,
    )
    .bind(super::new_id())
    .bind(media_id)
    .bind(user_id)
    .bind(channel)
    .execute(&mut *tx)
    .await?;

    let shares_count: i64 = sqlx::query_scalar(
        "UPDATE media SET shares_count = shares_count + 1 WHERE id = ? RETURNING shares_count",
    )
    .bind(media_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(shares_count)
}
