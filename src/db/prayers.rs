use std::collections::HashSet;

use crate::error::AppError;
use crate::models::*;
use crate::services::pagination::Page;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const PRAYER_SELECT: &str = r#"
    SELECT p.id, p.author_id, u.username AS author_username, p.title, p.content, p.category,
           p.is_anonymous, p.moderation_status, p.prayer_count, p.created_at, p.updated_at
    FROM prayer_posts p
    JOIN users u ON u.id = p.author_id
"#;

/// `mine_of`가 Some이면 그 사용자의 글을 상태와 관계없이, None이면 승인된 글만 조회합니다.
fn push_prayer_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    filter: &PrayerFilter,
    mine_of: Option<&str>,
) {
    match mine_of {
        Some(user_id) => {
            qb.push(" WHERE p.author_id = ").push_bind(user_id.to_string());
        }
        None => {
            qb.push(" WHERE p.moderation_status = 'approved'");
        }
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND p.category = ").push_bind(category.to_string());
    }
}

pub async fn list_prayers(
    pool: &SqlitePool,
    filter: &PrayerFilter,
    mine_of: Option<&str>,
    page: Page,
) -> Result<(Vec<PrayerPost>, i64), AppError> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM prayer_posts p");
    push_prayer_filters(&mut count_qb, filter, mine_of);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(PRAYER_SELECT);
    push_prayer_filters(&mut qb, filter, mine_of);
    qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let prayers = qb.build_query_as::<PrayerPost>().fetch_all(pool).await?;

    Ok((prayers, total))
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<PrayerPost>, AppError> {
    let prayer = sqlx::query_as::<_, PrayerPost>(&format!("{PRAYER_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(prayer)
}

pub async fn create_prayer(
    pool: &SqlitePool,
    id: &str,
    author_id: &str,
    req: &CreatePrayerRequest,
    content: &str,
    status: ModerationStatus,
) -> Result<PrayerPost, AppError> {
    sqlx::query(
        r#"
        INSERT INTO prayer_posts (id, author_id, title, content, category, is_anonymous, moderation_status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(req.title.as_deref().map(str::trim))
    .bind(content)
    .bind(&req.category)
    .bind(req.is_anonymous.unwrap_or(false))
    .bind(status)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created prayer".to_string()))
}

/// 부분 업데이트. `new_status`가 Some이면 검토 상태도 함께 바꿉니다.
pub async fn update_prayer(
    pool: &SqlitePool,
    id: &str,
    req: &UpdatePrayerRequest,
    content: Option<&str>,
    new_status: Option<ModerationStatus>,
) -> Result<Option<PrayerPost>, AppError> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "UPDATE prayer_posts SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
    );
    if let Some(title) = &req.title {
        qb.push(", title = ").push_bind(title.trim().to_string());
    }
    if let Some(content) = content {
        qb.push(", content = ").push_bind(content.to_string());
    }
    if let Some(category) = &req.category {
        qb.push(", category = ").push_bind(category.clone());
    }
    if let Some(is_anonymous) = req.is_anonymous {
        qb.push(", is_anonymous = ").push_bind(is_anonymous);
    }
    if let Some(status) = new_status {
        qb.push(", moderation_status = ").push_bind(status);
    }
    qb.push(" WHERE id = ").push_bind(id.to_string());

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

pub async fn delete_prayer(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM prayer_posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 주어진 기도 요청 중 사용자가 "함께 기도"한 것들의 ID
pub async fn prayed_ids(
    pool: &SqlitePool,
    user_id: &str,
    prayer_ids: &[String],
) -> Result<HashSet<String>, AppError> {
    if prayer_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new("SELECT prayer_id FROM prayer_supports WHERE user_id = ");
    qb.push_bind(user_id.to_string()).push(" AND prayer_id IN (");
    let mut separated = qb.separated(", ");
    for id in prayer_ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");

    let ids: Vec<String> = qb.build_query_scalar().fetch_all(pool).await?;
    Ok(ids.into_iter().collect())
}

/// "함께 기도했어요". 반환값은 (이번에 새로 기록되었는지, 현재 prayer_count)
pub async fn pray(pool: &SqlitePool, prayer_id: &str, user_id: &str) -> Result<(bool, i64), AppError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query("INSERT OR IGNORE INTO prayer_supports (prayer_id, user_id) VALUES (?, ?)")
        .bind(prayer_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;

    if inserted {
        sqlx::query("UPDATE prayer_posts SET prayer_count = prayer_count + 1 WHERE id = ?")
            .bind(prayer_id)
            .execute(&mut *tx)
            .await?;
    }

    let count: i64 = sqlx::query_scalar("SELECT prayer_count FROM prayer_posts WHERE id = ?")
        .bind(prayer_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok((inserted, count))
}

pub async fn unpray(pool: &SqlitePool, prayer_id: &str, user_id: &str) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM prayer_supports WHERE prayer_id = ? AND user_id = ?")
        .bind(prayer_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if removed > 0 {
        sqlx::query("UPDATE prayer_posts SET prayer_count = MAX(prayer_count - 1, 0) WHERE id = ?")
            .bind(prayer_id)
            .execute(&mut *tx)
            .await?;
    }

    let count: i64 = sqlx::query_scalar("SELECT prayer_count FROM prayer_posts WHERE id = ?")
        .bind(prayer_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(count)
}
