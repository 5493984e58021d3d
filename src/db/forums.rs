//! # 포럼 / 포럼 글 쿼리
//!
//! 카운터 규칙 (승인된 글만 셉니다):
//! - `forums.posts_count`: 포럼 안의 승인된 글 수 (답글 포함)
//! - `forum_posts.replies_count`: 승인된 직속 답글 수
//! - `forum_posts.likes_count`: `forum_post_likes` 행 수

use crate::error::AppError;
use crate::models::*;
use crate::services::pagination::Page;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const FORUM_COLUMNS: &str = "id, title, slug, description, category, created_by, is_active, \
                             posts_count, created_at, updated_at";

const POST_SELECT: &str = r#"
    SELECT p.id, p.forum_id, p.author_id, u.username AS author_username, p.parent_id,
           p.content, p.moderation_status, p.likes_count, p.replies_count,
           p.created_at, p.updated_at
    FROM forum_posts p
    JOIN users u ON u.id = p.author_id
"#;

fn push_forum_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    filter: &ForumFilter,
    include_inactive: bool,
) {
    qb.push(" WHERE 1 = 1");
    if !include_inactive {
        qb.push(" AND is_active = 1");
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
}

pub async fn list_forums(
    pool: &SqlitePool,
    filter: &ForumFilter,
    include_inactive: bool,
    page: Page,
) -> Result<(Vec<Forum>, i64), AppError> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM forums");
    push_forum_filters(&mut count_qb, filter, include_inactive);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {FORUM_COLUMNS} FROM forums"));
    push_forum_filters(&mut qb, filter, include_inactive);
    qb.push(" ORDER BY title ASC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let forums = qb.build_query_as::<Forum>().fetch_all(pool).await?;

    Ok((forums, total))
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Forum>, AppError> {
    let forum = sqlx::query_as::<_, Forum>(&format!("SELECT {FORUM_COLUMNS} FROM forums WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(forum)
}

/// ID 또는 slug로 포럼을 찾습니다.
pub async fn find_by_id_or_slug(pool: &SqlitePool, key: &str) -> Result<Option<Forum>, AppError> {
    let forum = sqlx::query_as::<_, Forum>(&format!(
        "SELECT {FORUM_COLUMNS} FROM forums WHERE id = ? OR slug = ? LIMIT 1"
    ))
    .bind(key)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(forum)
}

/// 제목에서 slug를 만들고, 이미 쓰이고 있으면 `-2`, `-3`, ... 을 붙입니다.
pub async fn unique_slug(pool: &SqlitePool, title: &str) -> Result<String, AppError> {
    let base = match slug::slugify(title) {
        s if s.is_empty() => "forum".to_string(),
        s => s,
    };

    let mut candidate = base.clone();
    let mut suffix = 2;
    loop {
        let taken: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM forums WHERE slug = ?)")
            .bind(&candidate)
            .fetch_one(pool)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
}

pub async fn create_forum(
    pool: &SqlitePool,
    id: &str,
    req: &CreateForumRequest,
    slug: &str,
    created_by: &str,
) -> Result<Forum, AppError> {
    sqlx::query(
        r#"
        INSERT INTO forums (id, title, slug, description, category, created_by)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(req.title.trim())
    .bind(slug)
    .bind(&req.description)
    .bind(&req.category)
    .bind(created_by)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created forum".to_string()))
}

pub async fn update_forum(
    pool: &SqlitePool,
    id: &str,
    req: &UpdateForumRequest,
) -> Result<Option<Forum>, AppError> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "UPDATE forums SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
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
    if let Some(is_active) = req.is_active {
        qb.push(", is_active = ").push_bind(is_active);
    }
    qb.push(" WHERE id = ").push_bind(id.to_string());

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

pub async fn delete_forum(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM forums WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 포럼의 승인된 최상위 글 (최신순)
pub async fn list_posts(
    pool: &SqlitePool,
    forum_id: &str,
    page: Page,
) -> Result<(Vec<ForumPost>, i64), AppError> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM forum_posts
        WHERE forum_id = ? AND parent_id IS NULL AND moderation_status = 'approved'
        "#,
    )
    .bind(forum_id)
    .fetch_one(pool)
    .await?;

    let posts = sqlx::query_as::<_, ForumPost>(&format!(
        "{POST_SELECT} WHERE p.forum_id = ? AND p.parent_id IS NULL AND p.moderation_status = 'approved' \
         ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?"
    ))
    .bind(forum_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((posts, total))
}

/// 글에 달린 승인된 답글 (작성순)
pub async fn list_replies(
    pool: &SqlitePool,
    post_id: &str,
    page: Page,
) -> Result<(Vec<ForumPost>, i64), AppError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM forum_posts WHERE parent_id = ? AND moderation_status = 'approved'",
    )
    .bind(post_id)
    .fetch_one(pool)
    .await?;

    let replies = sqlx::query_as::<_, ForumPost>(&format!(
        "{POST_SELECT} WHERE p.parent_id = ? AND p.moderation_status = 'approved' \
         ORDER BY p.created_at ASC, p.id ASC LIMIT ? OFFSET ?"
    ))
    .bind(post_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((replies, total))
}

pub async fn find_post(pool: &SqlitePool, id: &str) -> Result<Option<ForumPost>, AppError> {
    let post = sqlx::query_as::<_, ForumPost>(&format!("{POST_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(post)
}

pub async fn create_post(
    pool: &SqlitePool,
    id: &str,
    forum_id: &str,
    author_id: &str,
    parent_id: Option<&str>,
    content: &str,
    status: ModerationStatus,
) -> Result<ForumPost, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO forum_posts (id, forum_id, author_id, parent_id, content, moderation_status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(forum_id)
    .bind(author_id)
    .bind(parent_id)
    .bind(content)
    .bind(status)
    .execute(&mut *tx)
    .await?;

    if status.is_visible() {
        sqlx::query("UPDATE forums SET posts_count = posts_count + 1 WHERE id = ?")
            .bind(forum_id)
            .execute(&mut *tx)
            .await?;

        if let Some(parent_id) = parent_id {
            sqlx::query("UPDATE forum_posts SET replies_count = replies_count + 1 WHERE id = ?")
                .bind(parent_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    find_post(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created post".to_string()))
}

pub async fn update_post_content(
    pool: &SqlitePool,
    id: &str,
    content: &str,
) -> Result<Option<ForumPost>, AppError> {
    let result = sqlx::query(
        "UPDATE forum_posts SET content = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(content)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_post(pool, id).await
}

/// 글과 그 하위 답글(CASCADE)을 삭제하고 카운터를 맞춥니다.
pub async fn delete_post(pool: &SqlitePool, post: &ForumPost) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let approved_in_subtree: i64 = sqlx::query_scalar(
        r#"
        WITH RECURSIVE subtree(id) AS (
            SELECT id FROM forum_posts WHERE id = ?
            UNION ALL
            SELECT p.id FROM forum_posts p JOIN subtree s ON p.parent_id = s.id
        )
        SELECT COUNT(*) FROM forum_posts
        WHERE id IN (SELECT id FROM subtree) AND moderation_status = 'approved'
        "#,
    )
    .bind(&post.id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM forum_posts WHERE id = ?")
        .bind(&post.id)
        .execute(&mut *tx)
        .await?;

    if approved_in_subtree > 0 {
        sqlx::query("UPDATE forums SET posts_count = MAX(posts_count - ?, 0) WHERE id = ?")
            .bind(approved_in_subtree)
            .bind(&post.forum_id)
            .execute(&mut *tx)
            .await?;
    }

    if let (Some(parent_id), true) = (&post.parent_id, post.moderation_status.is_visible()) {
        sqlx::query("UPDATE forum_posts SET replies_count = MAX(replies_count - 1, 0) WHERE id = ?")
            .bind(parent_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn is_post_liked(pool: &SqlitePool, post_id: &str, user_id: &str) -> Result<bool, AppError> {
    let exists: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM forum_post_likes WHERE post_id = ? AND user_id = ?)",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(exists != 0)
}

pub async fn like_post(pool: &SqlitePool, post_id: &str, user_id: &str) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query("INSERT OR IGNORE INTO forum_post_likes (post_id, user_id) VALUES (?, ?)")
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if inserted > 0 {
        sqlx::query("UPDATE forum_posts SET likes_count = likes_count + 1 WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
    }

    let likes_count: i64 = sqlx::query_scalar("SELECT likes_count FROM forum_posts WHERE id = ?")
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(likes_count)
}

pub async fn unlike_post(pool: &SqlitePool, post_id: &str, user_id: &str) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM forum_post_likes WHERE post_id = ? AND user_id = ?")
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if removed > 0 {
        sqlx::query("UPDATE forum_posts SET likes_count = MAX(likes_count - 1, 0) WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
    }

    let likes_count: i64 = sqlx::query_scalar("SELECT likes_count FROM forum_posts WHERE id = ?")
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(likes_count)
}
