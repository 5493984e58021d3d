use crate::error::AppError;
use crate::models::{Role, UpdateProfileRequest, User, UserFilter};
use crate::services::pagination::Page;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const USER_COLUMNS: &str = "id, username, email, password_hash, display_name, bio, avatar_url, \
                            role, is_active, created_at, updated_at";

pub async fn create_user(
    pool: &SqlitePool,
    id: &str,
    username: &str,
    email: Option<&str>,
    password_hash: &str,
    display_name: Option<&str>,
    role: Role,
) -> Result<User, AppError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, display_name, role)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(display_name)
    .bind(role)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created user".to_string()))
}

pub async fn count_users(pool: &SqlitePool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// 인증 extractor에서 매 요청마다 호출합니다. 토큰 발급 이후 바뀐 권한/정지 상태를 반영하기 위함입니다.
pub async fn find_auth_status(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<(Role, bool)>, sqlx::Error> {
    sqlx::query_as::<_, (Role, bool)>("SELECT role, is_active FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = super::like_pattern(q);
        qb.push(" AND (username LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR display_name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR email LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(role) = &filter.role {
        qb.push(" AND role = ").push_bind(role.clone());
    }
    if let Some(active) = filter.active {
        qb.push(" AND is_active = ").push_bind(active);
    }
}

/// 관리자용 사용자 목록 (최신 가입순)
pub async fn list_users(
    pool: &SqlitePool,
    filter: &UserFilter,
    page: Page,
) -> Result<(Vec<User>, i64), AppError> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
    push_user_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users"));
    push_user_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let users = qb.build_query_as::<User>().fetch_all(pool).await?;

    Ok((users, total))
}

pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    req: &UpdateProfileRequest,
) -> Result<Option<User>, AppError> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "UPDATE users SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
    );
    if let Some(display_name) = &req.display_name {
        qb.push(", display_name = ").push_bind(display_name.clone());
    }
    if let Some(bio) = &req.bio {
        qb.push(", bio = ").push_bind(bio.clone());
    }
    if let Some(avatar_url) = &req.avatar_url {
        qb.push(", avatar_url = ").push_bind(avatar_url.clone());
    }
    if let Some(email) = &req.email {
        qb.push(", email = ").push_bind(email.clone());
    }
    qb.push(" WHERE id = ").push_bind(id.to_string());

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

pub async fn update_password(pool: &SqlitePool, id: &str, password_hash: &str) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE users SET password_hash = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(password_hash)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn set_role(pool: &SqlitePool, id: &str, role: Role) -> Result<Option<User>, AppError> {
    let result = sqlx::query(
        "UPDATE users SET role = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(role)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

pub async fn set_active(pool: &SqlitePool, id: &str, is_active: bool) -> Result<Option<User>, AppError> {
    let result = sqlx::query(
        "UPDATE users SET is_active = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(is_active)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// 사용자를 삭제합니다.
///
/// 작성한 글과 상호작용 행은 ON DELETE CASCADE로 사라지므로, 그 전에 같은 트랜잭션 안에서
/// 해당 행들이 올려 두었던 카운터를 먼저 빼 둡니다.
/// 사용자의 댓글/포럼 글 아래 달린 다른 사람의 답글도 함께 삭제되므로 하위 트리 전체를 셉니다.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    // 미디어 좋아요
    sqlx::query(
        r#"
        UPDATE media SET likes_count = MAX(likes_count - 1, 0)
        WHERE id IN (SELECT media_id FROM media_interactions WHERE user_id = ? AND kind = 'like')
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // 댓글 하위 트리
    sqlx::query(
        r#"
        WITH RECURSIVE doomed(id) AS (
            SELECT id FROM comments WHERE author_id = ?
            UNION
            SELECT c.id FROM comments c JOIN doomed d ON c.parent_id = d.id
        )
        UPDATE media SET comments_count = MAX(comments_count - (
            SELECT COUNT(*) FROM comments c
            WHERE c.media_id = media.id
              AND c.moderation_status = 'approved'
              AND c.id IN (SELECT id FROM doomed)
        ), 0)
        WHERE id IN (SELECT media_id FROM comments WHERE id IN (SELECT id FROM doomed))
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // 포럼 글 하위 트리
    sqlx::query(
        r#"
        WITH RECURSIVE doomed(id) AS (
            SELECT id FROM forum_posts WHERE author_id = ?
            UNION
            SELECT p.id FROM forum_posts p JOIN doomed d ON p.parent_id = d.id
        )
        UPDATE forums SET posts_count = MAX(posts_count - (
            SELECT COUNT(*) FROM forum_posts p
            WHERE p.forum_id = forums.id
              AND p.moderation_status = 'approved'
              AND p.id IN (SELECT id FROM doomed)
        ), 0)
        WHERE id IN (SELECT forum_id FROM forum_posts WHERE id IN (SELECT id FROM doomed))
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // 남는 글에 달려 있던 이 사용자의 승인된 직속 답글
    sqlx::query(
        r#"
        UPDATE forum_posts SET replies_count = MAX(replies_count - (
            SELECT COUNT(*) FROM forum_posts r
            WHERE r.parent_id = forum_posts.id
              AND r.author_id = ?
              AND r.moderation_status = 'approved'
        ), 0)
        WHERE author_id != ?
          AND id IN (
            SELECT parent_id FROM forum_posts
            WHERE author_id = ? AND parent_id IS NOT NULL AND moderation_status = 'approved'
          )
        "#,
    )
    .bind(id)
    .bind(id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE forum_posts SET likes_count = MAX(likes_count - 1, 0)
        WHERE id IN (SELECT post_id FROM forum_post_likes WHERE user_id = ?)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // 투표
    sqlx::query(
        r#"
        UPDATE poll_options SET votes_count = MAX(votes_count - 1, 0)
        WHERE id IN (SELECT option_id FROM poll_votes WHERE user_id = ?)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE polls SET total_votes = MAX(total_votes - (
            SELECT COUNT(*) FROM poll_votes v WHERE v.poll_id = polls.id AND v.user_id = ?
        ), 0)
        WHERE id IN (SELECT poll_id FROM poll_votes WHERE user_id = ?)
        "#,
    )
    .bind(id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // 함께 기도
    sqlx::query(
        r#"
        UPDATE prayer_posts SET prayer_count = MAX(prayer_count - 1, 0)
        WHERE id IN (SELECT prayer_id FROM prayer_supports WHERE user_id = ?)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_active_user_ids(pool: &SqlitePool) -> Result<Vec<String>, AppError> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM users WHERE is_active = 1")
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

pub async fn store_refresh_token(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    token_hash: &str,
    expires_at: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// refresh 토큰을 꺼내면서 바로 삭제합니다. 반환값은 (user_id, expires_at)
///
/// 조회와 삭제가 한 문장이라, 같은 토큰으로 동시에 들어온 요청 중 하나만 행을 받습니다.
pub async fn consume_refresh_token(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<Option<(String, String)>, AppError> {
    let row = sqlx::query_as::<_, (String, String)>(
        r#"
        DELETE FROM refresh_tokens
        WHERE token_hash = ?
        RETURNING user_id, expires_at
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn delete_user_refresh_tokens(pool: &SqlitePool, user_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
