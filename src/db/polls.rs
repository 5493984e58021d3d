//! # 투표(Poll) 쿼리
//!
//! `poll_options.votes_count`와 `polls.total_votes`는 `poll_votes` 행을 추가/삭제하는
//! 트랜잭션 안에서 함께 갱신됩니다. `total_votes`는 투표 행의 총 개수이므로,
//! 복수 선택 투표에서는 한 사람이 여러 표를 더할 수 있습니다.

use std::collections::HashMap;

use crate::error::AppError;
use crate::models::*;
use crate::services::pagination::Page;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const POLL_COLUMNS: &str = "id, question, description, created_by, allow_multiple, is_closed, \
                            expires_at, total_votes, created_at, updated_at";

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn push_status_filter(qb: &mut QueryBuilder<'_, Sqlite>, status: PollStatusFilter) {
    match status {
        PollStatusFilter::All => {}
        PollStatusFilter::Open => {
            qb.push(format!(
                " WHERE is_closed = 0 AND (expires_at IS NULL OR expires_at > {NOW})"
            ));
        }
        PollStatusFilter::Closed => {
            qb.push(format!(
                " WHERE is_closed = 1 OR (expires_at IS NOT NULL AND expires_at <= {NOW})"
            ));
        }
    }
}

pub async fn list_polls(
    pool: &SqlitePool,
    status: PollStatusFilter,
    page: Page,
) -> Result<(Vec<Poll>, i64), AppError> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM polls");
    push_status_filter(&mut count_qb, status);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {POLL_COLUMNS} FROM polls"));
    push_status_filter(&mut qb, status);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let polls = qb.build_query_as::<Poll>().fetch_all(pool).await?;

    Ok((polls, total))
}

pub async fn find_poll(pool: &SqlitePool, id: &str) -> Result<Option<Poll>, AppError> {
    let poll = sqlx::query_as::<_, Poll>(&format!("SELECT {POLL_COLUMNS} FROM polls WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(poll)
}

pub async fn list_options(pool: &SqlitePool, poll_id: &str) -> Result<Vec<PollOption>, AppError> {
    let options = sqlx::query_as::<_, PollOption>(
        r#"
        SELECT id, poll_id, text, position, votes_count
        FROM poll_options
        WHERE poll_id = ?
        ORDER BY position ASC
        "#,
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    Ok(options)
}

/// 여러 투표의 선택지를 한 번에 가져와 poll_id별로 묶습니다.
pub async fn list_options_for_polls(
    pool: &SqlitePool,
    poll_ids: &[String],
) -> Result<HashMap<String, Vec<PollOption>>, AppError> {
    let mut grouped: HashMap<String, Vec<PollOption>> = HashMap::new();
    if poll_ids.is_empty() {
        return Ok(grouped);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, poll_id, text, position, votes_count FROM poll_options WHERE poll_id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in poll_ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(") ORDER BY poll_id, position ASC");

    let options = qb.build_query_as::<PollOption>().fetch_all(pool).await?;
    for option in options {
        grouped.entry(option.poll_id.clone()).or_default().push(option);
    }
    Ok(grouped)
}

pub async fn create_poll(
    pool: &SqlitePool,
    id: &str,
    req: &CreatePollRequest,
    options: &[String],
    expires_at: Option<&str>,
    created_by: &str,
) -> Result<Poll, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO polls (id, question, description, created_by, allow_multiple, expires_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(req.question.trim())
    .bind(&req.description)
    .bind(created_by)
    .bind(req.allow_multiple.unwrap_or(false))
    .bind(expires_at)
    .execute(&mut *tx)
    .await?;

    for (position, text) in options.iter().enumerate() {
        sqlx::query("INSERT INTO poll_options (id, poll_id, text, position) VALUES (?, ?, ?, ?)")
            .bind(super::new_id())
            .bind(id)
            .bind(text)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    find_poll(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created poll".to_string()))
}

pub async fn user_votes(pool: &SqlitePool, poll_id: &str, user_id: &str) -> Result<Vec<String>, AppError> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT option_id FROM poll_votes WHERE poll_id = ? AND user_id = ? ORDER BY created_at",
    )
    .bind(poll_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// 표를 기록합니다. 반환값은 새로 기록된 표의 수입니다.
///
/// 단일 선택 투표에서 이미 투표했다면 `Conflict`,
/// 복수 선택 투표에서 이미 고른 선택지는 건너뜁니다.
pub async fn cast_votes(
    pool: &SqlitePool,
    poll: &Poll,
    user_id: &str,
    option_ids: &[String],
) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;

    if !poll.allow_multiple {
        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM poll_votes WHERE poll_id = ? AND user_id = ?")
                .bind(&poll.id)
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        if existing > 0 {
            return Err(AppError::Conflict("You have already voted in this poll".to_string()));
        }
    }

    let mut inserted = 0;
    for option_id in option_ids {
        let rows = sqlx::query(
            "INSERT OR IGNORE INTO poll_votes (id, poll_id, option_id, user_id) VALUES (?, ?, ?, ?)",
        )
        .bind(super::new_id())
        .bind(&poll.id)
        .bind(option_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows > 0 {
            sqlx::query("UPDATE poll_options SET votes_count = votes_count + 1 WHERE id = ?")
                .bind(option_id)
                .execute(&mut *tx)
                .await?;
            inserted += rows;
        }
    }

    if inserted > 0 {
        sqlx::query(&format!(
            "UPDATE polls SET total_votes = total_votes + ?, updated_at = {NOW} WHERE id = ?"
        ))
        .bind(inserted as i64)
        .bind(&poll.id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(inserted)
}

/// 사용자의 표를 모두 취소합니다. 반환값은 취소된 표의 수입니다.
pub async fn retract_votes(pool: &SqlitePool, poll_id: &str, user_id: &str) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;

    let option_ids: Vec<String> =
        sqlx::query_scalar("SELECT option_id FROM poll_votes WHERE poll_id = ? AND user_id = ?")
            .bind(poll_id)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

    for option_id in &option_ids {
        sqlx::query("UPDATE poll_options SET votes_count = MAX(votes_count - 1, 0) WHERE id = ?")
            .bind(option_id)
            .execute(&mut *tx)
            .await?;
    }

    let removed = sqlx::query("DELETE FROM poll_votes WHERE poll_id = ? AND user_id = ?")
        .bind(poll_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if removed > 0 {
        sqlx::query(&format!(
            "UPDATE polls SET total_votes = MAX(total_votes - ?, 0), updated_at = {NOW} WHERE id = ?"
        ))
        .bind(removed as i64)
        .bind(poll_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(removed)
}

pub async fn close_poll(pool: &SqlitePool, id: &str) -> Result<Option<Poll>, AppError> {
    let result = sqlx::query(&format!("UPDATE polls SET is_closed = 1, updated_at = {NOW} WHERE id = ?"))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_poll(pool, id).await
}

pub async fn delete_poll(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM polls WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
