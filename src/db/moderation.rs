//! # 콘텐츠 검토(Moderation) 쿼리
//!
//! 댓글, 포럼 글, 기도 요청의 `moderation_status`를 종류와 관계없이 바꿉니다.
//! 공개 카운터는 승인된 콘텐츠만 세므로, `approved` 경계를 넘나들 때 상위 카운터를 함께 조정합니다.
//!
//! | 종류 | 조정되는 카운터 |
//! |------|----------------|
//! | comment | `media.comments_count` |
//! | forum_post | `forums.posts_count`, 답글이면 부모 글의 `replies_count` |
//! | prayer | 없음 |

use crate::error::AppError;
use crate::models::{ContentKind, ModerationItem, ModerationStatus, StatusChange};
use crate::services::pagination::Page;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn table_for(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Comment => "comments",
        ContentKind::ForumPost => "forum_posts",
        ContentKind::Prayer => "prayer_posts",
    }
}

/// 상태 변경에 따른 카운터 증감. 승인 여부가 바뀌지 않으면 None.
fn counter_delta(previous: ModerationStatus, next: ModerationStatus) -> Option<i64> {
    match (previous.is_visible(), next.is_visible()) {
        (false, true) => Some(1),
        (true, false) => Some(-1),
        _ => None,
    }
}

pub async fn current_status(
    pool: &SqlitePool,
    kind: ContentKind,
    id: &str,
) -> Result<Option<ModerationStatus>, AppError> {
    let status = sqlx::query_scalar::<_, ModerationStatus>(&format!(
        "SELECT moderation_status FROM {} WHERE id = ?",
        table_for(kind)
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(status)
}

/// 검토 상태를 바꾸고 카운터를 맞춥니다. 대상이 없으면 None.
pub async fn set_status(
    pool: &SqlitePool,
    kind: ContentKind,
    id: &str,
    next: ModerationStatus,
) -> Result<Option<StatusChange>, AppError> {
    let mut tx = pool.begin().await?;

    let row: Option<(String, ModerationStatus)> = sqlx::query_as(&format!(
        "SELECT author_id, moderation_status FROM {} WHERE id = ?",
        table_for(kind)
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some((author_id, previous)) = row else {
        return Ok(None);
    };

    sqlx::query(&format!(
        "UPDATE {} SET moderation_status = ?, updated_at = {NOW} WHERE id = ?",
        table_for(kind)
    ))
    .bind(next)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if let Some(delta) = counter_delta(previous, next) {
        match kind {
            ContentKind::Comment => {
                sqlx::query(
                    r#"
                    UPDATE media SET comments_count = MAX(comments_count + ?, 0)
                    WHERE id = (SELECT media_id FROM comments WHERE id = ?)
                    "#,
                )
                .bind(delta)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
            ContentKind::ForumPost => {
                sqlx::query(
                    r#"
                    UPDATE forums SET posts_count = MAX(posts_count + ?, 0)
                    WHERE id = (SELECT forum_id FROM forum_posts WHERE id = ?)
                    "#,
                )
                .bind(delta)
                .bind(id)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    UPDATE forum_posts SET replies_count = MAX(replies_count + ?, 0)
                    WHERE id = (SELECT parent_id FROM forum_posts WHERE id = ?)
                    "#,
                )
                .bind(delta)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
            ContentKind::Prayer => {}
        }
    }

    tx.commit().await?;

    Ok(Some(StatusChange {
        author_id,
        previous,
        current: next,
    }))
}

/// 사용자 신고. 승인된 콘텐츠만 `under_review`로 옮기고, 그 밖의 상태는 그대로 둡니다.
pub async fn flag(
    pool: &SqlitePool,
    kind: ContentKind,
    id: &str,
) -> Result<Option<ModerationStatus>, AppError> {
    let Some(current) = current_status(pool, kind, id).await? else {
        return Ok(None);
    };
    if current != ModerationStatus::Approved {
        return Ok(Some(current));
    }

    let change = set_status(pool, kind, id, ModerationStatus::UnderReview).await?;
    Ok(change.map(|c| c.current))
}

const QUEUE_UNION: &str = r#"
    SELECT * FROM (
        SELECT 'comment' AS kind, c.id, c.author_id, u.username AS author_username,
               c.content, c.moderation_status, c.created_at
        FROM comments c JOIN users u ON u.id = c.author_id
        UNION ALL
        SELECT 'forum_post' AS kind, p.id, p.author_id, u.username AS author_username,
               p.content, p.moderation_status, p.created_at
        FROM forum_posts p JOIN users u ON u.id = p.author_id
        UNION ALL
        SELECT 'prayer' AS kind, r.id, r.author_id, u.username AS author_username,
               r.content, r.moderation_status, r.created_at
        FROM prayer_posts r JOIN users u ON u.id = r.author_id
    ) queue
"#;

fn push_queue_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    kind: Option<ContentKind>,
    status: ModerationStatus,
) {
    qb.push(" WHERE moderation_status = ").push_bind(status);
    if let Some(kind) = kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
}

/// 검토 대기열 (오래된 순)
pub async fn list_queue(
    pool: &SqlitePool,
    kind: Option<ContentKind>,
    status: ModerationStatus,
    page: Page,
) -> Result<(Vec<ModerationItem>, i64), AppError> {
    let mut count_qb = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM ({QUEUE_UNION}"));
    push_queue_filters(&mut count_qb, kind, status);
    count_qb.push(")");
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(QUEUE_UNION);
    push_queue_filters(&mut qb, kind, status);
    qb.push(" ORDER BY created_at ASC, id ASC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = qb.build_query_as::<ModerationItem>().fetch_all(pool).await?;

    Ok((items, total))
}
