//! # 통합 검색 후보 조회
//!
//! 종류별로 `LIKE '%q%'` 조건에 맞는 후보를 넓게 가져옵니다.
//! 점수 계산과 정렬은 `services::ranking`이 담당합니다.
//!
//! SQLite의 LIKE는 ASCII 범위에서 대소문자를 구분하지 않습니다.
//! 공개된 콘텐츠만 후보가 됩니다: 공개 미디어, 활성 포럼, 승인된 글/기도 요청, 활성 사용자.

use crate::error::AppError;
use crate::models::{SearchCandidate, SearchType};
use sqlx::SqlitePool;

/// 종류별 최대 후보 수
pub const CANDIDATE_LIMIT: i64 = 200;

fn candidate_sql(kind: SearchType) -> &'static str {
    match kind {
        SearchType::Media => {
            r#"
            SELECT id, title AS primary_text, description AS secondary_text, speaker AS extra_text
            FROM media
            WHERE is_published = 1
              AND (title LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\' OR speaker LIKE ?1 ESCAPE '\')
            ORDER BY created_at DESC
            LIMIT ?2
            "#
        }
        SearchType::Forums => {
            r#"
            SELECT id, title AS primary_text, description AS secondary_text, category AS extra_text
            FROM forums
            WHERE is_active = 1
              AND (title LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\')
            ORDER BY created_at DESC
            LIMIT ?2
            "#
        }
        SearchType::Posts => {
            r#"
            SELECT p.id, p.content AS primary_text, f.title AS secondary_text, NULL AS extra_text
            FROM forum_posts p
            JOIN forums f ON f.id = p.forum_id
            WHERE p.moderation_status = 'approved' AND f.is_active = 1
              AND p.content LIKE ?1 ESCAPE '\'
            ORDER BY p.created_at DESC
            LIMIT ?2
            "#
        }
        SearchType::Prayers => {
            r#"
            SELECT id, COALESCE(title, '') AS primary_text, content AS secondary_text,
                   category AS extra_text
            FROM prayer_posts
            WHERE moderation_status = 'approved'
              AND (title LIKE ?1 ESCAPE '\' OR content LIKE ?1 ESCAPE '\')
            ORDER BY created_at DESC
            LIMIT ?2
            "#
        }
        SearchType::Users => {
            r#"
            SELECT id, username AS primary_text, display_name AS secondary_text, bio AS extra_text
            FROM users
            WHERE is_active = 1
              AND (username LIKE ?1 ESCAPE '\' OR display_name LIKE ?1 ESCAPE '\' OR bio LIKE ?1 ESCAPE '\')
            ORDER BY created_at DESC
            LIMIT ?2
            "#
        }
    }
}

pub async fn candidates(
    pool: &SqlitePool,
    kind: SearchType,
    query: &str,
) -> Result<Vec<SearchCandidate>, AppError> {
    let rows = sqlx::query_as::<_, SearchCandidate>(candidate_sql(kind))
        .bind(super::like_pattern(query))
        .bind(CANDIDATE_LIMIT)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
