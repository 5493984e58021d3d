//! # 통합 검색 API
//!
//! ```text
//! GET /api/v1/search?q=grace
//! GET /api/v1/search?q=sunday+worship&types=media,forums&limit=10
//! ```
//!
//! 종류별 후보를 `LIKE`로 넓게 모은 뒤 `services::ranking`으로 점수를 매겨
//! 점수 내림차순, 같은 점수면 제목순으로 정렬합니다.

use crate::{
    db::search as db_search,
    error::AppError,
    models::*,
    services::ranking::{self, SNIPPET_CHARS},
    state::AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};

const MIN_QUERY_CHARS: usize = 2;
const MAX_QUERY_CHARS: usize = 100;
const DEFAULT_RESULTS: usize = 20;
const MAX_RESULTS: usize = 50;
/// 본문으로 제목을 대신할 때의 길이
const TITLE_FROM_CONTENT_CHARS: usize = 80;

fn leading_text(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// 후보 하나를 결과 항목으로 바꿉니다. 점수가 0이면 None.
fn to_hit(kind: SearchType, query: &str, candidate: SearchCandidate) -> Option<SearchHit> {
    let secondary = candidate.secondary_text.as_deref();
    let extra = candidate.extra_text.as_deref();

    let score = ranking::score(query, &candidate.primary_text, &[secondary, extra]);
    if score <= 0 {
        return None;
    }

    let (title, snippet_source) = match kind {
        SearchType::Media | SearchType::Forums => (
            candidate.primary_text.clone(),
            non_empty(secondary).unwrap_or(&candidate.primary_text),
        ),
        // 글은 본문이 primary, 포럼 제목이 secondary입니다.
        SearchType::Posts => (
            leading_text(&candidate.primary_text, TITLE_FROM_CONTENT_CHARS),
            candidate.primary_text.as_str(),
        ),
        SearchType::Prayers => {
            let content = secondary.unwrap_or_default();
            let title = match non_empty(Some(&candidate.primary_text)) {
                Some(title) => title.to_string(),
                None => leading_text(content, TITLE_FROM_CONTENT_CHARS),
            };
            (title, content)
        }
        SearchType::Users => (
            non_empty(secondary).unwrap_or(&candidate.primary_text).to_string(),
            non_empty(extra).unwrap_or(&candidate.primary_text),
        ),
    };

    Some(SearchHit {
        kind: kind.result_type(),
        snippet: ranking::snippet(snippet_source, query, SNIPPET_CHARS),
        id: candidate.id,
        title,
        score,
    })
}

/// 점수 내림차순, 같은 점수면 제목(대소문자 무시) 오름차순
fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.trim();
    let query_len = query.chars().count();
    if !(MIN_QUERY_CHARS..=MAX_QUERY_CHARS).contains(&query_len) {
        return Err(AppError::BadRequest(format!(
            "Query must be between {} and {} characters",
            MIN_QUERY_CHARS, MAX_QUERY_CHARS
        )));
    }

    let types = SearchType::parse_list(params.types.as_deref()).map_err(AppError::BadRequest)?;
    let limit = params
        .limit
        .map(|l| l.clamp(1, MAX_RESULTS as i64) as usize)
        .unwrap_or(DEFAULT_RESULTS);

    let mut hits = Vec::new();
    for kind in types {
        let candidates = db_search::candidates(&state.pool, kind, query).await?;
        hits.extend(
            candidates
                .into_iter()
                .filter_map(|candidate| to_hit(kind, query, candidate)),
        );
    }

    sort_hits(&mut hits);
    let total = hits.len();
    hits.truncate(limit);
    tracing::debug!("Search \"{}\" matched {} results", query, total);

    Ok(Json(SearchResponse {
        results: hits,
        total,
    }))
}
