//! # 페이지네이션(Pagination) 계산
//!
//! 목록 API가 공통으로 받는 `?page=2&limit=20` 쿼리 파라미터를 해석하고,
//! 응답에 붙는 `pagination` 메타데이터를 계산합니다.
//!
//! ## 규칙
//! - `page`: 기본값 1, 1 미만이면 1로 보정
//! - `limit`: 기본값 20, 1..=100 범위로 보정
//! - `offset = (page - 1) * limit`
//! - `total_pages = ceil(total / limit)`, `has_next = page < total_pages`

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// URL 쿼리 파라미터 원본. 값이 없거나 범위를 벗어날 수 있습니다.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// 보정된 페이지 값으로 변환합니다.
    pub fn resolve(&self) -> Page {
        Page {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }
}

/// 보정이 끝난 페이지 값. SQL의 LIMIT/OFFSET에 바로 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// 응답의 `pagination` 필드
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
}

impl PageMeta {
    pub fn new(page: Page, total: i64) -> Self {
        let total = total.max(0);
        let total_pages = (total + page.limit - 1) / page.limit;
        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages,
            has_next: page.page < total_pages,
        }
    }
}

/// 목록 응답 공통 형태: `{ "items": [...], "pagination": {...} }`
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page, total: i64) -> Self {
        Self {
            items,
            pagination: PageMeta::new(page, total),
        }
    }

    /// 항목 타입을 바꿀 때 사용합니다 (예: User → UserResponse).
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
