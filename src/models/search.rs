use serde::{Deserialize, Serialize};

/// 통합 검색 대상 종류. `?types=media,forums`처럼 쉼표로 구분해 받습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Media,
    Forums,
    Posts,
    Prayers,
    Users,
}

impl SearchType {
    pub const ALL: [SearchType; 5] = [
        SearchType::Media,
        SearchType::Forums,
        SearchType::Posts,
        SearchType::Prayers,
        SearchType::Users,
    ];

    /// 결과 항목의 `type` 값
    pub fn result_type(&self) -> &'static str {
        match self {
            SearchType::Media => "media",
            SearchType::Forums => "forum",
            SearchType::Posts => "post",
            SearchType::Prayers => "prayer",
            SearchType::Users => "user",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "media" => Some(SearchType::Media),
            "forums" => Some(SearchType::Forums),
            "posts" => Some(SearchType::Posts),
            "prayers" => Some(SearchType::Prayers),
            "users" => Some(SearchType::Users),
            _ => None,
        }
    }

    /// `"media,posts"` 형태의 목록을 파싱합니다. 비어 있거나 None이면 전체입니다.
    pub fn parse_list(raw: Option<&str>) -> Result<Vec<SearchType>, String> {
        let raw = match raw.map(str::trim) {
            Some(r) if !r.is_empty() => r,
            _ => return Ok(Self::ALL.to_vec()),
        };

        let mut types = Vec::new();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let ty = Self::from_token(&token.to_lowercase()).ok_or_else(|| {
                format!(
                    "Invalid search type: {}. Must be one of: media, forums, posts, prayers, users",
                    token
                )
            })?;
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        Ok(types)
    }
}

/// DB에서 가져온 검색 후보. `primary`는 점수 가중치가 큰 필드(제목, 사용자명 등)입니다.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchCandidate {
    pub id: String,
    pub primary_text: String,
    pub secondary_text: Option<String>,
    pub extra_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub score: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub types: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_types_means_all() {
        assert_eq!(SearchType::parse_list(None).unwrap().len(), 5);
        assert_eq!(SearchType::parse_list(Some(" ")).unwrap().len(), 5);
    }

    #[test]
    fn parses_and_dedupes_list() {
        let types = SearchType::parse_list(Some("Media, posts,media")).unwrap();
        assert_eq!(types, vec![SearchType::Media, SearchType::Posts]);
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(SearchType::parse_list(Some("media,videos")).is_err());
    }
}
