//! # 통합 검색 점수 계산
//!
//! DB에서 `LIKE '%q%'`로 후보를 넓게 가져온 뒤, 이 모듈의 휴리스틱으로 점수를 매겨 정렬합니다.
//! 모든 비교는 대소문자를 구분하지 않습니다.
//!
//! | 조건 | 점수 |
//! |------|------|
//! | 주 필드가 검색어와 같음 | +100 |
//! | 주 필드가 검색어로 시작 | +50 |
//! | 주 필드가 검색어를 포함 | +20 |
//! | 주 필드가 검색어의 각 단어를 포함 | 단어당 +5 |
//! | 보조 필드가 검색어를 포함 | 필드당 +10 |
//! | 보조 필드가 검색어의 각 단어를 포함 | 단어당 +2 |

pub const EXACT_MATCH: i64 = 100;
pub const PREFIX_MATCH: i64 = 50;
pub const PRIMARY_CONTAINS: i64 = 20;
pub const PRIMARY_WORD: i64 = 5;
pub const SECONDARY_CONTAINS: i64 = 10;
pub const SECONDARY_WORD: i64 = 2;

/// 스니펫 최대 길이(문자 수)
pub const SNIPPET_CHARS: usize = 160;

/// 검색 결과 한 건의 점수를 계산합니다.
///
/// `primary`는 제목처럼 가장 중요한 필드, `secondary`는 본문/설명 같은 나머지 필드입니다.
pub fn score(query: &str, primary: &str, secondary: &[Option<&str>]) -> i64 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0;
    }
    let words: Vec<&str> = query.split_whitespace().collect();
    let primary = primary.to_lowercase();

    let mut total = 0;
    if primary == query {
        total += EXACT_MATCH;
    } else if primary.starts_with(&query) {
        total += PREFIX_MATCH;
    } else if primary.contains(&query) {
        total += PRIMARY_CONTAINS;
    }
    total += words.iter().filter(|w| primary.contains(*w)).count() as i64 * PRIMARY_WORD;

    for field in secondary.iter().flatten() {
        let field = field.to_lowercase();
        if field.contains(&query) {
            total += SECONDARY_CONTAINS;
        }
        total += words.iter().filter(|w| field.contains(*w)).count() as i64 * SECONDARY_WORD;
    }

    total
}

/// 첫 번째 일치 위치 주변을 잘라 미리보기 문자열을 만듭니다.
///
/// 문자(char) 단위로 자르므로 한글 같은 멀티바이트 문자에서도 안전합니다.
/// 앞뒤가 잘리면 `...`를 붙입니다.
pub fn snippet(text: &str, query: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    // 원문 문자 배열 위에서 찾아야 소문자 변환으로 길이가 바뀌는 문자('İ' 등)에서도 위치가 맞습니다.
    let needle: Vec<char> = query.trim().chars().collect();
    let match_char = find_ignore_case(&chars, &needle);

    let start = match match_char {
        Some(pos) => pos.saturating_sub(max_chars / 4).min(chars.len() - max_chars),
        None => 0,
    };
    let end = (start + max_chars).min(chars.len());

    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str("...");
    }
    out
}

/// 대소문자를 무시하고 `needle`이 처음 나오는 문자 위치를 찾습니다.
fn find_ignore_case(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let same = |a: &char, b: &char| a.to_lowercase().eq(b.to_lowercase());
    haystack
        .windows(needle.len())
        .position(|window| window.iter().zip(needle).all(|(a, b)| same(a, b)))
}
