//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈은 리소스 하나를 담당합니다:
//! - `users`: 사용자, refresh 토큰
//! - `media`, `comments`, `bookmarks`: 미디어 라이브러리와 상호작용
//! - `forums`, `polls`, `prayers`: 커뮤니티 콘텐츠
//! - `moderation`: 콘텐츠 종류를 가리지 않는 검토 상태 변경
//! - `playback`, `notifications`, `devices`: 재생 기록, 알림함, 푸시 토큰
//! - `search`: 통합 검색 후보 조회
//!
//! 비정규화 카운터(likes_count 등)는 상호작용 행을 바꾸는 것과 같은 트랜잭션 안에서 갱신합니다.

pub mod bookmarks;
pub mod comments;
pub mod devices;
pub mod forums;
pub mod media;
pub mod moderation;
pub mod notifications;
pub mod playback;
pub mod polls;
pub mod prayers;
pub mod search;
pub mod users;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// SQLite 연결 풀을 생성합니다.
///
/// 파일이 없으면 새로 만들고, 외래키 제약조건(ON DELETE CASCADE 등)을 켭니다.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// `./migrations` 폴더의 SQL 파일 중 아직 적용되지 않은 것을 순서대로 실행합니다.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// LIKE 패턴에 쓰기 위해 `%`, `_`, `\`를 이스케이프합니다.
///
/// 결과는 `ESCAPE '\'`와 함께 사용해야 합니다.
/// 예: `"100%"` → `"%100\%%"`
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// 새 레코드용 UUIDv7 문자열 ID
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("grace"), "%grace%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\x"), "%c:\\\\x%");
    }
}
