//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: JWT 토큰 서명에 사용할 비밀키 (필수)
//! - `HOST`, `PORT`: 서버 바인딩 주소
//! - `ACCESS_TOKEN_TTL_MINUTES`, `REFRESH_TOKEN_TTL_DAYS`: 토큰 유효기간
//! - `AUTO_APPROVE_CONTENT`: 사용자 작성 콘텐츠를 바로 승인할지 여부
//! - `RATE_LIMIT_MAX_REQUESTS`, `RATE_LIMIT_WINDOW_SECS`: 요청 빈도 제한
//! - `DB_MAX_CONNECTIONS`: 연결 풀 크기

use std::env;
use std::str::FromStr;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// `AppState`를 통해 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 URL (예: "sqlite:data/fellowship.db")
    pub database_url: String,
    /// JWT 토큰 서명/검증에 사용하는 비밀키
    pub jwt_secret: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// access 토큰 유효기간(분)
    pub access_token_ttl_minutes: i64,
    /// refresh 토큰 유효기간(일)
    pub refresh_token_ttl_days: i64,
    /// true면 새 댓글/게시글/기도 요청이 `approved` 상태로 생성되고,
    /// false면 `pending` 상태로 생성되어 관리자 검토를 기다립니다.
    pub auto_approve_content: bool,
    /// 윈도우당 허용되는 최대 요청 수
    pub rate_limit_max_requests: u32,
    /// 요청 빈도 제한 윈도우 길이(초)
    pub rate_limit_window_secs: u64,
    /// SQLite 연결 풀의 최대 연결 수
    pub db_max_connections: u32,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    /// 숫자 형식이 잘못된 값도 조용히 기본값으로 대체됩니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000),
            access_token_ttl_minutes: parse_or("ACCESS_TOKEN_TTL_MINUTES", 15),
            refresh_token_ttl_days: parse_or("REFRESH_TOKEN_TTL_DAYS", 7),
            auto_approve_content: parse_or("AUTO_APPROVE_CONTENT", true),
            rate_limit_max_requests: parse_or("RATE_LIMIT_MAX_REQUESTS", 30),
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 60),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5),
        })
    }

    /// 테스트와 로컬 실행용 기본 설정
    ///
    /// 환경변수를 건드리지 않고 인메모리 DB와 고정 비밀키를 사용합니다.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-jwt-secret-for-integration-tests-only".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
            auto_approve_content: true,
            rate_limit_max_requests: 1000,
            rate_limit_window_secs: 60,
            db_max_connections: 1,
        }
    }
}

/// 환경변수를 읽어 `T`로 파싱합니다. 없거나 파싱에 실패하면 `default`를 반환합니다.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_missing_or_invalid() {
        assert_eq!(parse_or("FELLOWSHIP_TEST_UNSET_VAR", 42u32), 42);

        env::set_var("FELLOWSHIP_TEST_BAD_PORT", "not-a-number");
        assert_eq!(parse_or("FELLOWSHIP_TEST_BAD_PORT", 3000u16), 3000);

        env::set_var("FELLOWSHIP_TEST_BOOL", " false ");
        assert!(!parse_or("FELLOWSHIP_TEST_BOOL", true));
    }
}
