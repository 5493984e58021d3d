//! # Fellowship API 서버 진입점
//!
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성과 마이그레이션
//! 4. 공유 상태(`AppState`)와 라우터 구성
//! 5. HTTP 서버 시작
//!
//! 핸들러와 도메인 로직은 라이브러리 크레이트(`fellowship`)에 있고,
//! 이 파일은 조립과 실행만 담당합니다. 통합 테스트도 같은 `routes::router`를 사용합니다.

use anyhow::Result;
use fellowship::{config::Config, db, routes, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일이 없어도 시스템 환경변수로 계속 진행합니다.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fellowship=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting Fellowship server on {}:{}", config.host, config.port);

    let pool = db::connect(&config.database_url, config.db_max_connections).await?;

    tracing::info!("Running database migrations...");
    db::migrate(&pool).await?;

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(pool, config);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
