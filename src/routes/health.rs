//! # 헬스체크 핸들러
//!
//! - `GET /health`, `GET /api/v1/health` → `{ "status": "ok", "database": "ok" | "error" }`
//!
//! 로드밸런서나 컨테이너 헬스체크용입니다. DB에 `SELECT 1`을 보내 연결 상태를 함께 알려줍니다.
//! DB가 응답하지 않아도 HTTP 200을 돌려주어 프로세스 자체는 살아 있음을 알립니다.

use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!("Health check database probe failed: {}", e);
            "error"
        }
    };

    Json(json!({
        "status": "ok",
        "database": database,
    }))
}
