use crate::{
    db::{self, users as db_users},
    error::{is_unique_violation, AppError},
    middleware::auth::{
        create_access_token, create_refresh_token, hash_token, verify_token, AuthUser,
        REFRESH_TOKEN_TYPE,
    },
    models::*,
    services::{password, validation},
    state::AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

/// access/refresh 토큰을 새로 발급하고 refresh 토큰 해시를 저장합니다.
async fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let config = &state.config;
    let access_token =
        create_access_token(&user.id, user.role, config.access_token_ttl_minutes, &config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;
    let refresh_token =
        create_refresh_token(&user.id, user.role, config.refresh_token_ttl_days, &config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    let token_hash = hash_token(&refresh_token);
    let expires_at = (Utc::now() + Duration::days(config.refresh_token_ttl_days))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    db_users::store_refresh_token(&state.pool, &db::new_id(), &user.id, &token_hash, &expires_at)
        .await?;

    Ok(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token,
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let username = req.username.trim();
    state.rate_limiter.check(&format!("register:{}", username.to_lowercase()))?;

    validation::validate_username(username)?;
    validation::validate_password(&req.password)?;
    let email = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    if let Some(email) = email {
        validation::validate_email(email)?;
    }

    if db_users::find_by_username(&state.pool, username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if let Some(email) = email {
        if db_users::find_by_email(&state.pool, email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
    }

    let password_hash = password::hash_password(&req.password)?;

    // 첫 번째 가입자는 관리자가 됩니다.
    let role = if db_users::count_users(&state.pool).await? == 0 {
        Role::Admin
    } else {
        Role::User
    };

    let display_name = req.display_name.as_deref().map(str::trim).filter(|d| !d.is_empty());
    let user = db_users::create_user(
        &state.pool,
        &db::new_id(),
        username,
        email,
        &password_hash,
        display_name,
        role,
    )
    .await
    .map_err(|e| match e {
        AppError::Database(ref db_err) if is_unique_violation(db_err) => {
            AppError::Conflict("Username or email already exists".to_string())
        }
        other => other,
    })?;

    tracing::info!("User registered: {} ({})", user.username, user.role.as_str());

    let response = issue_tokens(&state, user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    state.rate_limiter.check(&format!("login:{}", req.username.trim().to_lowercase()))?;

    let user = db_users::find_by_username(&state.pool, req.username.trim())
        .await?
        .ok_or(AppError::Unauthorized("Invalid username or password".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid username or password".to_string()));
    }

    if !user.is_active {
        return Err(AppError::InactiveAccount);
    }

    Ok(Json(issue_tokens(&state, user).await?))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    verify_token(&req.refresh_token, &state.config.jwt_secret, REFRESH_TOKEN_TYPE)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    // 회전(rotation): 사용한 refresh 토큰은 조회와 동시에 폐기됩니다.
    let token_hash = hash_token(&req.refresh_token);
    let (user_id, expires_at) = db_users::consume_refresh_token(&state.pool, &token_hash)
        .await?
        .ok_or(AppError::Unauthorized("Refresh token not found or revoked".to_string()))?;

    let expires = chrono::NaiveDateTime::parse_from_str(&expires_at, "%Y-%m-%dT%H:%M:%S%.3fZ")
        .map_err(|e| AppError::Internal(format!("Date parse error: {}", e)))?;
    if expires.and_utc() < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    let user = db_users::find_by_id(&state.pool, &user_id)
        .await?
        .ok_or(AppError::Unauthorized("User not found".to_string()))?;
    if !user.is_active {
        return Err(AppError::InactiveAccount);
    }

    Ok(Json(issue_tokens(&state, user).await?))
}

pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    db_users::delete_user_refresh_tokens(&state.pool, &auth_user.user_id).await?;

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = db_users::find_by_id(&state.pool, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}
