use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::db::users as db_users;
use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

pub const ACCESS_TOKEN_TYPE: &str = "access";
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub role: Role,
    /// "access" | "refresh"
    pub typ: String,
    pub exp: i64,
    pub iat: i64,
    /// 같은 초에 발급된 refresh 토큰도 서로 다른 해시를 갖도록 넣는 고유값
    #[serde(default)]
    pub jti: String,
}

/// 로그인한 사용자
///
/// 토큰 검증 후 DB에서 현재 권한과 활성 상태를 다시 읽습니다.
/// 토큰 발급 이후 권한이 바뀌거나 정지된 경우 즉시 반영됩니다.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    /// 작성자 본인이거나 검토 권한(moderator/admin)이 있으면 true
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.user_id == owner_id || self.role.can_moderate()
    }

    pub fn ensure_can_modify(&self, owner_id: &str) -> Result<(), AppError> {
        if self.can_modify(owner_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to modify this resource".to_string(),
            ))
        }
    }

    pub fn ensure_owner(&self, owner_id: &str) -> Result<(), AppError> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("Only the author can edit this resource".to_string()))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        authenticate(token, state).await
    }
}

/// 토큰 문자열로 사용자를 확인합니다. WebSocket처럼 헤더를 쓸 수 없는 경로에서도 사용합니다.
pub async fn authenticate(token: &str, state: &AppState) -> Result<AuthUser, AuthError> {
    let claims = verify_token(token, &state.config.jwt_secret, ACCESS_TOKEN_TYPE)?;

    let (role, is_active) = db_users::find_auth_status(&state.pool, &claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load auth status: {}", e);
            AuthError::Internal
        })?
        .ok_or(AuthError::InvalidToken)?;

    if !is_active {
        return Err(AuthError::InactiveAccount);
    }

    Ok(AuthUser {
        user_id: claims.sub,
        role,
    })
}

/// 로그인은 선택 사항인 엔드포인트용
///
/// Authorization 헤더가 없으면 `None`, 있는데 유효하지 않으면 401로 거절합니다.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.user_id.as_str())
    }

    pub fn can_moderate(&self) -> bool {
        self.0.as_ref().is_some_and(|u| u.role.can_moderate())
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|u| u.role.is_admin())
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        AuthUser::from_request_parts(parts, state)
            .await
            .map(|user| MaybeAuthUser(Some(user)))
    }
}

/// moderator 또는 admin
#[derive(Debug, Clone)]
pub struct ModeratorUser(pub AuthUser);

impl FromRequestParts<AppState> for ModeratorUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.can_moderate() {
            return Err(AuthError::Forbidden);
        }
        Ok(ModeratorUser(user))
    }
}

#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AuthError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    InactiveAccount,
    Forbidden,
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Authorization token is required",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid authorization token",
            ),
            AuthError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                "expired_token",
                "Authorization token has expired",
            ),
            AuthError::InactiveAccount => (
                StatusCode::FORBIDDEN,
                "inactive_account",
                "This account has been deactivated",
            ),
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "You do not have permission to perform this action",
            ),
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred",
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn create_token(
    user_id: &str,
    role: Role,
    typ: &str,
    ttl: Duration,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        typ: typ.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        jti: uuid::Uuid::now_v7().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn create_access_token(
    user_id: &str,
    role: Role,
    ttl_minutes: i64,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    create_token(user_id, role, ACCESS_TOKEN_TYPE, Duration::minutes(ttl_minutes), secret)
}

pub fn create_refresh_token(
    user_id: &str,
    role: Role,
    ttl_days: i64,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    create_token(user_id, role, REFRESH_TOKEN_TYPE, Duration::days(ttl_days), secret)
}

/// 서명과 만료를 검증하고, 토큰 종류(`typ`)가 기대값과 같은지 확인합니다.
pub fn verify_token(token: &str, secret: &str, expected_typ: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })?;

    if token_data.claims.typ != expected_typ {
        return Err(AuthError::InvalidToken);
    }

    Ok(token_data.claims)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
