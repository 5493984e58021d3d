//! # 사용자 / 관리자 사용자 관리 API
//!
//! | 메서드 | 경로 | 권한 | 설명 |
//! |--------|------|------|------|
//! | GET | /users/{id} | 공개 | 공개 프로필 |
//! | PATCH | /users/me | 로그인 | 내 프로필 수정 |
//! | POST | /users/me/password | 로그인 | 비밀번호 변경 |
//! | GET | /admin/users | admin | 사용자 목록 (검색/필터) |
//! | PATCH | /admin/users/{id}/role | admin | 권한 변경 |
//! | PATCH | /admin/users/{id}/status | admin | 활성/비활성 |
//! | DELETE | /admin/users/{id} | admin | 사용자 삭제 |

use crate::{
    db::users as db_users,
    error::{is_unique_violation, AppError},
    middleware::auth::{AdminUser, AuthUser},
    models::*,
    services::{
        pagination::{PageQuery, Paginated},
        password, validation,
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicProfile>, AppError> {
    let user = db_users::find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

pub async fn update_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if let Some(email) = req.email.as_deref() {
        validation::validate_email(email)?;
        if let Some(existing) = db_users::find_by_email(&state.pool, email).await? {
            if existing.id != auth_user.user_id {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }
    }

    let user = db_users::update_profile(&state.pool, &auth_user.user_id, &req)
        .await
        .map_err(|e| match e {
            AppError::Database(ref db_err) if is_unique_violation(db_err) => {
                AppError::Conflict("Email already exists".to_string())
            }
            other => other,
        })?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let user = db_users::find_by_id(&state.pool, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Current password is incorrect".to_string()));
    }
    validation::validate_password(&req.new_password)?;

    let new_hash = password::hash_password(&req.new_password)?;
    db_users::update_password(&state.pool, &user.id, &new_hash).await?;
    // 비밀번호가 바뀌면 다른 기기의 세션을 끊습니다.
    db_users::delete_user_refresh_tokens(&state.pool, &user.id).await?;

    Ok(Json(json!({ "message": "Password updated" })))
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Paginated<UserResponse>>, AppError> {
    if let Some(role) = filter.role.as_deref() {
        role.parse::<Role>().map_err(AppError::BadRequest)?;
    }

    let page = page.resolve();
    let (users, total) = db_users::list_users(&state.pool, &filter, page).await?;

    Ok(Json(
        Paginated::new(users, page, total).map(UserResponse::from),
    ))
}

pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let role: Role = req.role.parse().map_err(AppError::BadRequest)?;
    if id == admin.user_id {
        return Err(AppError::BadRequest("You cannot change your own role".to_string()));
    }

    let user = db_users::set_role(&state.pool, &id, role)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!("User {} role changed to {} by {}", user.id, role.as_str(), admin.user_id);
    Ok(Json(user.into()))
}

pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if id == admin.user_id && !req.is_active {
        return Err(AppError::BadRequest("You cannot deactivate your own account".to_string()));
    }

    let user = db_users::set_active(&state.pool, &id, req.is_active)
        .await?
        .ok_or(AppError::NotFound)?;

    if !req.is_active {
        db_users::delete_user_refresh_tokens(&state.pool, &user.id).await?;
        tracing::info!("User {} deactivated by {}", user.id, admin.user_id);
    } else {
        tracing::info!("User {} reactivated by {}", user.id, admin.user_id);
    }

    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if id == admin.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
    }

    if !db_users::delete_user(&state.pool, &id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("User {} deleted by {}", id, admin.user_id);
    Ok(StatusCode::NO_CONTENT)
}
