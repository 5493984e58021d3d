//! 요청 본문의 얕은(shallow) 검증 함수들

use crate::error::AppError;

pub const MAX_COMMENT_CHARS: usize = 2000;
pub const MAX_POST_CHARS: usize = 10_000;
pub const MAX_TITLE_CHARS: usize = 200;

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(AppError::BadRequest(
            "Username must be between 3 and 32 characters".to_string(),
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::BadRequest(
            "Username may only contain letters, digits and underscores".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };
    if !valid {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

/// 본문을 trim한 뒤 비어 있지 않고 `max_chars` 이하인지 확인하여 정리된 값을 돌려줍니다.
pub fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{} cannot be empty", field)));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(trimmed.to_string())
}
