use std::sync::OnceLock;

use chrono::Utc;
use log::info;
use regex::Regex;
use uuid::Uuid;

use crate::{
    dto::{AuthUserResponse, LoginUserRequest, NewUserDto},
    errors::{ApiError, FieldErrors},
    models::{User, UserProfile},
    AppState,
};

use super::crypto;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"))
        .is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> ApiError {
    ApiError::BadRequest("Invalid credentials".to_string())
}

pub async fn create(dto: NewUserDto, state: &AppState) -> Result<AuthUserResponse, ApiError> {
    let name = dto.name.trim().to_string();
    let email = normalize_email(&dto.email);

    let mut errors = FieldErrors::new();
    if name.is_empty() {
        errors.insert("name", "Name is required".to_string());
    }
    if !is_valid_email(&email) {
        errors.insert("email", "Please enter a valid email".to_string());
    }
    if dto.password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert("password", format!("Password must be at least {MIN_PASSWORD_LEN} characters long"));
    }
    ApiError::check(errors)?;

    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let user = state
        .store
        .create_user(User {
            id: Uuid::new_v4(),
            name,
            email,
            pwd_hash: crypto::hash_password(&dto.password),
            created_at: Utc::now(),
        })
        .await?;
    info!("user {} registered", user.id);

    let token = state.tokens.issue(user.id, &user.name)?;
    Ok(AuthUserResponse {
        token,
        user: UserProfile::from(&user),
    })
}

pub async fn login(req: LoginUserRequest, state: &AppState) -> Result<AuthUserResponse, ApiError> {
    let email = normalize_email(&req.email);
    let mut errors = FieldErrors::new();
    if !is_valid_email(&email) {
        errors.insert("email", "Please enter a valid email".to_string());
    }
    if req.password.is_empty() {
        errors.insert("password", "Password is required".to_string());
    }
    ApiError::check(errors)?;

    let user = state
        .store
        .get_user_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;
    if !crypto::verify_password(&req.password, &user.pwd_hash) {
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(user.id, &user.name)?;
    Ok(AuthUserResponse {
        token,
        user: UserProfile::from(&user),
    })
}

pub async fn get_by_id(id: Uuid, state: &AppState) -> Result<UserProfile, ApiError> {
    state
        .store
        .get_user_by_id(id)
        .await?
        .map(|user| UserProfile::from(&user))
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("nope"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email(""));
    }
}
