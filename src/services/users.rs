//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate user by login and return a JWT token with its claims
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, UserClaims)> {
        let user = self
            .repository
            .users
            .get_by_login(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !user.is_active || !verify_password(&user.password, password)? {
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let permissions = self.repository.users.get_permissions(user.id).await?;

        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.login.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            permissions,
            exp: now + (self.config.jwt_expiration_hours as i64 * 3600),
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!("User {} logged in", user.login);
        Ok((token, claims))
    }

    /// Create a new user
    pub async fn create_user(&self, user: &CreateUser) -> AppResult<User> {
        if self.repository.users.login_exists(&user.login).await? {
            return Err(AppError::Validation("Login already exists".to_string()));
        }

        let hash = hash_password(&user.password)?;
        let created = self.repository.users.create(user, &hash).await?;
        tracing::info!("User {} created", created.login);
        Ok(created)
    }

    /// Create the configured superuser when no account exists yet
    pub async fn bootstrap_superuser(&self) -> AppResult<Option<User>> {
        let (Some(login), Some(password)) = (
            self.config.bootstrap_login.clone(),
            self.config.bootstrap_password.clone(),
        ) else {
            return Ok(None);
        };

        if self.repository.users.count().await? > 0 {
            return Ok(None);
        }

        let user = CreateUser {
            login,
            password,
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            is_staff: true,
            is_superuser: true,
            permissions: Vec::new(),
        };
        self.create_user(&user).await.map(Some)
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "s3cret").unwrap());
        assert!(!verify_password(&hash, "wrong").unwrap());
    }

    #[test]
    fn test_invalid_hash_is_an_error() {
        assert!(verify_password("not-a-hash", "x").is_err());
    }
}
