//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::user::{CreateUser, User},
};

const USER_COLUMNS: &str = "id, login, password, first_name, last_name, email, \
                            is_staff, is_superuser, is_active, date_joined";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Get user by login (case-insensitive)
    pub async fn get_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE LOWER(login) = LOWER($1)",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn login_exists(&self, login: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(login) = LOWER($1))",
        )
        .bind(login)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Permission codenames granted to a user
    pub async fn get_permissions(&self, user_id: i32) -> AppResult<Vec<String>> {
        let permissions: Vec<String> = sqlx::query_scalar(
            "SELECT codename FROM user_permissions WHERE user_id = $1 ORDER BY codename",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    /// Create a user and grant its permissions in one transaction
    pub async fn create(&self, user: &CreateUser, password_hash: &str) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO users (login, password, first_name, last_name, email, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&query)
            .bind(&user.login)
            .bind(password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .fetch_one(&mut *tx)
            .await?;

        if !user.permissions.is_empty() {
            sqlx::query(
                "INSERT INTO user_permissions (user_id, codename) SELECT $1, UNNEST($2::varchar[]) ON CONFLICT DO NOTHING",
            )
            .bind(created.id)
            .bind(&user.permissions)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }
}
