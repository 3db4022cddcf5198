//! User repository (database access layer)

use crate::{error::AppError, models::user::*};
use sqlx::PgPool;
use uuid::Uuid;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// Create a user. The role tag is validated upstream; the unique
    /// constraints on username/email surface as a database error the
    /// service maps to Conflict.
    pub async fn create(
        &self,
        req: &CreateUserRequest,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, name, department, role, telegram_username, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.name)
        .bind(&req.department)
        .bind(&req.role)
        .bind(&req.telegram_username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    /// Apply an allow-listed update. Absent fields keep their value.
    pub async fn update(&self, id: Uuid, req: &UpdateUserRequest) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                department = COALESCE($4, department),
                role = COALESCE($5, role),
                telegram_username = COALESCE($6, telegram_username),
                is_active = COALESCE($7, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.email)
        .bind(&req.name)
        .bind(&req.department)
        .bind(&req.role)
        .bind(&req.telegram_username)
        .bind(req.is_active)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Soft deactivation. Users are never hard-deleted.
    pub async fn deactivate(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_last_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    pub async fn update_profile_fields(
        &self,
        id: Uuid,
        name: &str,
        department: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET name = $2, department = $3 WHERE id = $1")
            .bind(id)
            .bind(name)
            .bind(department)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.db)
            .await?;

        Ok(users)
    }

    /// Active staff accounts (admin and it_staff), used for personal
    /// notification fan-out.
    pub async fn list_active_staff(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role IN ('admin', 'it_staff') AND is_active = TRUE",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;

        Ok(count.0)
    }
}
