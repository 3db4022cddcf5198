//! System settings repository (key/value store)

use crate::{error::AppError, models::settings::SystemSetting};
use sqlx::PgPool;
use uuid::Uuid;

pub struct SettingsRepository {
    db: PgPool,
}

impl SettingsRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find(&self, key: &str) -> Result<Option<SystemSetting>, AppError> {
        let setting =
            sqlx::query_as::<_, SystemSetting>("SELECT * FROM system_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.db)
                .await?;

        Ok(setting)
    }

    /// Upsert a setting, recording who changed it.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
        updated_by: Option<Uuid>,
    ) -> Result<SystemSetting, AppError> {
        let setting = sqlx::query_as::<_, SystemSetting>(
            r#"
            INSERT INTO system_settings (key, value, description, updated_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                updated_at = NOW(),
                updated_by = EXCLUDED.updated_by
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(updated_by)
        .fetch_one(&self.db)
        .await?;

        Ok(setting)
    }

    /// Insert only if the key does not exist yet. Used by the idempotent
    /// bootstrap seed.
    pub async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        description: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<SystemSetting>, AppError> {
        let settings =
            sqlx::query_as::<_, SystemSetting>("SELECT * FROM system_settings ORDER BY key")
                .fetch_all(&self.db)
                .await?;

        Ok(settings)
    }
}
