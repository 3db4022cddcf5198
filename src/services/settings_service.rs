//! System settings service: typed access to the key/value store.

use crate::{
    error::AppError,
    models::settings::{DirectorySettingsRequest, SystemSetting, TelegramSettingsRequest},
    models::user::Role,
    repository::SettingsRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Chat notifier configuration as stored in system_settings.
#[derive(Debug, Clone, Default)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

/// Directory (LDAP) integration configuration as stored in system_settings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DirectorySettings {
    pub enabled: bool,
    pub server_url: String,
    pub port: u16,
    pub use_ssl: bool,
    pub bind_dn: String,
    pub bind_password: String,
    pub user_search_base: String,
    pub user_search_filter: String,
    pub auto_create_users: bool,
    pub default_role: String,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            server_url: String::new(),
            port: 389,
            use_ssl: false,
            bind_dn: String::new(),
            bind_password: String::new(),
            user_search_base: String::new(),
            user_search_filter: "(sAMAccountName={username})".to_string(),
            auto_create_users: false,
            default_role: "user".to_string(),
        }
    }
}

pub struct SettingsService {
    db: PgPool,
}

impl SettingsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str, default: &str) -> Result<String, AppError> {
        let repo = SettingsRepository::new(self.db.clone());
        let setting = repo.find(key).await?;

        Ok(setting
            .and_then(|s| s.value)
            .unwrap_or_else(|| default.to_string()))
    }

    pub async fn get_optional(&self, key: &str) -> Result<Option<String>, AppError> {
        let repo = SettingsRepository::new(self.db.clone());
        let setting = repo.find(key).await?;

        Ok(setting.and_then(|s| s.value).filter(|v| !v.is_empty()))
    }

    pub async fn set(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
        updated_by: Option<Uuid>,
    ) -> Result<SystemSetting, AppError> {
        let repo = SettingsRepository::new(self.db.clone());
        repo.set(key, value, description, updated_by).await
    }

    pub async fn list(&self) -> Result<Vec<SystemSetting>, AppError> {
        let repo = SettingsRepository::new(self.db.clone());
        repo.list().await
    }

    pub async fn telegram_settings(&self) -> Result<TelegramSettings, AppError> {
        Ok(TelegramSettings {
            bot_token: self.get_optional("telegram_bot_token").await?,
            chat_id: self.get_optional("telegram_chat_id").await?,
        })
    }

    pub async fn save_telegram_settings(
        &self,
        req: &TelegramSettingsRequest,
        updated_by: Uuid,
    ) -> Result<(), AppError> {
        self.set(
            "telegram_bot_token",
            &req.bot_token,
            Some("Telegram bot token for notifications"),
            Some(updated_by),
        )
        .await?;
        self.set(
            "telegram_chat_id",
            &req.chat_id,
            Some("Broadcast chat/group id for notifications"),
            Some(updated_by),
        )
        .await?;

        Ok(())
    }

    pub async fn directory_settings(&self) -> Result<DirectorySettings, AppError> {
        let defaults = DirectorySettings::default();

        Ok(DirectorySettings {
            enabled: self.get("ldap_enabled", "false").await? == "true",
            server_url: self.get("ldap_server_url", "").await?,
            port: self
                .get("ldap_port", "389")
                .await?
                .parse()
                .unwrap_or(defaults.port),
            use_ssl: self.get("ldap_use_ssl", "false").await? == "true",
            bind_dn: self.get("ldap_bind_dn", "").await?,
            bind_password: self.get("ldap_bind_password", "").await?,
            user_search_base: self.get("ldap_user_search_base", "").await?,
            user_search_filter: self
                .get("ldap_user_search_filter", &defaults.user_search_filter)
                .await?,
            auto_create_users: self.get("ldap_auto_create_users", "false").await? == "true",
            default_role: self.get("ldap_default_role", "user").await?,
        })
    }

    pub async fn save_directory_settings(
        &self,
        req: &DirectorySettingsRequest,
        updated_by: Uuid,
    ) -> Result<(), AppError> {
        // The default role must be one of the closed role tags.
        Role::try_from(req.default_role.as_str())?;

        let by = Some(updated_by);
        let enabled = if req.enabled { "true" } else { "false" };
        let use_ssl = if req.use_ssl { "true" } else { "false" };
        let auto_create = if req.auto_create_users { "true" } else { "false" };

        self.set("ldap_enabled", enabled, None, by).await?;
        self.set("ldap_server_url", &req.server_url, None, by).await?;
        self.set("ldap_port", &req.port.to_string(), None, by).await?;
        self.set("ldap_use_ssl", use_ssl, None, by).await?;
        self.set("ldap_bind_dn", &req.bind_dn, None, by).await?;
        self.set("ldap_bind_password", &req.bind_password, None, by)
            .await?;
        self.set("ldap_user_search_base", &req.user_search_base, None, by)
            .await?;
        self.set("ldap_user_search_filter", &req.user_search_filter, None, by)
            .await?;
        self.set("ldap_auto_create_users", auto_create, None, by)
            .await?;
        self.set("ldap_default_role", &req.default_role, None, by)
            .await?;

        Ok(())
    }
}
