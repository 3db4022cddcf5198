//! System settings: a key/value configuration store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single configuration record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SystemSetting {
    pub id: Uuid,
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// Set setting request
#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

/// Chat notifier settings (admin gate)
#[derive(Debug, Deserialize)]
pub struct TelegramSettingsRequest {
    pub bot_token: String,
    pub chat_id: String,
}

/// Directory integration settings (admin gate)
#[derive(Debug, Deserialize)]
pub struct DirectorySettingsRequest {
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
