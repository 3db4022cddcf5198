//! First-run initialization: demo accounts and default settings.
//!
//! Both steps are idempotent. Accounts are only seeded into an empty user
//! table; settings are inserted with on-conflict-do-nothing so admin edits
//! survive restarts.

use crate::{
    auth::password::PasswordHasher,
    error::AppError,
    models::user::CreateUserRequest,
    repository::{SettingsRepository, UserRepository},
};
use sqlx::PgPool;

pub async fn run(db: &PgPool) -> Result<(), AppError> {
    ensure_default_accounts(db).await?;
    ensure_default_settings(db).await?;
    Ok(())
}

/// Seed demo accounts when the user table is empty. Demo passwords must be
/// rotated before any real deployment.
async fn ensure_default_accounts(db: &PgPool) -> Result<(), AppError> {
    let repo = UserRepository::new(db.clone());

    if repo.count().await? > 0 {
        tracing::debug!("Users already exist, skipping account seeding");
        return Ok(());
    }

    let accounts = [
        CreateUserRequest {
            username: "admin".to_string(),
            email: "admin@company.com".to_string(),
            password: "admin123".to_string(),
            name: "Администратор системы".to_string(),
            department: "IT отдел".to_string(),
            role: "admin".to_string(),
            telegram_username: None,
        },
        CreateUserRequest {
            username: "it_staff".to_string(),
            email: "it_staff@company.com".to_string(),
            password: "staff123".to_string(),
            name: "IT Сотрудник".to_string(),
            department: "IT отдел".to_string(),
            role: "it_staff".to_string(),
            telegram_username: None,
        },
        CreateUserRequest {
            username: "user".to_string(),
            email: "user@company.com".to_string(),
            password: "user123".to_string(),
            name: "Демо пользователь".to_string(),
            department: "Отдел продаж".to_string(),
            role: "user".to_string(),
            telegram_username: None,
        },
    ];

    let hasher = PasswordHasher::new();
    for account in &accounts {
        let password_hash = hasher.hash(&account.password)?;
        let user = repo.create(account, &password_hash).await?;
        tracing::info!(username = %user.username, role = %user.role, "Seeded demo account");
    }

    tracing::warn!("Demo accounts created with default passwords, rotate them");

    Ok(())
}

async fn ensure_default_settings(db: &PgPool) -> Result<(), AppError> {
    let repo = SettingsRepository::new(db.clone());

    let defaults = [
        ("telegram_bot_token", "", "Telegram bot token for notifications"),
        ("telegram_chat_id", "", "Broadcast chat/group id for notifications"),
        ("system_name", "Менеджер задач", "System display name"),
        ("company_name", "Компания", "Company display name"),
        ("notification_email", "", "Email for system notifications"),
        ("auto_archive_days", "30", "Archive completed tasks after N days"),
        ("ldap_enabled", "false", "Directory integration toggle"),
        ("ldap_server_url", "", "Directory server URL"),
        ("ldap_port", "389", "Directory server port"),
        ("ldap_use_ssl", "false", "Use SSL for the directory connection"),
        ("ldap_bind_dn", "", "Directory bind DN"),
        ("ldap_bind_password", "", "Directory bind password"),
        ("ldap_user_search_base", "", "Directory user search base"),
        (
            "ldap_user_search_filter",
            "(sAMAccountName={username})",
            "Directory user search filter",
        ),
        ("ldap_auto_create_users", "false", "Auto-provision directory users"),
        ("ldap_default_role", "user", "Role for auto-provisioned users"),
    ];

    for (key, value, description) in defaults {
        repo.set_if_absent(key, value, description).await?;
    }

    tracing::debug!("Default settings ensured");

    Ok(())
}
