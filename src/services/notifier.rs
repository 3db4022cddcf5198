//! Outbound chat notifications (Telegram collaborator).
//!
//! Dispatch is always best-effort: it runs after the authoritative state
//! change commits, and every failure is logged and swallowed so it can never
//! roll back or fail the triggering operation.

use crate::{
    config::NotifierConfig,
    error::AppError,
    models::task::{Task, TaskStatus},
    repository::UserRepository,
    services::SettingsService,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::RwLock;

/// Resolved bot credentials, cached until `reload` is called.
#[derive(Debug, Clone, Default)]
struct BotSettings {
    bot_token: Option<String>,
    chat_id: Option<String>,
}

/// Connectivity test result (getMe).
#[derive(Debug, Serialize)]
pub struct TelegramStatus {
    pub success: bool,
    pub message: String,
    pub bot_username: Option<String>,
}

pub struct Notifier {
    db: PgPool,
    http: reqwest::Client,
    fallback: NotifierConfig,
    cached: RwLock<Option<BotSettings>>,
}

impl Notifier {
    pub fn new(db: PgPool, config: NotifierConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            db,
            http,
            fallback: config,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached credentials; the next dispatch re-reads settings.
    /// Invoked after an admin changes the integration configuration.
    pub async fn reload(&self) {
        *self.cached.write().await = None;
        tracing::info!("Notifier settings cache cleared");
    }

    async fn settings(&self) -> BotSettings {
        if let Some(cached) = self.cached.read().await.as_ref() {
            return cached.clone();
        }

        let service = SettingsService::new(self.db.clone());
        let from_store = match service.telegram_settings().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load notifier settings, using env fallback");
                Default::default()
            }
        };

        let resolved = BotSettings {
            bot_token: from_store.bot_token.or_else(|| {
                self.fallback
                    .bot_token
                    .as_ref()
                    .map(|t| t.expose_secret().clone())
            }),
            chat_id: from_store.chat_id.or_else(|| self.fallback.chat_id.clone()),
        };

        *self.cached.write().await = Some(resolved.clone());
        resolved
    }

    /// Send a message to the configured broadcast chat. An unconfigured
    /// notifier is a quiet no-op.
    pub async fn send_message(&self, text: &str) -> Result<(), AppError> {
        let settings = self.settings().await;

        let (Some(token), Some(chat_id)) = (settings.bot_token, settings.chat_id) else {
            tracing::debug!("Notifier not configured, skipping broadcast");
            return Ok(());
        };

        self.post_send_message(&token, &chat_id, text).await
    }

    /// Send a personal message to a user's telegram handle.
    pub async fn send_private_message(
        &self,
        telegram_username: &str,
        text: &str,
    ) -> Result<(), AppError> {
        let settings = self.settings().await;

        let Some(token) = settings.bot_token else {
            tracing::debug!("Notifier not configured, skipping private message");
            return Ok(());
        };

        let username = telegram_username.trim_start_matches('@');
        self.post_send_message(&token, &format!("@{}", username), text)
            .await
    }

    async fn post_send_message(
        &self,
        token: &str,
        chat_id: &str,
        text: &str,
    ) -> Result<(), AppError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", token);

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Notification dispatch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Notification dispatch failed: HTTP {}",
                response.status()
            )));
        }

        tracing::debug!(chat_id = %chat_id, "Notification sent");
        Ok(())
    }

    /// Connectivity test: getMe, returns bot identity on success.
    pub async fn test_connection(&self) -> TelegramStatus {
        let settings = self.settings().await;

        let Some(token) = settings.bot_token else {
            return TelegramStatus {
                success: false,
                message: "Bot token is not configured".to_string(),
                bot_username: None,
            };
        };

        let url = format!("https://api.telegram.org/bot{}/getMe", token);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let body: serde_json::Value = response.json().await.unwrap_or_default();
                let bot_username = body
                    .pointer("/result/username")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());

                TelegramStatus {
                    success: true,
                    message: "Connection established".to_string(),
                    bot_username,
                }
            }
            Ok(response) => TelegramStatus {
                success: false,
                message: format!("HTTP {}", response.status()),
                bot_username: None,
            },
            Err(e) => TelegramStatus {
                success: false,
                message: e.to_string(),
                bot_username: None,
            },
        }
    }

    /// New-task notification: broadcast plus personal messages to active
    /// staff with a telegram handle.
    pub async fn notify_new_task(&self, task: &Task) {
        let message = format_new_task_message(task);

        if let Err(e) = self.send_message(&message).await {
            tracing::warn!(task_number = %task.task_number, error = %e, "Broadcast notification failed");
        }

        let repo = UserRepository::new(self.db.clone());
        let staff = match repo.list_active_staff().await {
            Ok(staff) => staff,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load staff for personal notifications");
                return;
            }
        };

        for user in staff {
            if let Some(handle) = &user.telegram_username {
                if let Err(e) = self.send_private_message(handle, &message).await {
                    tracing::warn!(
                        task_number = %task.task_number,
                        username = %user.username,
                        error = %e,
                        "Personal notification failed"
                    );
                }
            }
        }
    }

    /// Status-change notification: broadcast plus a personal message to the
    /// requester when they have a linked telegram handle.
    pub async fn notify_status_change(&self, task: &Task) {
        let message = format_status_change_message(task);

        if let Err(e) = self.send_message(&message).await {
            tracing::warn!(task_number = %task.task_number, error = %e, "Status notification failed");
        }

        let Some(email) = &task.requester_email else {
            return;
        };

        let repo = UserRepository::new(self.db.clone());
        let requester = match repo.find_by_email(email).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to look up requester for notification");
                return;
            }
        };

        if let Some(handle) = requester.and_then(|u| u.telegram_username) {
            if let Err(e) = self.send_private_message(&handle, &message).await {
                tracing::warn!(
                    task_number = %task.task_number,
                    error = %e,
                    "Requester notification failed"
                );
            }
        }
    }

    /// Periodic reminder summary (overdue and unassigned tasks).
    pub async fn notify_reminder(&self, overdue: &[Task], unassigned: &[Task]) {
        if overdue.is_empty() && unassigned.is_empty() {
            return;
        }

        let message = format_reminder_message(overdue, unassigned);

        if let Err(e) = self.send_message(&message).await {
            tracing::warn!(error = %e, "Reminder notification failed");
        }
    }
}

pub fn status_emoji(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Unassigned => "🆕",
        TaskStatus::InProgress => "🔄",
        TaskStatus::Queued => "⏳",
        TaskStatus::Waiting => "⏸",
        TaskStatus::Done => "✅",
        TaskStatus::Cancelled => "❌",
    }
}

pub fn format_new_task_message(task: &Task) -> String {
    format!(
        "🚨 <b>Новая заявка!</b>\n\n\
         📋 <b>Задача:</b> {}\n\
         🏷 <b>Название:</b> {}\n\
         📝 <b>Тип:</b> {}\n\
         ⚡ <b>Приоритет:</b> {}\n\
         👤 <b>От:</b> {} ({})\n\
         ⏰ <b>Создано:</b> {}",
        task.task_number,
        task.title,
        task.task_type.as_str(),
        task.priority.as_str(),
        task.requester_name,
        task.requester_department,
        task.created_at.format("%d.%m.%Y %H:%M"),
    )
}

pub fn format_status_change_message(task: &Task) -> String {
    format!(
        "{} <b>Изменение статуса задачи</b>\n\n\
         📋 <b>Задача:</b> {}\n\
         🏷 <b>Название:</b> {}\n\
         📊 <b>Статус:</b> {}",
        status_emoji(task.status),
        task.task_number,
        task.title,
        task.status.as_str(),
    )
}

pub fn format_reminder_message(overdue: &[Task], unassigned: &[Task]) -> String {
    let mut message = String::from("⏰ <b>Напоминание</b>\n");

    if !overdue.is_empty() {
        message.push_str(&format!("\n🔥 Просроченных задач: {}\n", overdue.len()));
        for task in overdue.iter().take(10) {
            message.push_str(&format!("  • {} — {}\n", task.task_number, task.title));
        }
    }

    if !unassigned.is_empty() {
        message.push_str(&format!("\n🆕 Неразобранных задач: {}\n", unassigned.len()));
        for task in unassigned.iter().take(10) {
            message.push_str(&format!("  • {} — {}\n", task.task_number, task.title));
        }
    }

    message
}
