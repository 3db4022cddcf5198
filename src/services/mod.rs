//! Service layer

pub mod analytics_service;
pub mod auth_service;
pub mod directory;
pub mod notifier;
pub mod reminder;
pub mod settings_service;
pub mod task_service;

pub use analytics_service::AnalyticsService;
pub use auth_service::AuthService;
pub use directory::{Directory, DirectoryProfile, DirectoryStatus, DisabledDirectory};
pub use notifier::Notifier;
pub use reminder::ReminderLoop;
pub use settings_service::SettingsService;
pub use task_service::TaskService;
