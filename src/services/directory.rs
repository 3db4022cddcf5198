//! Directory-service collaborator seam.
//!
//! The wire protocol (LDAP/Active Directory) is not implemented here; the
//! core consumes this trait. Login falls back to the directory only when
//! local credentials fail and the integration is enabled.

use crate::{error::AppError, services::settings_service::DirectorySettings};
use async_trait::async_trait;
use serde::Serialize;

/// Normalized profile returned by a successful directory authentication.
#[derive(Debug, Clone)]
pub struct DirectoryProfile {
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
}

/// Connectivity test result.
#[derive(Debug, Serialize)]
pub struct DirectoryStatus {
    pub success: bool,
    pub message: String,
    pub server_info: Option<String>,
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Check credentials against the directory. `Ok(None)` means the
    /// directory rejected them; `Err` means the directory itself failed
    /// (never fatal to login).
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        settings: &DirectorySettings,
    ) -> Result<Option<DirectoryProfile>, AppError>;

    async fn test_connection(&self, settings: &DirectorySettings) -> DirectoryStatus;
}

/// Stand-in used when no directory backend is wired up. Authenticates
/// nobody and reports the integration as unavailable.
pub struct DisabledDirectory;

#[async_trait]
impl Directory for DisabledDirectory {
    async fn authenticate(
        &self,
        _username: &str,
        _password: &str,
        _settings: &DirectorySettings,
    ) -> Result<Option<DirectoryProfile>, AppError> {
        Ok(None)
    }

    async fn test_connection(&self, _settings: &DirectorySettings) -> DirectoryStatus {
        DirectoryStatus {
            success: false,
            message: "No directory backend is configured".to_string(),
            server_info: None,
        }
    }
}
