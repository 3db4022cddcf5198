//! User domain model, the closed role enumeration and the gate thresholds.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role. Closed enumeration: any other value is rejected at the write
/// boundary, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ItStaff,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ItStaff => "it_staff",
            Role::User => "user",
        }
    }

    /// Whether this role satisfies the given gate. Gates are nested
    /// supersets: Anonymous ⊂ UserOrHigher ⊂ ItStaffOrHigher ⊂ AdminOnly.
    pub fn meets(&self, gate: Gate) -> bool {
        match gate {
            Gate::Anonymous => true,
            Gate::UserOrHigher => true,
            Gate::ItStaffOrHigher => matches!(self, Role::Admin | Role::ItStaff),
            Gate::AdminOnly => matches!(self, Role::Admin),
        }
    }

    /// Derive the capability flags used across the service layer.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_manage_tasks: matches!(self, Role::Admin | Role::ItStaff),
            can_view_analytics: matches!(self, Role::Admin),
            owner_filter_required: matches!(self, Role::User),
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Role::Admin),
            "it_staff" => Ok(Role::ItStaff),
            "user" => Ok(Role::User),
            other => Err(AppError::Validation(format!("Invalid role: {}", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum-role threshold for an operation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Anonymous,
    UserOrHigher,
    ItStaffOrHigher,
    AdminOnly,
}

/// Capability flags derived from a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub can_manage_tasks: bool,
    pub can_view_analytics: bool,
    /// When set, task queries must be restricted to the caller's own tickets
    /// (requester email match).
    pub owner_filter_required: bool,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub department: String,
    /// Stored as text; parsed through `Role::try_from` at the boundary.
    pub role: String,
    pub telegram_username: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Deactivation is a soft flag; users are never hard-deleted.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn role(&self) -> Result<Role, AppError> {
        Role::try_from(self.role.as_str())
    }
}

/// Create user request (admin gate)
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub department: String,
    pub role: String,
    pub telegram_username: Option<String>,
}

/// Update user request (admin gate, allow-listed fields)
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub role: Option<String>,
    pub telegram_username: Option<String>,
    pub is_active: Option<bool>,
}

/// User response (without sensitive data)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub department: String,
    pub role: String,
    pub telegram_username: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            department: user.department,
            role: user.role,
            telegram_username: user.telegram_username,
            is_active: user.is_active,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::ItStaff, Role::User] {
            assert_eq!(Role::try_from(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(Role::try_from("superuser").is_err());
        assert!(Role::try_from("").is_err());
        // Exact match only, no case folding
        assert!(Role::try_from("Admin").is_err());
    }

    #[test]
    fn test_capabilities() {
        let admin = Role::Admin.capabilities();
        assert!(admin.can_manage_tasks);
        assert!(admin.can_view_analytics);
        assert!(!admin.owner_filter_required);

        let staff = Role::ItStaff.capabilities();
        assert!(staff.can_manage_tasks);
        assert!(!staff.can_view_analytics);
        assert!(!staff.owner_filter_required);

        let user = Role::User.capabilities();
        assert!(!user.can_manage_tasks);
        assert!(!user.can_view_analytics);
        assert!(user.owner_filter_required);
    }

    #[test]
    fn test_gates_are_nested() {
        for role in [Role::Admin, Role::ItStaff, Role::User] {
            assert!(role.meets(Gate::Anonymous));
            assert!(role.meets(Gate::UserOrHigher));
        }
        assert!(Role::Admin.meets(Gate::ItStaffOrHigher));
        assert!(Role::ItStaff.meets(Gate::ItStaffOrHigher));
        assert!(!Role::User.meets(Gate::ItStaffOrHigher));

        assert!(Role::Admin.meets(Gate::AdminOnly));
        assert!(!Role::ItStaff.meets(Gate::AdminOnly));
        assert!(!Role::User.meets(Gate::AdminOnly));
    }
}
