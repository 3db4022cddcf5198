//! Authentication service: login, registration, directory fallback.

use crate::{
    auth::jwt::JwtService,
    auth::password::PasswordHasher,
    config::AppConfig,
    error::AppError,
    models::auth::{LoginRequest, LoginResponse},
    models::user::{CreateUserRequest, Role, UpdateUserRequest, User, UserResponse},
    repository::UserRepository,
    services::{Directory, DirectoryProfile, SettingsService},
};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    directory: Arc<dyn Directory>,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        jwt_service: Arc<JwtService>,
        directory: Arc<dyn Directory>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            jwt_service,
            directory,
            config,
        }
    }

    /// Authenticate a user. Local credentials are always checked first;
    /// the directory is a fallback only when the local check fails and the
    /// integration is enabled. Directory failures are logged, never fatal.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        if let Some(user) = user_repo.find_by_username(&req.username).await? {
            if user.is_active {
                let hasher = PasswordHasher::new();
                if hasher.verify(&req.password, &user.password_hash).is_ok() {
                    return self.issue_session(user).await;
                }
            }
        }

        if let Some(user) = self.try_directory_login(&req).await? {
            return self.issue_session(user).await;
        }

        Err(AppError::Unauthorized)
    }

    async fn issue_session(&self, user: User) -> Result<LoginResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());
        user_repo.update_last_login(user.id).await?;

        let access_token = self.jwt_service.generate_access_token(&user)?;

        tracing::info!(user_id = %user.id, username = %user.username, "Login successful");

        Ok(LoginResponse {
            access_token,
            expires_in: self.jwt_service.access_token_exp_secs(),
            user: UserResponse::from(user),
        })
    }

    async fn try_directory_login(&self, req: &LoginRequest) -> Result<Option<User>, AppError> {
        let settings_service = SettingsService::new(self.db.clone());
        let settings = settings_service.directory_settings().await?;

        if !settings.enabled {
            return Ok(None);
        }

        let profile = match self
            .directory
            .authenticate(&req.username, &req.password, &settings)
            .await
        {
            Ok(Some(profile)) => profile,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!(username = %req.username, error = %e, "Directory authentication failed");
                return Ok(None);
            }
        };

        let user_repo = UserRepository::new(self.db.clone());
        match user_repo.find_by_username(&req.username).await? {
            Some(user) if user.is_active => {
                self.refresh_from_profile(&user, &profile).await?;
                // Re-read so the session carries the refreshed fields.
                Ok(user_repo.find_by_id(&user.id).await?)
            }
            Some(_) => Ok(None),
            None if settings.auto_create_users => {
                Ok(Some(self.provision_from_profile(&profile, &settings.default_role).await?))
            }
            None => Ok(None),
        }
    }

    /// Refresh locally stored profile fields that drifted from the
    /// directory.
    async fn refresh_from_profile(
        &self,
        user: &User,
        profile: &DirectoryProfile,
    ) -> Result<(), AppError> {
        let name = if profile.display_name.is_empty() {
            user.name.clone()
        } else {
            profile.display_name.clone()
        };
        let department = profile
            .department
            .clone()
            .unwrap_or_else(|| user.department.clone());

        if name != user.name || department != user.department {
            let user_repo = UserRepository::new(self.db.clone());
            user_repo
                .update_profile_fields(user.id, &name, &department)
                .await?;
            tracing::info!(user_id = %user.id, "Profile refreshed from directory");
        }

        Ok(())
    }

    /// Auto-provision a local account for a directory-authenticated user.
    /// The local password is random; the directory remains the credential
    /// source for such accounts.
    async fn provision_from_profile(
        &self,
        profile: &DirectoryProfile,
        default_role: &str,
    ) -> Result<User, AppError> {
        Role::try_from(default_role)?;

        let random_password: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();

        let hasher = PasswordHasher::new();
        let password_hash = hasher.hash(&random_password)?;

        let req = CreateUserRequest {
            username: profile.username.clone(),
            email: profile
                .email
                .clone()
                .unwrap_or_else(|| format!("{}@company.local", profile.username)),
            password: random_password,
            name: if profile.display_name.is_empty() {
                profile.username.clone()
            } else {
                profile.display_name.clone()
            },
            department: profile
                .department
                .clone()
                .unwrap_or_else(|| "Не указан".to_string()),
            role: default_role.to_string(),
            telegram_username: None,
        };

        let user_repo = UserRepository::new(self.db.clone());
        let user = user_repo
            .create(&req, &password_hash)
            .await
            .map_err(|e| self.map_uniqueness(e))?;

        tracing::info!(user_id = %user.id, username = %user.username, "User auto-provisioned from directory");

        Ok(user)
    }

    /// Register a new local user (admin operation).
    pub async fn register(&self, req: CreateUserRequest) -> Result<User, AppError> {
        // Closed role enumeration: reject anything unknown before any write.
        Role::try_from(req.role.as_str())?;

        if req.username.trim().is_empty() {
            return Err(AppError::validation("Username must not be empty"));
        }
        if req.email.trim().is_empty() {
            return Err(AppError::validation("Email must not be empty"));
        }

        PasswordHasher::validate_password_policy(&req.password, &self.config)?;

        let user_repo = UserRepository::new(self.db.clone());

        if user_repo.find_by_username(&req.username).await?.is_some() {
            return Err(AppError::conflict("A user with this username already exists"));
        }
        if user_repo.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::conflict("A user with this email already exists"));
        }

        let hasher = PasswordHasher::new();
        let password_hash = hasher.hash(&req.password)?;

        let user = user_repo
            .create(&req, &password_hash)
            .await
            .map_err(|e| self.map_uniqueness(e))?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Update a user (admin operation, allow-listed fields).
    pub async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> Result<User, AppError> {
        if let Some(role) = &req.role {
            Role::try_from(role.as_str())?;
        }

        let user_repo = UserRepository::new(self.db.clone());
        let user = user_repo
            .update(id, &req)
            .await
            .map_err(|e| self.map_uniqueness(e))?
            .ok_or_else(|| AppError::not_found("user"))?;

        Ok(user)
    }

    /// Pre-check races still reach the store's unique constraints; surface
    /// them as conflicts, not opaque database errors.
    fn map_uniqueness(&self, e: AppError) -> AppError {
        if e.is_unique_violation() {
            AppError::conflict("Username or email already exists")
        } else {
            e
        }
    }
}
