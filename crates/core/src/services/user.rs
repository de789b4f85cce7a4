//! User service.

use crate::services::mail::MailService;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use atelier_common::{AppError, AppResult, IdGenerator};
use atelier_db::{
    entities::{user, user_profile},
    repositories::{UserProfileRepository, UserRepository},
};
use chrono::{Duration, Utc};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// How long a password-reset token stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// User service for account management and authentication.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    mail: MailService,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 256))]
    pub name: Option<String>,
}

/// Input for updating account fields.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(max = 256))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,
}

/// Input for replacing the stored payment card.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCardInput {
    #[validate(length(min = 12, max = 19))]
    pub card_number: String,

    #[validate(length(min = 1, max = 255))]
    pub card_holder: String,

    /// `MM/YY` or `MM/YYYY`.
    #[validate(length(min = 5, max = 7))]
    pub card_expiry: String,
}

/// Input for notification preferences. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateNotificationsInput {
    pub chat_notifications: Option<bool>,
    pub new_models_notifications: Option<bool>,
}

/// Input for changing a password while logged in.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordInput {
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        mail: MailService,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            mail,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user with a trial profile and a fresh access token.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(Some(input.email)),
            token: Set(Some(token)),
            name: Set(input.name),
            is_admin: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(user_model).await?;

        let profile_model = user_profile::ActiveModel {
            user_id: Set(user_id),
            password: Set(Some(password_hash)),
            subscription_type: Set(user_profile::SubscriptionTier::Trial),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.profile_repo.create(profile_model).await?;

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    /// Get a user's profile.
    pub async fn get_profile(&self, user_id: &str) -> AppResult<user_profile::Model> {
        self.profile_repo
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    /// Authenticate a user by access token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let profile = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let password_hash = profile.password.ok_or(AppError::Unauthorized)?;
        if !verify_password(password, &password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Regenerate a user's access token, invalidating the old one.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(new_token.clone()));
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await?;

        Ok(new_token)
    }

    /// Update account fields.
    pub async fn update(&self, user_id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if let Some(ref email) = input.email {
            if let Some(existing) = self.user_repo.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
            }
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            active.name = Set(Some(name));
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Replace the stored payment card.
    pub async fn update_card(
        &self,
        user_id: &str,
        input: UpdateCardInput,
    ) -> AppResult<user_profile::Model> {
        input.validate()?;

        let profile = self.get_profile(user_id).await?;
        let mut active: user_profile::ActiveModel = profile.into();
        active.card_number = Set(input.card_number);
        active.card_holder = Set(input.card_holder);
        active.card_expiry = Set(input.card_expiry);
        active.updated_at = Set(Some(Utc::now().into()));

        self.profile_repo.update(active).await
    }

    /// Update notification preferences.
    pub async fn update_notifications(
        &self,
        user_id: &str,
        input: UpdateNotificationsInput,
    ) -> AppResult<user_profile::Model> {
        let profile = self.get_profile(user_id).await?;
        let mut active: user_profile::ActiveModel = profile.into();

        if let Some(chat) = input.chat_notifications {
            active.chat_notifications = Set(chat);
        }
        if let Some(new_models) = input.new_models_notifications {
            active.new_models_notifications = Set(new_models);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.profile_repo.update(active).await
    }

    /// Change a password after verifying the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        input: ChangePasswordInput,
    ) -> AppResult<()> {
        input.validate()?;

        let profile = self.get_profile(user_id).await?;

        let current_hash = profile
            .password
            .clone()
            .ok_or_else(|| AppError::BadRequest("No password set".to_string()))?;
        if !verify_password(&input.current_password, &current_hash)? {
            return Err(AppError::Unauthorized);
        }

        let new_hash = hash_password(&input.new_password)?;

        let mut active: user_profile::ActiveModel = profile.into();
        active.password = Set(Some(new_hash));
        active.updated_at = Set(Some(Utc::now().into()));
        self.profile_repo.update(active).await?;

        Ok(())
    }

    /// Start a password reset for the account behind `email`.
    ///
    /// Unknown addresses are a 404. Mail delivery failures are logged,
    /// not surfaced.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("No account with that email".to_string()))?;

        let profile = self.get_profile(&user.id).await?;

        let token = self.id_gen.generate_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

        let mut active: user_profile::ActiveModel = profile.into();
        active.password_reset_token = Set(Some(token.clone()));
        active.password_reset_expires_at = Set(Some(expires_at.into()));
        active.updated_at = Set(Some(Utc::now().into()));
        self.profile_repo.update(active).await?;

        if let Err(e) = self.mail.send_password_reset(email, &token).await {
            tracing::warn!(error = %e, "Failed to send password reset mail");
        }

        Ok(())
    }

    /// Complete a password reset with a previously issued token.
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> AppResult<()> {
        if new_password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let profile = self
            .profile_repo
            .find_by_reset_token(token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let expired = profile
            .password_reset_expires_at
            .is_none_or(|expires| expires < Utc::now());
        if expired {
            return Err(AppError::BadRequest(
                "Invalid or expired reset token".to_string(),
            ));
        }

        let new_hash = hash_password(new_password)?;

        let mut active: user_profile::ActiveModel = profile.into();
        active.password = Set(Some(new_hash));
        active.password_reset_token = Set(None);
        active.password_reset_expires_at = Set(None);
        active.updated_at = Set(Some(Utc::now().into()));
        self.profile_repo.update(active).await?;

        Ok(())
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: Some(format!("{username}@example.com")),
            token: Some("test_token".to_string()),
            name: Some("Test User".to_string()),
            is_admin: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(
        user_db: Arc<sea_orm::DatabaseConnection>,
        profile_db: Arc<sea_orm::DatabaseConnection>,
    ) -> UserService {
        let user_repo = UserRepository::new(user_db);
        let profile_repo = UserProfileRepository::new(profile_db);
        let mail = MailService::new(None, "https://example.com").unwrap();
        UserService::new(user_repo, profile_repo, mail)
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(verify_password("test_password_123", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("test", "invalid_hash").is_err());
    }

    #[test]
    fn test_hash_password_different_each_time() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("same_password", &hash1).unwrap());
        assert!(verify_password("same_password", &hash2).unwrap());
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(user_db, profile_db);

        let result = service.get("nonexistent").await;
        match result {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected UserNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_by_token_found() {
        let user = create_test_user("user1", "testuser");

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(user_db, profile_db);

        let result = service.authenticate_by_token("test_token").await.unwrap();
        assert_eq!(result.id, "user1");
    }

    #[tokio::test]
    async fn test_authenticate_by_token_not_found() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(user_db, profile_db);

        let result = service.authenticate_by_token("invalid").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterInput {
            username: "a".repeat(200),
            email: "a@example.com".to_string(),
            password: "password123".to_string(),
            name: None,
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "testuser".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
            name: None,
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password: "short".to_string(),
            name: None,
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
            name: Some("Test User".to_string()),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_card_input_validation() {
        let input = UpdateCardInput {
            card_number: "123".to_string(),
            card_holder: "A HOLDER".to_string(),
            card_expiry: "12/30".to_string(),
        };
        assert!(input.validate().is_err());

        let input = UpdateCardInput {
            card_number: "4242424242424242".to_string(),
            card_holder: "A HOLDER".to_string(),
            card_expiry: "12/30".to_string(),
        };
        assert!(input.validate().is_ok());
    }
}
