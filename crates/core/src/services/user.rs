//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use fairway_common::config::AdminConfig;
use fairway_common::{AppError, AppResult, Config, IdGenerator};
use fairway_db::{
    entities::user::{self, Role},
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
    admin: AdminConfig,
}

/// Input for creating an account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 2, max = 20))]
    pub username: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirm_password: String,
}

/// Input for signing in.
#[derive(Debug, Deserialize)]
pub struct SignInInput {
    pub username: String,
    pub password: String,
}

/// A signed-in user and the bearer token of the session.
#[derive(Debug, Serialize)]
pub struct SignedIn {
    pub user: user::Model,
    pub token: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository, config: &Config) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
            admin: config.admin.clone(),
        }
    }

    /// Create an account and sign it in.
    pub async fn register(&self, input: RegisterInput) -> AppResult<SignedIn> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let token = self.id_gen.generate_token();
        let role = if self.admin.is_admin_username(&input.username) {
            Role::Admin
        } else {
            Role::User
        };

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            password_hash: Set(password_hash),
            token: Set(Some(token.clone())),
            role: Set(role),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let user = match self.user_repo.create(model).await {
            Ok(user) => user,
            Err(e) => {
                // Another registration took the name between the check and the insert.
                if self
                    .user_repo
                    .find_by_username(&input.username)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict("Username already taken".to_string()));
                }
                return Err(e);
            }
        };
        info!(user_id = %user.id, username = %user.username, ?role, "Registered user");

        Ok(SignedIn { user, token })
    }

    /// Check credentials and start a new session.
    pub async fn sign_in(&self, input: SignInInput) -> AppResult<SignedIn> {
        let user = self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = self.id_gen.generate_token();
        let user = self.user_repo.set_token(&user.id, Some(token.clone())).await?;

        Ok(SignedIn { user, token })
    }

    /// End the user's session by discarding its token.
    pub async fn sign_out(&self, user_id: &str) -> AppResult<()> {
        self.user_repo.set_token(user_id, None).await?;
        Ok(())
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
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
