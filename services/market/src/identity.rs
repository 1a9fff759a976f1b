//! Registration, login and session resolution

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{MarketError, MarketResult};
use crate::models::{NewUser, User};
use crate::repositories::UserStore;
use crate::session::SessionManager;
use crate::validation::{validate_email, validate_password, validate_username};

/// Registration form input
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Identity operations over the user store and the session store
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    sessions: SessionManager,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserStore>, sessions: SessionManager) -> Self {
        Self { users, sessions }
    }

    /// Register a new user. The user is not logged in.
    pub async fn register(&self, registration: Registration) -> MarketResult<User> {
        let username = registration.username.trim();
        let email = registration.email.trim();

        validate_username(username).map_err(MarketError::Validation)?;
        validate_email(email).map_err(MarketError::Validation)?;
        validate_password(&registration.password, &registration.confirm_password)
            .map_err(MarketError::Validation)?;

        if self.users.exists(username, email).await? {
            info!(username, "Registration rejected: username or email taken");
            return Err(MarketError::Conflict(
                "A user with this username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&registration.password)?;
        let user = self
            .users
            .insert(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!(username = %user.username, "Registered user");
        Ok(user)
    }

    /// Check credentials and open a session, returning the user and the
    /// session token
    pub async fn authenticate(&self, username: &str, password: &str) -> MarketResult<(User, String)> {
        let username = username.trim();

        let Some(user) = self.users.find_by_username(username).await? else {
            info!(username, "Login failed: unknown user");
            return Err(MarketError::Auth);
        };

        if !verify_password(&user, password) {
            info!(username, "Login failed: wrong password");
            return Err(MarketError::Auth);
        }

        let token = self.sessions.create_session(&user.username).await?;
        info!(username = %user.username, "User logged in");
        Ok((user, token))
    }

    /// User bound to a session token, if any
    pub async fn current_session_user(&self, token: &str) -> MarketResult<Option<User>> {
        let Some(username) = self.sessions.get_session(token).await? else {
            return Ok(None);
        };

        let user = self.users.find_by_username(&username).await?;
        if user.is_none() {
            warn!(username = %username, "Session refers to a missing user");
        }
        Ok(user)
    }

    /// End the session behind `token`
    pub async fn logout(&self, token: &str) -> MarketResult<()> {
        self.sessions.delete_session(token).await?;
        info!("Session closed");
        Ok(())
    }
}

/// Hash a password with argon2 and a random salt
pub fn hash_password(password: &str) -> MarketResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| MarketError::Persistence(format!("Failed to hash password: {}", e)))
}

/// Verify a password against the stored hash. The stored value is only ever
/// parsed as an argon2 hash, never compared as text.
fn verify_password(user: &User, password: &str) -> bool {
    let parsed_hash = match PasswordHash::new(&user.password_hash) {
        Ok(hash) => hash,
        Err(e) => {
            error!(username = %user.username, "Stored password hash is unreadable: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
