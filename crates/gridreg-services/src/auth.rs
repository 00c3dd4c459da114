// crates/gridreg-services/src/auth.rs
// ============================================================================
// Module: Authentication Service
// Description: Accounts, password hashing, login sessions, role management.
// Purpose: Gate user management behind role capabilities.
// Dependencies: gridreg-config, gridreg-core, gridreg-store-sqlite, rand, sha2, subtle
// ============================================================================

//! ## Overview
//! Passwords are hashed with an iterated salted SHA-256 construction encoded
//! as `v1$<iterations>$<salt>$<digest>` and verified in constant time.
//! Login failures are uniform: an unknown username and a wrong password
//! produce the same message. Successful logins issue a signed, time-limited
//! session token. User management requires the manage-users capability.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use gridreg_config::AuthConfig;
use gridreg_core::Capability;
use gridreg_core::Role;
use gridreg_core::ServiceError;
use gridreg_core::ServiceResult;
use gridreg_core::User;
use gridreg_core::UserId;
use gridreg_store_sqlite::Store;
use gridreg_store_sqlite::StoreError;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::info;
use tracing::warn;

use crate::token::SessionClaims;
use crate::token::TokenSigner;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Password hash format version tag.
const HASH_VERSION: &str = "v1";
/// Salt length in bytes.
const SALT_LEN: usize = 16;
/// Uniform login failure message.
const LOGIN_FAILED: &str = "invalid username or password";

// ============================================================================
// SECTION: Password Hashing
// ============================================================================

/// Hashes a password with a fresh random salt.
fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0_u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let digest = iterate_digest(password, &salt, iterations);
    format!(
        "{HASH_VERSION}${iterations}${}${}",
        BASE64.encode(salt),
        BASE64.encode(digest)
    )
}

/// Runs the iterated salted digest.
fn iterate_digest(password: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut state = [0_u8; 32];
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    state.copy_from_slice(&hasher.finalize());
    for _ in 1..iterations {
        let mut round = Sha256::new();
        round.update(salt);
        round.update(state);
        state.copy_from_slice(&round.finalize());
    }
    state
}

/// Verifies a password against a stored hash in constant time.
fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(version), Some(iterations), Some(salt), Some(digest)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if version != HASH_VERSION || parts.next().is_some() {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt), BASE64.decode(digest)) else {
        return false;
    };
    let actual = iterate_digest(password, &salt, iterations.max(1));
    actual.ct_eq(expected.as_slice()).into()
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    /// Authenticated user.
    pub user: User,
    /// Signed session token.
    pub token: String,
}

/// Returns the current unix time in seconds.
fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Authentication and user management service.
pub struct AuthService<'a> {
    /// Backing store.
    store: &'a Store,
    /// Auth configuration.
    config: &'a AuthConfig,
    /// Session token signer.
    signer: TokenSigner,
}

impl<'a> AuthService<'a> {
    /// Creates the service; the signer derives from the configured secret.
    #[must_use]
    pub fn new(store: &'a Store, config: &'a AuthConfig) -> Self {
        Self {
            store,
            config,
            signer: TokenSigner::from_secret(&config.secret),
        }
    }

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Duplicate`] when the username exists and
    /// [`ServiceError::Validation`] for empty credentials.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
        role: Role,
    ) -> ServiceResult<User> {
        if username.trim().is_empty() {
            return Err(ServiceError::Validation("username is required".to_string()));
        }
        if password.is_empty() {
            return Err(ServiceError::Validation("password is required".to_string()));
        }
        let hash = hash_password(password, self.config.hash_iterations);
        let user = self
            .store
            .insert_user(username.trim(), &hash, email, role)
            .map_err(|err| match err {
                StoreError::Constraint(_) => {
                    ServiceError::Duplicate(format!("username '{username}' already exists"))
                }
                other => ServiceError::Storage(other.to_string()),
            })?;
        info!(username = %user.username, "user registered");
        Ok(user)
    }

    /// Verifies credentials and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Permission`] with a uniform message for an
    /// unknown username or a wrong password.
    pub fn login(&self, username: &str, password: &str) -> ServiceResult<LoginSession> {
        let user = self
            .store
            .user_by_username(username)
            .map_err(|err| ServiceError::Storage(err.to_string()))?;
        let Some(user) = user else {
            warn!(username, "login failed: unknown user");
            return Err(ServiceError::Permission(LOGIN_FAILED.to_string()));
        };
        if !verify_password(password, &user.password_hash) {
            warn!(username, "login failed: bad password");
            return Err(ServiceError::Permission(LOGIN_FAILED.to_string()));
        }
        let ttl_seconds = i64::try_from(self.config.token_ttl_minutes)
            .unwrap_or(i64::MAX / 60)
            .saturating_mul(60);
        let claims = SessionClaims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: now_unix().saturating_add(ttl_seconds),
        };
        let token = self.signer.issue(&claims)?;
        info!(username = %user.username, "login succeeded");
        Ok(LoginSession { user, token })
    }

    /// Verifies a session token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Permission`] for invalid or expired tokens.
    pub fn verify_session(&self, token: &str) -> ServiceResult<SessionClaims> {
        self.signer.verify(token, now_unix())
    }

    /// Changes a password after verifying the old one.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an unknown user and
    /// [`ServiceError::Permission`] for a wrong old password.
    pub fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        if new_password.is_empty() {
            return Err(ServiceError::Validation("new password is required".to_string()));
        }
        let user = self
            .store
            .user_by_username(username)
            .map_err(|err| ServiceError::Storage(err.to_string()))?
            .ok_or_else(|| ServiceError::NotFound(format!("user '{username}'")))?;
        if !verify_password(old_password, &user.password_hash) {
            return Err(ServiceError::Permission("old password is incorrect".to_string()));
        }
        let hash = hash_password(new_password, self.config.hash_iterations);
        self.store
            .update_user_password(user.id, &hash)
            .map_err(|err| ServiceError::Storage(err.to_string()))?;
        info!(username = %user.username, "password changed");
        Ok(())
    }

    /// Lists all users; requires the manage-users capability.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Permission`] when the actor cannot manage
    /// users.
    pub fn list_users(&self, actor: &User) -> ServiceResult<Vec<User>> {
        self.require_manage_users(actor)?;
        self.store.list_users().map_err(|err| ServiceError::Storage(err.to_string()))
    }

    /// Updates a user's role; requires the manage-users capability.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an unknown user.
    pub fn update_user_role(&self, actor: &User, user_id: UserId, role: Role) -> ServiceResult<()> {
        self.require_manage_users(actor)?;
        self.store.update_user_role(user_id, role).map_err(|err| match err {
            StoreError::NotFound(message) => ServiceError::NotFound(message),
            other => ServiceError::Storage(other.to_string()),
        })
    }

    /// Deletes a user; the actor cannot delete their own account.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] on self-deletion and
    /// [`ServiceError::NotFound`] for an unknown user.
    pub fn delete_user(&self, actor: &User, user_id: UserId) -> ServiceResult<()> {
        self.require_manage_users(actor)?;
        if actor.id == user_id {
            return Err(ServiceError::Validation(
                "cannot delete the currently signed-in user".to_string(),
            ));
        }
        self.store.delete_user(user_id).map_err(|err| match err {
            StoreError::NotFound(message) => ServiceError::NotFound(message),
            other => ServiceError::Storage(other.to_string()),
        })
    }

    /// Requires the manage-users capability on the actor.
    fn require_manage_users(&self, actor: &User) -> ServiceResult<()> {
        if actor.role.allows(Capability::ManageUsers) {
            Ok(())
        } else {
            Err(ServiceError::Permission(format!(
                "role {} cannot manage users",
                actor.role
            )))
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::hash_password;
    use super::verify_password;

    #[test]
    fn hash_round_trips_and_salts_differ() {
        let first = hash_password("hunter2", 1_000);
        let second = hash_password("hunter2", 1_000);
        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
        assert!(!verify_password("hunter3", &first));
    }

    #[test]
    fn malformed_stored_hashes_never_verify() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "v1$notanumber$AA$AA"));
        assert!(!verify_password("x", "v2$1000$AA$AA"));
    }
}
