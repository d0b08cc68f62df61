//! Registration, login, and token refresh over the [`UserStore`] port.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::auth::{JwtKeys, TokenPair};
use crate::domain::errors::WorkflowError;
use crate::domain::order::{Identity, Role};
use crate::domain::ports::UserStore;
use crate::domain::user::{NewUserRecord, UserRecord};

pub struct AuthService<U> {
    users: U,
    keys: JwtKeys,
}

#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user: UserRecord,
    pub tokens: TokenPair,
}

impl<U: UserStore> AuthService<U> {
    pub fn new(users: U, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    /// Public self-registration always produces a CUSTOMER; staff accounts
    /// are provisioned out of band.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> Result<AuthenticatedUser, WorkflowError> {
        let email = email.trim().to_lowercase();
        if self.users.find_by_email(&email)?.is_some() {
            return Err(WorkflowError::EmailAlreadyRegistered);
        }
        let user = self.users.insert(NewUserRecord {
            email,
            password_hash: hash_password(password)?,
            name,
            role: Role::Customer,
        })?;
        let tokens = self.keys.issue_pair(user.id, user.role)?;
        Ok(AuthenticatedUser { user, tokens })
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, WorkflowError> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)?
            .ok_or(WorkflowError::InvalidCredentials)?;
        if !verify_password(password, &user.password_hash) {
            return Err(WorkflowError::InvalidCredentials);
        }
        let tokens = self.keys.issue_pair(user.id, user.role)?;
        Ok(AuthenticatedUser { user, tokens })
    }

    /// Exchange a valid refresh token for a fresh pair. Role is re-read from
    /// the store so a role change takes effect on the next refresh.
    pub fn refresh(&self, refresh_token: &str) -> Result<AuthenticatedUser, WorkflowError> {
        let identity = self.keys.verify_refresh(refresh_token)?;
        let user_id = identity.user_id().ok_or(WorkflowError::Unauthenticated)?;
        let user = self
            .users
            .find_by_id(user_id)?
            .ok_or(WorkflowError::Unauthenticated)?;
        let tokens = self.keys.issue_pair(user.id, user.role)?;
        Ok(AuthenticatedUser { user, tokens })
    }

    pub fn current_user(&self, identity: Identity) -> Result<UserRecord, WorkflowError> {
        let user_id = identity.user_id().ok_or(WorkflowError::Unauthenticated)?;
        self.users
            .find_by_id(user_id)?
            .ok_or(WorkflowError::NotFound { entity: "user" })
    }
}

fn hash_password(password: &str) -> Result<String, WorkflowError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| WorkflowError::StoreUnavailable(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
