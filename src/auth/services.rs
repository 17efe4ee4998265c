use std::sync::Arc;

use anyhow::Context;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        error::AuthError,
        jwt::JwtKeys,
        password::PasswordHasher,
        repo::{AccountStore, InsertOutcome},
        repo_types::{NewAccount, PublicAccount},
    },
    clock::Clock,
};

/// Registration input as received from the caller.
#[derive(Debug, Default, Clone)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub institution_name: String,
    pub password: String,
}

/// Owns the account registry and everything that touches credentials.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    keys: JwtKeys,
    clock: Arc<dyn Clock>,
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        keys: JwtKeys,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher,
            keys,
            clock,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip(self, reg), fields(email = %reg.email))]
    pub async fn register(&self, reg: Registration) -> Result<PublicAccount, AuthError> {
        if [
            &reg.full_name,
            &reg.email,
            &reg.role,
            &reg.institution_name,
            &reg.password,
        ]
        .iter()
        .any(|f| blank(f))
        {
            warn!("signup with missing fields");
            return Err(AuthError::Validation("All fields are required".into()));
        }

        let email = reg.email.trim().to_string();

        // Cheap early exit so duplicates don't pay for a hash. The insert
        // below re-checks under the registry lock.
        if self.store.find_by_email(&email).await?.is_some() {
            warn!("email already registered");
            return Err(AuthError::Conflict);
        }

        let hasher = self.hasher.clone();
        let password = reg.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("password hashing task")??;

        let new = NewAccount {
            full_name: reg.full_name.trim().to_string(),
            email,
            role: reg.role.trim().to_string(),
            institution_name: reg.institution_name.trim().to_string(),
            password_hash,
            created_at: self.clock.now(),
        };

        match self.store.insert_if_absent(new).await? {
            InsertOutcome::Inserted(account) => {
                info!(user_id = account.id, "user registered");
                Ok(PublicAccount::from(&account))
            }
            InsertOutcome::EmailTaken => {
                warn!("email registered concurrently");
                Err(AuthError::Conflict)
            }
        }
    }

    /// Verifies credentials and issues a bearer token. Surrounding whitespace
    /// is stripped from `email`; the lookup itself is exact and case-sensitive.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(PublicAccount, String), AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".into(),
            ));
        }

        let account = match self.store.find_by_email(email).await? {
            Some(a) => a,
            None => {
                warn!("login unknown email");
                return Err(AuthError::NotFound);
            }
        };

        let hasher = self.hasher.clone();
        let candidate = password.to_owned();
        let stored = account.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || hasher.verify(&candidate, &stored))
            .await
            .context("password verification task")??;

        if !ok {
            warn!(user_id = account.id, "login invalid password");
            return Err(AuthError::Authentication);
        }

        let token = self.keys.sign(&account)?;
        info!(user_id = account.id, "user logged in");
        Ok((PublicAccount::from(&account), token))
    }

    /// Every account, sanitized, in insertion order.
    pub async fn list_accounts(&self) -> Result<Vec<PublicAccount>, AuthError> {
        let accounts = self.store.list().await?;
        Ok(accounts.iter().map(PublicAccount::from).collect())
    }

    pub async fn account(&self, id: u64) -> Result<PublicAccount, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .as_ref()
            .map(PublicAccount::from)
            .ok_or(AuthError::NotFound)
    }
}
