use std::sync::Arc;

use crate::{
    auth::{
        jwt::JwtKeys,
        password::PasswordHasher,
        repo::{AccountStore, InMemoryAccountStore},
        AuthService,
    },
    clock::{Clock, SystemClock},
    config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        Self::from_parts(config, Arc::new(SystemClock))
    }

    /// Wires the service with a fresh in-memory registry.
    pub fn from_parts(config: AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let store = Arc::new(InMemoryAccountStore::default()) as Arc<dyn AccountStore>;
        Self::with_store(config, store, clock)
    }

    pub fn with_store(
        config: AppConfig,
        store: Arc<dyn AccountStore>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(&config.password)?;
        let keys = JwtKeys::new(&config.jwt, clock.clone());
        let auth = AuthService::new(store, hasher, keys, clock.clone());
        Ok(Self {
            config: Arc::new(config),
            auth,
            clock,
        })
    }
}
