use serde::Serialize;
use time::OffsetDateTime;

/// Account record held by the registry.
#[derive(Clone)]
pub struct Account {
    pub id: u64,                    // assigned on insert, never reused
    pub full_name: String,
    pub email: String,              // uniqueness key, exact match
    pub role: String,
    pub institution_name: String,
    pub password_hash: String,      // Argon2 PHC string, never serialized
    pub created_at: OffsetDateTime,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Fields supplied at registration, with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub institution_name: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// Public part of an account returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicAccount {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub institution_name: String,
}

impl From<&Account> for PublicAccount {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            full_name: a.full_name.clone(),
            email: a.email.clone(),
            role: a.role.clone(),
            institution_name: a.institution_name.clone(),
        }
    }
}
