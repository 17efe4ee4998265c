use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::auth::repo_types::{Account, NewAccount};

/// Outcome of an insert that must not clash on email.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(Account),
    EmailTaken,
}

/// Account registry. The service is the only caller.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert unless an account with the same email exists. Check and insert
    /// happen as one step.
    async fn insert_if_absent(&self, new: NewAccount) -> anyhow::Result<InsertOutcome>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<Account>>;
    /// All accounts in insertion order.
    async fn list(&self) -> anyhow::Result<Vec<Account>>;
}

#[derive(Debug)]
struct Registry {
    accounts: Vec<Account>,
    next_id: u64,
}

/// Process-lifetime registry. Nothing survives a restart.
#[derive(Debug)]
pub struct InMemoryAccountStore {
    inner: Mutex<Registry>,
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Registry {
                accounts: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert_if_absent(&self, new: NewAccount) -> anyhow::Result<InsertOutcome> {
        let mut reg = self.inner.lock().await;
        if reg.accounts.iter().any(|a| a.email == new.email) {
            return Ok(InsertOutcome::EmailTaken);
        }

        let id = reg.next_id;
        reg.next_id = reg
            .next_id
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("account id space exhausted"))?;

        let account = Account {
            id,
            full_name: new.full_name,
            email: new.email,
            role: new.role,
            institution_name: new.institution_name,
            password_hash: new.password_hash,
            created_at: new.created_at,
        };
        reg.accounts.push(account.clone());
        Ok(InsertOutcome::Inserted(account))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let reg = self.inner.lock().await;
        Ok(reg.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<Account>> {
        let reg = self.inner.lock().await;
        Ok(reg.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Account>> {
        let reg = self.inner.lock().await;
        Ok(reg.accounts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            full_name: "Ada".into(),
            email: email.into(),
            role: "student".into(),
            institution_name: "MIT".into(),
            password_hash: "$argon2id$fake".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn ids_start_at_one_and_increase() {
        let store = InMemoryAccountStore::default();
        let mut ids = Vec::new();
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            match store.insert_if_absent(new_account(email)).await.unwrap() {
                InsertOutcome::Inserted(a) => ids.push(a.id),
                InsertOutcome::EmailTaken => panic!("unexpected conflict"),
            }
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_and_does_not_consume_id() {
        let store = InMemoryAccountStore::default();
        store.insert_if_absent(new_account("a@x.com")).await.unwrap();
        let dup = store.insert_if_absent(new_account("a@x.com")).await.unwrap();
        assert!(matches!(dup, InsertOutcome::EmailTaken));

        let next = store.insert_if_absent(new_account("b@x.com")).await.unwrap();
        match next {
            InsertOutcome::Inserted(a) => assert_eq!(a.id, 2),
            InsertOutcome::EmailTaken => panic!("unexpected conflict"),
        }
    }

    #[tokio::test]
    async fn email_match_is_case_sensitive() {
        let store = InMemoryAccountStore::default();
        store.insert_if_absent(new_account("a@x.com")).await.unwrap();
        assert!(store.find_by_email("A@x.com").await.unwrap().is_none());
        let upper = store.insert_if_absent(new_account("A@x.com")).await.unwrap();
        assert!(matches!(upper, InsertOutcome::Inserted(_)));
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = InMemoryAccountStore::default();
        for email in ["z@x.com", "a@x.com", "m@x.com"] {
            store.insert_if_absent(new_account(email)).await.unwrap();
        }
        let emails: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.email)
            .collect();
        assert_eq!(emails, vec!["z@x.com", "a@x.com", "m@x.com"]);
    }

    #[tokio::test]
    async fn find_by_id_and_email() {
        let store = InMemoryAccountStore::default();
        store.insert_if_absent(new_account("a@x.com")).await.unwrap();
        assert_eq!(store.find_by_id(1).await.unwrap().unwrap().email, "a@x.com");
        assert!(store.find_by_id(2).await.unwrap().is_none());
        assert_eq!(store.find_by_email("a@x.com").await.unwrap().unwrap().id, 1);
    }
}
