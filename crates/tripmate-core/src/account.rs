// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Account storage capability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{AccountError, AccountResult};
use crate::types::{normalize_email, Account, AccountId, AccountStatus, NewAccount};

// =============================================================================
// AccountStore
// =============================================================================

/// Persistence for member accounts.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Looks up an account by its sign-in identity.
    ///
    /// Identities compare in their [`normalize_email`] form.
    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>>;

    /// Looks up an account by id.
    async fn find_by_id(&self, id: AccountId) -> AccountResult<Option<Account>>;

    /// Creates an account. Fails if the email is taken in any letter case.
    ///
    /// The stored email is the [`normalize_email`] form.
    async fn insert(&self, account: NewAccount) -> AccountResult<Account>;

    /// Returns one page of accounts ordered by id, plus the total count.
    async fn list(&self, offset: usize, limit: usize) -> AccountResult<(Vec<Account>, usize)>;

    /// Changes an account's status.
    async fn update_status(&self, id: AccountId, status: AccountStatus) -> AccountResult<Account>;
}

// =============================================================================
// InMemoryAccountStore
// =============================================================================

/// Account store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    next_id: AtomicU64,
}

impl InMemoryAccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored accounts.
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    /// Returns `true` if no accounts are stored.
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>> {
        let email = normalize_email(email);
        Ok(self
            .accounts
            .read()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> AccountResult<Option<Account>> {
        Ok(self.accounts.read().get(&id).cloned())
    }

    async fn insert(&self, account: NewAccount) -> AccountResult<Account> {
        let email = normalize_email(&account.email);

        let mut accounts = self.accounts.write();
        if accounts.values().any(|a| a.email == email) {
            return Err(AccountError::already_exists(email));
        }

        let id = AccountId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let stored = Account {
            id,
            email,
            display_name: account.display_name,
            password_hash: account.password_hash,
            roles: account.roles,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };
        accounts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list(&self, offset: usize, limit: usize) -> AccountResult<(Vec<Account>, usize)> {
        let accounts = self.accounts.read();
        let mut all: Vec<&Account> = accounts.values().collect();
        all.sort_by_key(|a| a.id);
        let total = all.len();
        let page = all.into_iter().skip(offset).take(limit).cloned().collect();
        Ok((page, total))
    }

    async fn update_status(&self, id: AccountId, status: AccountStatus) -> AccountResult<Account> {
        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| AccountError::not_found(id.to_string()))?;
        account.status = status;
        Ok(account.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            display_name: "traveler".to_string(),
            password_hash: "hash".to_string(),
            roles: vec!["USER".to_string()],
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("a@x.com")).await.unwrap();

        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(
            store.find_by_email("a@x.com").await.unwrap(),
            Some(account.clone())
        );
        assert_eq!(store.find_by_id(account.id).await.unwrap(), Some(account));
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryAccountStore::new();
        store.insert(new_account("a@x.com")).await.unwrap();

        let err = store.insert(new_account("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AccountError::AlreadyExists { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_email_letter_case_is_one_identity() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account(" A@X.com ")).await.unwrap();
        assert_eq!(account.email, "a@x.com");

        let err = store.insert(new_account("a@X.COM")).await.unwrap_err();
        assert!(matches!(err, AccountError::AlreadyExists { .. }));

        let found = store.find_by_email("A@x.com").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(account.id));
    }

    #[tokio::test]
    async fn test_list_pages_in_id_order() {
        let store = InMemoryAccountStore::new();
        for i in 0..5 {
            store
                .insert(new_account(&format!("user{}@x.com", i)))
                .await
                .unwrap();
        }

        let (page, total) = store.list(2, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].email, "user2@x.com");
        assert_eq!(page[1].email, "user3@x.com");
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = InMemoryAccountStore::new();
        let account = store.insert(new_account("a@x.com")).await.unwrap();

        let updated = store
            .update_status(account.id, AccountStatus::Suspended)
            .await
            .unwrap();
        assert_eq!(updated.status, AccountStatus::Suspended);

        let missing = store
            .update_status(AccountId::new(999), AccountStatus::Active)
            .await;
        assert!(matches!(missing, Err(AccountError::NotFound { .. })));
    }
}
