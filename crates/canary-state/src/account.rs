//! Account credentials and typed account resolution.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Kind of backing store an account can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Holds canary configurations.
    ConfigurationStore,
    /// Holds metric set pair lists and other bulk objects.
    ObjectStore,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::ConfigurationStore => "CONFIGURATION_STORE",
            AccountType::ObjectStore => "OBJECT_STORE",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named account and the store types it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredentials {
    pub name: String,
    pub supported_types: Vec<AccountType>,
}

impl AccountCredentials {
    pub fn new(name: impl Into<String>, supported_types: Vec<AccountType>) -> Self {
        Self {
            name: name.into(),
            supported_types,
        }
    }

    pub fn supports(&self, account_type: AccountType) -> bool {
        self.supported_types.contains(&account_type)
    }
}

/// Read-only registry of accounts keyed by unique name.
///
/// Built once at startup; resolution never mutates it.
#[derive(Debug, Clone, Default)]
pub struct AccountRepository {
    accounts: BTreeMap<String, AccountCredentials>,
}

impl AccountRepository {
    /// Build a repository, rejecting duplicate names.
    pub fn new(accounts: impl IntoIterator<Item = AccountCredentials>) -> StorageResult<Self> {
        let mut map = BTreeMap::new();
        for account in accounts {
            if map.contains_key(&account.name) {
                return Err(StorageError::DuplicateAccount { name: account.name });
            }
            map.insert(account.name.clone(), account);
        }
        Ok(Self { accounts: map })
    }

    pub fn get(&self, name: &str) -> Option<&AccountCredentials> {
        self.accounts.get(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &AccountCredentials> {
        self.accounts.values()
    }

    /// Resolve exactly one account of `account_type`.
    ///
    /// A non-empty `name` must exist and support the type. Without a name the
    /// type must be supported by exactly one registered account.
    pub fn resolve(
        &self,
        name: Option<&str>,
        account_type: AccountType,
    ) -> StorageResult<AccountCredentials> {
        match name.filter(|n| !n.is_empty()) {
            Some(name) => {
                let account = self
                    .accounts
                    .get(name)
                    .ok_or_else(|| StorageError::AccountNotFound {
                        name: name.to_string(),
                    })?;
                if !account.supports(account_type) {
                    return Err(StorageError::AccountTypeMismatch {
                        name: name.to_string(),
                        account_type,
                    });
                }
                Ok(account.clone())
            }
            None => {
                let mut matching = self.accounts.values().filter(|a| a.supports(account_type));
                let first = matching
                    .next()
                    .ok_or(StorageError::NoAccountOfType { account_type })?;
                let rest: Vec<&AccountCredentials> = matching.collect();
                if !rest.is_empty() {
                    let candidates = std::iter::once(first)
                        .chain(rest)
                        .map(|a| a.name.clone())
                        .collect();
                    return Err(StorageError::AmbiguousAccount {
                        account_type,
                        candidates,
                    });
                }
                Ok(first.clone())
            }
        }
    }
}
