//! Access token storage.
//!
//! Tokens live in the platform keyring under the service name
//! [`SERVICE`], one entry per GitHub account. They are never written to a
//! plain file or logged.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use tracing::debug;

pub const SERVICE: &str = "contrib-art";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

pub trait TokenStore {
    fn get(&self, account: &str) -> Result<Option<String>>;
    fn set(&self, account: &str, token: &str) -> Result<()>;
    /// Returns whether an entry existed.
    fn delete(&self, account: &str) -> Result<bool>;
}

/// Platform keyring (Keychain, Credential Manager, kernel keyutils).
pub struct KeyringStore;

impl KeyringStore {
    fn entry(account: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(SERVICE, account)
            .with_context(|| format!("failed to open keyring entry for {}", account))
    }
}

impl TokenStore for KeyringStore {
    fn get(&self, account: &str) -> Result<Option<String>> {
        match Self::entry(account)?.get_password() {
            Ok(tok) => Ok(Some(tok)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read token for {}", account)),
        }
    }

    fn set(&self, account: &str, token: &str) -> Result<()> {
        Self::entry(account)?
            .set_password(token)
            .with_context(|| format!("failed to store token for {}", account))
    }

    fn delete(&self, account: &str) -> Result<bool> {
        match Self::entry(account)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to delete token for {}", account)),
        }
    }
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    tokens: RefCell<HashMap<String, String>>,
}

impl TokenStore for MemoryStore {
    fn get(&self, account: &str) -> Result<Option<String>> {
        Ok(self.tokens.borrow().get(account).cloned())
    }

    fn set(&self, account: &str, token: &str) -> Result<()> {
        self.tokens
            .borrow_mut()
            .insert(account.to_string(), token.to_string());
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<bool> {
        Ok(self.tokens.borrow_mut().remove(account).is_some())
    }
}

/// Token for a run: `$GITHUB_TOKEN` if set, else the first stored token among
/// `accounts` (in order). `None` means no token is available.
pub fn resolve_token(store: &dyn TokenStore, accounts: &[&str]) -> Result<Option<String>> {
    if let Ok(tok) = env::var(TOKEN_ENV)
        && !tok.trim().is_empty()
    {
        debug!("using token from {}", TOKEN_ENV);
        return Ok(Some(tok.trim().to_string()));
    }
    for account in accounts {
        if let Some(tok) = store.get(account)? {
            debug!(%account, "using stored token");
            return Ok(Some(tok));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn memory_store_roundtrip() {
        let s = MemoryStore::default();
        assert_eq!(s.get("octocat").unwrap(), None);
        s.set("octocat", "ghp_1").unwrap();
        assert_eq!(s.get("octocat").unwrap().as_deref(), Some("ghp_1"));
        assert!(s.delete("octocat").unwrap());
        assert!(!s.delete("octocat").unwrap());
    }

    #[test]
    #[serial]
    fn env_token_takes_precedence() {
        let s = MemoryStore::default();
        s.set("octocat", "stored").unwrap();
        unsafe { env::set_var(TOKEN_ENV, " from-env\n") };
        let tok = resolve_token(&s, &["octocat"]).unwrap();
        unsafe { env::remove_var(TOKEN_ENV) };
        assert_eq!(tok.as_deref(), Some("from-env"));
    }

    #[test]
    #[serial]
    fn accounts_are_tried_in_order() {
        unsafe { env::remove_var(TOKEN_ENV) };
        let s = MemoryStore::default();
        s.set("fallback", "tok-b").unwrap();
        assert_eq!(
            resolve_token(&s, &["owner", "fallback"]).unwrap().as_deref(),
            Some("tok-b")
        );
        s.set("owner", "tok-a").unwrap();
        assert_eq!(
            resolve_token(&s, &["owner", "fallback"]).unwrap().as_deref(),
            Some("tok-a")
        );
        assert_eq!(resolve_token(&s, &["nobody"]).unwrap(), None);
    }
}
