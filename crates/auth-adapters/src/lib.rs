//! # auth-adapters
//!
//! Argon2-based implementation of the password hashing port and an
//! in-memory session store handing out opaque bearer tokens.

use async_trait::async_trait;
use base64::Engine;
use dashmap::DashMap;
use rand::RngCore;
use uuid::Uuid;

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use domains::{DomainError, PasswordHasher, Result, SessionStore};

/// Argon2id with the library defaults. A fresh salt per hash.
#[derive(Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(DomainError::internal)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Sessions held in process memory; they do not survive a restart,
/// which doubles as a forced re-login on deploy.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Uuid>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn open(&self, user_id: Uuid) -> Result<String> {
        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw);
        self.sessions.insert(token.clone(), user_id);
        tracing::debug!(user = %user_id, "session opened");
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>> {
        Ok(self.sessions.get(token).map(|entry| *entry))
    }

    async fn close(&self, token: &str) -> Result<()> {
        self.sessions.remove(token);
        Ok(())
    }
}
