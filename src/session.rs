//! Server-side sessions keyed by an opaque token held in a cookie.

use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "eventfinder_sid";

/// Holds the user id only; `/me` and the auth extractor re-resolve the user
/// from storage on every request, so a session never serves stale user data.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn for_user(user: &User) -> Self {
        Session {
            user_id: user.id,
            created_at: Utc::now(),
        }
    }
}

/// Session persistence seam. The route layer only sees this trait; swapping
/// in a database-backed store is a deployment concern.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, token: &str) -> Result<Option<Session>, AppError>;
    async fn set(&self, token: &str, session: Session) -> Result<(), AppError>;
    async fn destroy(&self, token: &str) -> Result<(), AppError>;
}

/// New opaque session token.
pub fn new_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Process-local store. Sessions do not survive a restart and are not shared
/// across instances.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, token: &str) -> Result<Option<Session>, AppError> {
        let map = self
            .inner
            .read()
            .map_err(|_| AppError::Internal("session store poisoned".into()))?;
        Ok(map.get(token).cloned())
    }

    async fn set(&self, token: &str, session: Session) -> Result<(), AppError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| AppError::Internal("session store poisoned".into()))?;
        map.insert(token.to_string(), session);
        Ok(())
    }

    async fn destroy(&self, token: &str) -> Result<(), AppError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| AppError::Internal("session store poisoned".into()))?;
        map.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: "johndoe".into(),
            email: "john@example.com".into(),
            password: "$argon2id$...".into(),
            name: "John Doe".into(),
            avatar: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn set_get_destroy_roundtrip() {
        let store = MemorySessionStore::new();
        let token = new_token();
        store.set(&token, Session::for_user(&user())).await.unwrap();
        let got = store.get(&token).await.unwrap().unwrap();
        assert_eq!(got.user_id, 7);

        store.destroy(&token).await.unwrap();
        assert!(store.get(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn destroy_unknown_token_is_noop() {
        let store = MemorySessionStore::new();
        store.destroy("nope").await.unwrap();
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(new_token(), new_token());
    }
}
