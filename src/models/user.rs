//! User rows and signup payload.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string. Never serialized into responses.
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Minimal user projection embedded in enriched events.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub avatar: Option<String>,
}

/// Signup payload. `password` arrives in plaintext and is hashed by the
/// handler before it reaches storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().len() < 3 {
            return Err(AppError::Validation("username must be at least 3 characters".into()));
        }
        if self.username.len() > 50 {
            return Err(AppError::Validation("username must be at most 50 characters".into()));
        }
        if !self.email.contains('@') || self.email.len() < 3 {
            return Err(AppError::Validation("email must be a valid email".into()));
        }
        if self.password.len() < 6 {
            return Err(AppError::Validation("password must be at least 6 characters".into()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }
        Ok(())
    }
}
