//! Event rows, categories, payloads, and the enriched read view.

use crate::error::AppError;
use crate::models::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Fixed category set. `All` is a query wildcard only and has no variant
/// here, so an event can never be stored with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "PascalCase")]
pub enum Category {
    Music,
    Food,
    Arts,
    Sports,
    Education,
    Business,
    Health,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Music,
        Category::Food,
        Category::Arts,
        Category::Sports,
        Category::Education,
        Category::Business,
        Category::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Music => "Music",
            Category::Food => "Food",
            Category::Arts => "Arts",
            Category::Sports => "Sports",
            Category::Education => "Education",
            Category::Business => "Business",
            Category::Health => "Health",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown category '{}'", s)))
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Free-text venue name; `address` is the postal address.
    pub location: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub category_id: Category,
    /// Smallest currency unit; None when not priced.
    pub price: Option<i32>,
    pub is_free: bool,
    pub image_url: Option<String>,
    pub host_id: i32,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
    /// Only populated by proximity queries; never persisted.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_in_miles: Option<f64>,
}

/// An event merged with its attendee count/list and host summary. Computed
/// fresh on every read, never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithAttendees {
    #[serde(flatten)]
    pub event: Event,
    pub attendees: usize,
    pub attendees_list: Vec<UserSummary>,
    pub host: UserSummary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub category_id: Category,
    #[serde(default)]
    pub price: Option<i32>,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    pub host_id: i32,
    #[serde(default)]
    pub is_online: bool,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("description is required".into()));
        }
        validate_latitude(self.latitude)?;
        validate_longitude(self.longitude)?;
        if let Some(end) = self.end_date {
            if end < self.date {
                return Err(AppError::Validation("endDate must not be before date".into()));
            }
        }
        if let Some(p) = self.price {
            if p < 0 {
                return Err(AppError::Validation("price must not be negative".into()));
            }
        }
        Ok(())
    }
}

/// Partial update: only present fields are applied. An explicit JSON `null`
/// is treated the same as an absent field, so nullable columns (`endDate`,
/// `price`, `imageUrl`) cannot be cleared through this payload once set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub category_id: Option<Category>,
    pub price: Option<i32>,
    pub is_free: Option<bool>,
    pub image_url: Option<String>,
    pub is_online: Option<bool>,
}

impl UpdateEvent {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(t) = &self.title {
            if t.trim().is_empty() {
                return Err(AppError::Validation("title must not be empty".into()));
            }
        }
        // Each coordinate is checked on its own; an update may move only one
        // axis and must still stay in range.
        if let Some(lat) = self.latitude {
            validate_latitude(lat)?;
        }
        if let Some(lng) = self.longitude {
            validate_longitude(lng)?;
        }
        if let Some(p) = self.price {
            if p < 0 {
                return Err(AppError::Validation("price must not be negative".into()));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.address.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.date.is_none()
            && self.end_date.is_none()
            && self.category_id.is_none()
            && self.price.is_none()
            && self.is_free.is_none()
            && self.image_url.is_none()
            && self.is_online.is_none()
    }
}

fn validate_latitude(lat: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::Validation("latitude must be between -90 and 90".into()));
    }
    Ok(())
}

fn validate_longitude(lng: f64) -> Result<(), AppError> {
    if !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::Validation("longitude must be between -180 and 180".into()));
    }
    Ok(())
}
