//! Storage contract over users, events, and attendance.

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

use crate::error::AppError;
use crate::models::{Attendee, Category, Event, EventWithAttendees, NewEvent, NewUser, UpdateEvent, User};
use async_trait::async_trait;

/// Everything the route layer needs from persistence. One implementation is
/// backed by PostgreSQL; the in-memory one backs tests and single-process
/// development.
///
/// Reads that return [`EventWithAttendees`] enrich each event with its host
/// summary and attendee list. An event whose host cannot be resolved is
/// treated as not found (single reads) or dropped (listings); attendee rows
/// referencing a deleted user are silently dropped from the list.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Cheap liveness probe for readiness checks.
    async fn ping(&self) -> Result<(), AppError>;

    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    /// Inserts a user; `password` must already be hashed. Duplicate username
    /// or email surfaces as [`AppError::Conflict`].
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn get_event(&self, id: i32) -> Result<Option<EventWithAttendees>, AppError>;
    /// All events, ordered by start date ascending.
    async fn get_all_events(&self) -> Result<Vec<EventWithAttendees>, AppError>;
    async fn get_events_by_category(&self, category: Category) -> Result<Vec<EventWithAttendees>, AppError>;
    /// Events within `max_distance_miles` of the given point, each with
    /// `distanceInMiles` set, ordered by distance ascending.
    async fn get_events_near_location(
        &self,
        lat: f64,
        lng: f64,
        max_distance_miles: f64,
    ) -> Result<Vec<EventWithAttendees>, AppError>;
    /// Case-insensitive substring match over title, description, location.
    async fn search_events(&self, query: &str) -> Result<Vec<EventWithAttendees>, AppError>;
    async fn create_event(&self, event: NewEvent) -> Result<Event, AppError>;
    /// Applies the present fields only. None when the id does not exist.
    async fn update_event(&self, id: i32, update: UpdateEvent) -> Result<Option<Event>, AppError>;
    /// Deletes attendee rows then the event. False when nothing was removed.
    async fn delete_event(&self, id: i32) -> Result<bool, AppError>;

    /// Raw attendee rows for an event, insertion order.
    async fn get_event_attendees(&self, event_id: i32) -> Result<Vec<Attendee>, AppError>;
    /// Duplicate (user, event) pairs surface as [`AppError::Conflict`];
    /// callers are expected to pre-check via [`Storage::is_user_attending`].
    async fn create_attendee(&self, user_id: i32, event_id: i32) -> Result<Attendee, AppError>;
    async fn delete_attendee(&self, user_id: i32, event_id: i32) -> Result<bool, AppError>;
    async fn is_user_attending(&self, user_id: i32, event_id: i32) -> Result<bool, AppError>;
}
