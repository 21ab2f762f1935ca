//! In-memory storage for tests and single-process development. Mirrors the
//! PostgreSQL implementation's contract, including conflict semantics.

use crate::error::AppError;
use crate::models::{
    Attendee, Category, Event, EventWithAttendees, NewEvent, NewUser, UpdateEvent, User, UserSummary,
};
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::RwLock;

struct Inner {
    users: Vec<User>,
    events: Vec<Event>,
    attendees: Vec<Attendee>,
    next_user_id: i32,
    next_event_id: i32,
    next_attendee_id: i32,
}

pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            inner: RwLock::new(Inner {
                users: Vec::new(),
                events: Vec::new(),
                attendees: Vec::new(),
                next_user_id: 1,
                next_event_id: 1,
                next_attendee_id: 1,
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, AppError> {
        self.inner
            .read()
            .map_err(|_| AppError::Internal("storage lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, AppError> {
        self.inner
            .write()
            .map_err(|_| AppError::Internal("storage lock poisoned".into()))
    }
}

fn summary_of(inner: &Inner, user_id: i32) -> Option<UserSummary> {
    inner.users.iter().find(|u| u.id == user_id).map(User::summary)
}

/// Host unresolvable means the event is dropped; attendees referencing a
/// missing user are dropped from the list.
fn enrich(inner: &Inner, events: Vec<Event>) -> Vec<EventWithAttendees> {
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        let Some(host) = summary_of(inner, event.host_id) else {
            continue;
        };
        let attendees_list: Vec<UserSummary> = inner
            .attendees
            .iter()
            .filter(|a| a.event_id == event.id)
            .filter_map(|a| summary_of(inner, a.user_id))
            .collect();
        out.push(EventWithAttendees {
            attendees: attendees_list.len(),
            attendees_list,
            host,
            event,
        });
    }
    out
}

fn by_date(a: &Event, b: &Event) -> Ordering {
    a.date.cmp(&b.date)
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.write()?;
        if inner
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict("username or email already exists".into()));
        }
        let id = inner.next_user_id;
        inner.next_user_id += 1;
        let created = User {
            id,
            username: user.username,
            email: user.email,
            password: user.password,
            name: user.name,
            avatar: user.avatar,
            created_at: Utc::now(),
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn get_event(&self, id: i32) -> Result<Option<EventWithAttendees>, AppError> {
        let inner = self.read()?;
        let event = inner.events.iter().find(|e| e.id == id).cloned();
        Ok(event.and_then(|e| enrich(&inner, vec![e]).into_iter().next()))
    }

    async fn get_all_events(&self) -> Result<Vec<EventWithAttendees>, AppError> {
        let inner = self.read()?;
        let mut events = inner.events.clone();
        events.sort_by(by_date);
        Ok(enrich(&inner, events))
    }

    async fn get_events_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<EventWithAttendees>, AppError> {
        let inner = self.read()?;
        let mut events: Vec<Event> = inner
            .events
            .iter()
            .filter(|e| e.category_id == category)
            .cloned()
            .collect();
        events.sort_by(by_date);
        Ok(enrich(&inner, events))
    }

    async fn get_events_near_location(
        &self,
        lat: f64,
        lng: f64,
        max_distance_miles: f64,
    ) -> Result<Vec<EventWithAttendees>, AppError> {
        let inner = self.read()?;
        let mut nearby: Vec<Event> = inner
            .events
            .iter()
            .cloned()
            .filter_map(|mut e| {
                let d = crate::geo::distance_miles(lat, lng, e.latitude, e.longitude);
                if d <= max_distance_miles {
                    e.distance_in_miles = Some(d);
                    Some(e)
                } else {
                    None
                }
            })
            .collect();
        nearby.sort_by(|a, b| {
            a.distance_in_miles
                .partial_cmp(&b.distance_in_miles)
                .unwrap_or(Ordering::Equal)
        });
        Ok(enrich(&inner, nearby))
    }

    async fn search_events(&self, query: &str) -> Result<Vec<EventWithAttendees>, AppError> {
        let needle = query.to_lowercase();
        let inner = self.read()?;
        let mut events: Vec<Event> = inner
            .events
            .iter()
            .filter(|e| {
                e.title.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
                    || e.location.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        events.sort_by(by_date);
        Ok(enrich(&inner, events))
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, AppError> {
        let mut inner = self.write()?;
        if !inner.users.iter().any(|u| u.id == event.host_id) {
            return Err(AppError::Validation("hostId must reference an existing user".into()));
        }
        let id = inner.next_event_id;
        inner.next_event_id += 1;
        let created = Event {
            id,
            title: event.title,
            description: event.description,
            location: event.location,
            address: event.address,
            latitude: event.latitude,
            longitude: event.longitude,
            date: event.date,
            end_date: event.end_date,
            category_id: event.category_id,
            price: event.price,
            is_free: event.is_free,
            image_url: event.image_url,
            host_id: event.host_id,
            is_online: event.is_online,
            created_at: Utc::now(),
            distance_in_miles: None,
        };
        inner.events.push(created.clone());
        Ok(created)
    }

    async fn update_event(&self, id: i32, update: UpdateEvent) -> Result<Option<Event>, AppError> {
        let mut inner = self.write()?;
        let Some(event) = inner.events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(v) = update.title {
            event.title = v;
        }
        if let Some(v) = update.description {
            event.description = v;
        }
        if let Some(v) = update.location {
            event.location = v;
        }
        if let Some(v) = update.address {
            event.address = v;
        }
        if let Some(v) = update.latitude {
            event.latitude = v;
        }
        if let Some(v) = update.longitude {
            event.longitude = v;
        }
        if let Some(v) = update.date {
            event.date = v;
        }
        if let Some(v) = update.end_date {
            event.end_date = Some(v);
        }
        if let Some(v) = update.category_id {
            event.category_id = v;
        }
        if let Some(v) = update.price {
            event.price = Some(v);
        }
        if let Some(v) = update.is_free {
            event.is_free = v;
        }
        if let Some(v) = update.image_url {
            event.image_url = Some(v);
        }
        if let Some(v) = update.is_online {
            event.is_online = v;
        }
        Ok(Some(event.clone()))
    }

    async fn delete_event(&self, id: i32) -> Result<bool, AppError> {
        let mut inner = self.write()?;
        let before = inner.events.len();
        inner.events.retain(|e| e.id != id);
        let removed = inner.events.len() < before;
        if removed {
            inner.attendees.retain(|a| a.event_id != id);
        }
        Ok(removed)
    }

    async fn get_event_attendees(&self, event_id: i32) -> Result<Vec<Attendee>, AppError> {
        Ok(self
            .read()?
            .attendees
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn create_attendee(&self, user_id: i32, event_id: i32) -> Result<Attendee, AppError> {
        let mut inner = self.write()?;
        if inner
            .attendees
            .iter()
            .any(|a| a.user_id == user_id && a.event_id == event_id)
        {
            return Err(AppError::Conflict("already registered for this event".into()));
        }
        let id = inner.next_attendee_id;
        inner.next_attendee_id += 1;
        let created = Attendee {
            id,
            user_id,
            event_id,
            created_at: Utc::now(),
        };
        inner.attendees.push(created.clone());
        Ok(created)
    }

    async fn delete_attendee(&self, user_id: i32, event_id: i32) -> Result<bool, AppError> {
        let mut inner = self.write()?;
        let before = inner.attendees.len();
        inner
            .attendees
            .retain(|a| !(a.user_id == user_id && a.event_id == event_id));
        Ok(inner.attendees.len() < before)
    }

    async fn is_user_attending(&self, user_id: i32, event_id: i32) -> Result<bool, AppError> {
        Ok(self
            .read()?
            .attendees
            .iter()
            .any(|a| a.user_id == user_id && a.event_id == event_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: format!("{}@example.com", username),
            password: "$argon2id$hash".into(),
            name: username.into(),
            avatar: None,
        }
    }

    fn new_event(host_id: i32, title: &str, lat: f64, lng: f64) -> NewEvent {
        NewEvent {
            title: title.into(),
            description: "A gathering".into(),
            location: "Central Park".into(),
            address: "New York, NY".into(),
            latitude: lat,
            longitude: lng,
            date: Utc.with_ymd_and_hms(2026, 9, 12, 18, 0, 0).unwrap(),
            end_date: None,
            category_id: Category::Music,
            price: None,
            is_free: true,
            image_url: None,
            host_id,
            is_online: false,
        }
    }

    #[tokio::test]
    async fn event_round_trip_enriches_with_empty_attendance() {
        let storage = MemoryStorage::new();
        let host = storage.create_user(new_user("host")).await.unwrap();
        let created = storage
            .create_event(new_event(host.id, "Jazz Night", 40.785091, -73.968285))
            .await
            .unwrap();

        let got = storage.get_event(created.id).await.unwrap().unwrap();
        assert_eq!(got.event.title, "Jazz Night");
        assert_eq!(got.event.host_id, host.id);
        assert_eq!(got.attendees, 0);
        assert!(got.attendees_list.is_empty());
        assert_eq!(got.host.id, host.id);
        assert!(got.event.distance_in_miles.is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_without_second_row() {
        let storage = MemoryStorage::new();
        let host = storage.create_user(new_user("host")).await.unwrap();
        let guest = storage.create_user(new_user("guest")).await.unwrap();
        let event = storage
            .create_event(new_event(host.id, "Jazz Night", 40.0, -73.0))
            .await
            .unwrap();

        storage.create_attendee(guest.id, event.id).await.unwrap();
        let err = storage.create_attendee(guest.id, event.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(storage.get_event_attendees(event.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_event_removes_attendee_rows() {
        let storage = MemoryStorage::new();
        let host = storage.create_user(new_user("host")).await.unwrap();
        let guest = storage.create_user(new_user("guest")).await.unwrap();
        let event = storage
            .create_event(new_event(host.id, "Jazz Night", 40.0, -73.0))
            .await
            .unwrap();
        storage.create_attendee(guest.id, event.id).await.unwrap();

        assert!(storage.delete_event(event.id).await.unwrap());
        assert!(storage.get_event_attendees(event.id).await.unwrap().is_empty());
        assert!(!storage.delete_event(event.id).await.unwrap());
    }

    #[tokio::test]
    async fn near_location_filters_and_sorts_by_distance() {
        let storage = MemoryStorage::new();
        let host = storage.create_user(new_user("host")).await.unwrap();
        storage
            .create_event(new_event(host.id, "Close", 40.785091, -73.968285))
            .await
            .unwrap();
        storage
            .create_event(new_event(host.id, "Far", 40.6892, -74.0445))
            .await
            .unwrap();

        let within_one = storage
            .get_events_near_location(40.7850, -73.9682, 1.0)
            .await
            .unwrap();
        assert_eq!(within_one.len(), 1);
        assert_eq!(within_one[0].event.title, "Close");
        assert_eq!(within_one[0].event.distance_in_miles, Some(0.0));

        let wide = storage
            .get_events_near_location(40.7850, -73.9682, 50.0)
            .await
            .unwrap();
        assert_eq!(wide.len(), 2);
        assert_eq!(wide[0].event.title, "Close");

        let tiny_radius_far_away = storage
            .get_events_near_location(40.640, -74.080, 0.001)
            .await
            .unwrap();
        assert!(tiny_radius_far_away.is_empty());
    }

    #[tokio::test]
    async fn search_matches_any_text_field_case_insensitively() {
        let storage = MemoryStorage::new();
        let host = storage.create_user(new_user("host")).await.unwrap();
        let mut by_location = new_event(host.id, "Morning Run", 40.0, -73.0);
        by_location.location = "Riverside Track".into();
        storage.create_event(by_location).await.unwrap();
        storage
            .create_event(new_event(host.id, "TRACK day", 41.0, -72.0))
            .await
            .unwrap();
        storage
            .create_event(new_event(host.id, "Cooking class", 42.0, -71.0))
            .await
            .unwrap();

        let hits = storage.search_events("track").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(storage.search_events("nothing here").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_event_is_partial() {
        let storage = MemoryStorage::new();
        let host = storage.create_user(new_user("host")).await.unwrap();
        let event = storage
            .create_event(new_event(host.id, "Jazz Night", 40.0, -73.0))
            .await
            .unwrap();

        let updated = storage
            .update_event(
                event.id,
                UpdateEvent {
                    title: Some("Blues Night".into()),
                    ..UpdateEvent::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Blues Night");
        assert_eq!(updated.location, "Central Park");

        let missing = storage
            .update_event(9999, UpdateEvent::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let storage = MemoryStorage::new();
        storage.create_user(new_user("johndoe")).await.unwrap();
        let err = storage.create_user(new_user("johndoe")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
