//! PostgreSQL-backed storage. Runtime queries; enrichment is batched with
//! `= ANY($1)` lookups rather than per-event round trips.

use crate::error::{is_unique_violation, AppError};
use crate::models::{
    Attendee, Category, Event, EventWithAttendees, NewEvent, NewUser, UpdateEvent, User, UserSummary,
};
use crate::storage::Storage;
use async_trait::async_trait;
use sqlx::PgPool;
use std::cmp::Ordering;
use std::collections::HashMap;

const EVENT_COLUMNS: &str = "id, title, description, location, address, latitude, longitude, \
     date, end_date, category_id, price, is_free, image_url, host_id, is_online, created_at";

const USER_COLUMNS: &str = "id, username, email, password, name, avatar, created_at";

pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        PgStorage { pool }
    }

    /// Enrich events with host summaries and attendee lists. Two batched
    /// queries regardless of how many events are passed in. Events whose host
    /// no longer resolves are dropped.
    async fn enrich(&self, events: Vec<Event>) -> Result<Vec<EventWithAttendees>, AppError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        let event_ids: Vec<i32> = events.iter().map(|e| e.id).collect();
        let attendee_rows: Vec<Attendee> = sqlx::query_as(
            "SELECT id, user_id, event_id, created_at FROM attendees \
             WHERE event_id = ANY($1) ORDER BY id",
        )
        .bind(&event_ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut user_ids: Vec<i32> = events
            .iter()
            .map(|e| e.host_id)
            .chain(attendee_rows.iter().map(|a| a.user_id))
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let summaries: Vec<UserSummary> =
            sqlx::query_as("SELECT id, name, avatar FROM users WHERE id = ANY($1)")
                .bind(&user_ids[..])
                .fetch_all(&self.pool)
                .await?;
        let users: HashMap<i32, UserSummary> = summaries.into_iter().map(|u| (u.id, u)).collect();

        let mut lists: HashMap<i32, Vec<UserSummary>> = HashMap::new();
        for a in &attendee_rows {
            // Attendees referencing a deleted user drop out of the list.
            if let Some(u) = users.get(&a.user_id) {
                lists.entry(a.event_id).or_default().push(u.clone());
            }
        }

        let mut out = Vec::with_capacity(events.len());
        for event in events {
            let Some(host) = users.get(&event.host_id).cloned() else {
                continue;
            };
            let attendees_list = lists.remove(&event.id).unwrap_or_default();
            out.push(EventWithAttendees {
                attendees: attendees_list.len(),
                attendees_list,
                host,
                event,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as(&format!(
            "INSERT INTO users (username, email, password, name, avatar) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(&user.avatar)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("username or email already exists".into())
            } else {
                AppError::Db(e)
            }
        })?;
        Ok(created)
    }

    async fn get_event(&self, id: i32) -> Result<Option<EventWithAttendees>, AppError> {
        let event: Option<Event> =
            sqlx::query_as(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(event) = event else {
            return Ok(None);
        };
        // An event without a resolvable host is treated as not found.
        Ok(self.enrich(vec![event]).await?.into_iter().next())
    }

    async fn get_all_events(&self) -> Result<Vec<EventWithAttendees>, AppError> {
        let events: Vec<Event> = sqlx::query_as(&format!(
            "SELECT {} FROM events ORDER BY date ASC",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        self.enrich(events).await
    }

    async fn get_events_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<EventWithAttendees>, AppError> {
        let events: Vec<Event> = sqlx::query_as(&format!(
            "SELECT {} FROM events WHERE category_id = $1 ORDER BY date ASC",
            EVENT_COLUMNS
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        self.enrich(events).await
    }

    async fn get_events_near_location(
        &self,
        lat: f64,
        lng: f64,
        max_distance_miles: f64,
    ) -> Result<Vec<EventWithAttendees>, AppError> {
        // Full scan with in-process haversine; acceptable at this corpus size.
        let events: Vec<Event> = sqlx::query_as(&format!(
            "SELECT {} FROM events ORDER BY date ASC",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        let mut nearby: Vec<Event> = events
            .into_iter()
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
        self.enrich(nearby).await
    }

    async fn search_events(&self, query: &str) -> Result<Vec<EventWithAttendees>, AppError> {
        let pattern = like_pattern(query);
        let events: Vec<Event> = sqlx::query_as(&format!(
            "SELECT {} FROM events \
             WHERE title ILIKE $1 OR description ILIKE $1 OR location ILIKE $1 \
             ORDER BY date ASC",
            EVENT_COLUMNS
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        self.enrich(events).await
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event, AppError> {
        tracing::debug!(title = %event.title, host_id = event.host_id, "create event");
        let created = sqlx::query_as(&format!(
            "INSERT INTO events (title, description, location, address, latitude, longitude, \
             date, end_date, category_id, price, is_free, image_url, host_id, is_online) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(&event.address)
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(event.date)
        .bind(event.end_date)
        .bind(event.category_id)
        .bind(event.price)
        .bind(event.is_free)
        .bind(&event.image_url)
        .bind(event.host_id)
        .bind(event.is_online)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::Validation("hostId must reference an existing user".into())
            } else {
                AppError::Db(e)
            }
        })?;
        Ok(created)
    }

    async fn update_event(&self, id: i32, update: UpdateEvent) -> Result<Option<Event>, AppError> {
        if update.is_empty() {
            return sqlx::query_as(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::Db);
        }
        let mut qb = sqlx::QueryBuilder::new("UPDATE events SET ");
        {
            let mut sets = qb.separated(", ");
            if let Some(v) = update.title {
                sets.push("title = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.description {
                sets.push("description = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.location {
                sets.push("location = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.address {
                sets.push("address = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.latitude {
                sets.push("latitude = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.longitude {
                sets.push("longitude = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.date {
                sets.push("date = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.end_date {
                sets.push("end_date = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.category_id {
                sets.push("category_id = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.price {
                sets.push("price = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.is_free {
                sets.push("is_free = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.image_url {
                sets.push("image_url = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.is_online {
                sets.push("is_online = ").push_bind_unseparated(v);
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING {}", EVENT_COLUMNS));
        let updated = qb
            .build_query_as::<Event>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_event(&self, id: i32) -> Result<bool, AppError> {
        // Cascade FKs would handle the attendee rows; the explicit delete
        // keeps both deletes in one transaction.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM attendees WHERE event_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_event_attendees(&self, event_id: i32) -> Result<Vec<Attendee>, AppError> {
        let rows = sqlx::query_as(
            "SELECT id, user_id, event_id, created_at FROM attendees \
             WHERE event_id = $1 ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_attendee(&self, user_id: i32, event_id: i32) -> Result<Attendee, AppError> {
        let created = sqlx::query_as(
            "INSERT INTO attendees (user_id, event_id) VALUES ($1, $2) \
             RETURNING id, user_id, event_id, created_at",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("already registered for this event".into())
            } else {
                AppError::Db(e)
            }
        })?;
        Ok(created)
    }

    async fn delete_attendee(&self, user_id: i32, event_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM attendees WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_user_attending(&self, user_id: i32, event_id: i32) -> Result<bool, AppError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM attendees WHERE user_id = $1 AND event_id = $2)",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists.0)
    }
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23503"),
        _ => false,
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50% off_sale"), "%50\\% off\\_sale%");
        assert_eq!(like_pattern("jazz"), "%jazz%");
    }
}
