//! Event discovery REST backend: users, events, attendance.

pub mod auth;
pub mod config;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod storage;

pub use config::Settings;
pub use error::AppError;
pub use migration::{apply_migrations, ensure_database_exists};
pub use routes::{api_router, auth_routes, common_routes_with_ready, event_routes};
pub use session::{MemorySessionStore, SessionStore};
pub use state::AppState;
pub use storage::{MemoryStorage, PgStorage, Storage};
