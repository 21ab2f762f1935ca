//! Runtime settings from the environment.

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
}

impl Settings {
    /// Read settings from env vars, with local-development defaults.
    /// `DATABASE_URL`, `BIND_ADDR`, `DATABASE_MAX_CONNECTIONS`.
    pub fn from_env() -> Self {
        Settings {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/eventfinder".into()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }
}
