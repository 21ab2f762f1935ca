//! Database bootstrap: create the database if missing, then apply idempotent
//! DDL for the users/events/attendees schema.

use crate::error::AppError;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// Ensure the database in `database_url` exists; create it if not. Connects
/// to the default `postgres` database to run CREATE DATABASE. Call before
/// creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(AppError::Db)?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await
            .map_err(AppError::Db)?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
    }
    Ok(())
}

/// Apply the schema: category enum type, three tables, cascade foreign keys,
/// unique (user_id, event_id). Safe to run at every startup.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    // CREATE TYPE has no IF NOT EXISTS; a duplicate type error is ignored.
    let _ = sqlx::query(
        "CREATE TYPE event_category AS ENUM \
         ('Music', 'Food', 'Arts', 'Sports', 'Education', 'Business', 'Health')",
    )
    .execute(pool)
    .await;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            name TEXT NOT NULL,
            avatar TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id SERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            location TEXT NOT NULL,
            address TEXT NOT NULL,
            latitude DOUBLE PRECISION NOT NULL,
            longitude DOUBLE PRECISION NOT NULL,
            date TIMESTAMPTZ NOT NULL,
            end_date TIMESTAMPTZ,
            category_id event_category NOT NULL,
            price INTEGER,
            is_free BOOLEAN NOT NULL DEFAULT FALSE,
            image_url TEXT,
            host_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            is_online BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendees (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (user_id, event_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_name_parsed_from_url() {
        let (admin, name) =
            parse_db_name_from_url("postgres://user:pw@localhost:5432/eventfinder").unwrap();
        assert_eq!(admin, "postgres://user:pw@localhost:5432/postgres");
        assert_eq!(name, "eventfinder");
    }

    #[test]
    fn query_string_stripped_from_db_name() {
        let (_, name) =
            parse_db_name_from_url("postgres://localhost/eventfinder?sslmode=disable").unwrap();
        assert_eq!(name, "eventfinder");
    }
}
