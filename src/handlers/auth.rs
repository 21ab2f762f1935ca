//! Signup, login, session check, logout.

use crate::auth::{hash_password, verify_password, SessionToken, DUMMY_PASSWORD_HASH};
use crate::error::AppError;
use crate::handlers::from_body;
use crate::models::NewUser;
use crate::session::{self, Session, SESSION_COOKIE};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let payload: NewUser = from_body(body)?;
    payload.validate()?;
    if state
        .storage
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("username already taken".into()));
    }
    let password = hash_password(&payload.password)?;
    let user = state
        .storage
        .create_user(NewUser { password, ..payload })
        .await?;
    tracing::info!(user_id = user.id, username = %user.username, "signup");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let payload: LoginRequest = from_body(body)?;
    // One generic message for unknown user and wrong password, so usernames
    // cannot be enumerated through the login endpoint. The unknown-user
    // branch still burns a verification so latency stays uniform too.
    let user = match state.storage.get_user_by_username(&payload.username).await? {
        Some(u) if verify_password(&payload.password, &u.password) => u,
        Some(_) => return Err(AppError::Unauthorized("invalid username or password".into())),
        None => {
            let _ = verify_password(&payload.password, DUMMY_PASSWORD_HASH);
            return Err(AppError::Unauthorized("invalid username or password".into()));
        }
    };

    let token = session::new_token();
    state.sessions.set(&token, Session::for_user(&user)).await?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    tracing::info!(user_id = user.id, "login");
    Ok((jar.add(cookie), Json(user)))
}

/// Current session's user. A session whose user no longer resolves is
/// destroyed server-side before the 401.
pub async fn me(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let token = token.ok_or_else(|| AppError::Unauthorized("not logged in".into()))?;
    let session = state
        .sessions
        .get(&token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("not logged in".into()))?;
    match state.storage.get_user(session.user_id).await? {
        Some(user) => Ok(Json(user)),
        None => {
            state.sessions.destroy(&token).await?;
            Err(AppError::Unauthorized("not logged in".into()))
        }
    }
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    SessionToken(token): SessionToken,
) -> Result<impl axum::response::IntoResponse, AppError> {
    if let Some(token) = token {
        state.sessions.destroy(&token).await?;
    }
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    Ok((jar.remove(removal), Json(json!({ "message": "logged out" }))))
}
