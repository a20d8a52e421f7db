//! Sign-in, registration, guest access and sign-out.

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use super::db as auth_db;
use super::middleware::SESSION_COOKIE_NAME;
use super::password;
use crate::config;
use crate::db::{self, users};
use crate::session::generate_session_id;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

fn login_error(jar: CookieJar, message: &str) -> axum::response::Response {
    let template = LoginTemplate {
        error: Some(message.to_string()),
    };
    (jar, Html(template.render().unwrap_or_default())).into_response()
}

fn register_error(jar: CookieJar, message: &str) -> axum::response::Response {
    let template = RegisterTemplate {
        error: Some(message.to_string()),
    };
    (jar, Html(template.render().unwrap_or_default())).into_response()
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(false) // Set to true in production with HTTPS
        .max_age(time::Duration::hours(config::AUTH_SESSION_DURATION_HOURS))
        .build()
}

/// GET /login - Show login page
pub async fn login_page() -> Html<String> {
    let template = LoginTemplate { error: None };
    Html(template.render().unwrap_or_default())
}

/// POST /login - Process login
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    if form.email.is_empty() || form.password.is_empty() {
        return login_error(jar, "Email and password are required");
    }

    let conn = match db::try_lock(&state.db) {
        Ok(conn) => conn,
        Err(_) => return login_error(jar, "Database error"),
    };

    let (user_id, stored_hash) = match users::get_user_by_email(&conn, &form.email) {
        Ok(Some(user)) => user,
        Ok(None) => return login_error(jar, "Invalid email or password"),
        Err(_) => return login_error(jar, "Database error"),
    };

    let verified = stored_hash
        .map(|hash| password::verify_password(&form.password, &hash))
        .unwrap_or(false);
    if !verified {
        return login_error(jar, "Invalid email or password");
    }

    // Stamp last login and refresh role from the admins table
    if let Err(e) = users::touch_login(&conn, user_id, &form.email) {
        tracing::warn!("Failed to update last login for user {}: {}", user_id, e);
    }

    let token = generate_session_id();
    if auth_db::create_session(&conn, user_id, &token, config::AUTH_SESSION_DURATION_HOURS).is_err()
    {
        return login_error(jar, "Failed to create session");
    }

    drop(conn);

    (jar.add(session_cookie(token)), Redirect::to("/")).into_response()
}

/// GET /register - Show registration page
pub async fn register_page() -> Html<String> {
    let template = RegisterTemplate { error: None };
    Html(template.render().unwrap_or_default())
}

/// POST /register - Create an account and sign in
pub async fn register_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> impl IntoResponse {
    if !form.email.contains('@') {
        return register_error(jar, "A valid email address is required");
    }
    if form.password.len() < 8 {
        return register_error(jar, "Password must be at least 8 characters");
    }

    let display_name = if form.display_name.trim().is_empty() {
        form.email
            .split('@')
            .next()
            .unwrap_or("student")
            .to_string()
    } else {
        form.display_name.trim().to_string()
    };

    let password_hash = match password::hash_password(&form.password) {
        Ok(hash) => hash,
        Err(_) => return register_error(jar, "Failed to process password"),
    };

    let conn = match db::try_lock(&state.db) {
        Ok(conn) => conn,
        Err(_) => return register_error(jar, "Database error"),
    };

    match users::get_user_by_email(&conn, &form.email) {
        Ok(Some(_)) => return register_error(jar, "An account with this email already exists"),
        Ok(None) => {}
        Err(_) => return register_error(jar, "Database error"),
    }

    let user_id = match users::create_user(
        &conn,
        &form.email,
        &display_name,
        Some(&password_hash),
        false,
    ) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Failed to create user {}: {}", form.email, e);
            return register_error(jar, "Failed to create account");
        }
    };

    let token = generate_session_id();
    if auth_db::create_session(&conn, user_id, &token, config::AUTH_SESSION_DURATION_HOURS).is_err()
    {
        return register_error(jar, "Failed to create session");
    }

    drop(conn);

    (jar.add(session_cookie(token)), Redirect::to("/")).into_response()
}

/// POST /guest - Anonymous sign-in with a throwaway profile
pub async fn guest_submit(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let conn = match db::try_lock(&state.db) {
        Ok(conn) => conn,
        Err(_) => return login_error(jar, "Database error"),
    };

    let suffix = generate_session_id();
    let name = format!("guest-{}", &suffix[..8]);
    let email = format!("{}@guests.local", name);

    let user_id = match users::create_user(&conn, &email, &name, None, true) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Failed to create guest profile: {}", e);
            return login_error(jar, "Failed to create guest profile");
        }
    };

    let token = generate_session_id();
    if auth_db::create_session(&conn, user_id, &token, config::AUTH_SESSION_DURATION_HOURS).is_err()
    {
        return login_error(jar, "Failed to create session");
    }

    drop(conn);

    (jar.add(session_cookie(token)), Redirect::to("/")).into_response()
}

/// POST /logout - End the session
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        if let Ok(conn) = db::try_lock(&state.db) {
            let _ = auth_db::delete_session(&conn, cookie.value());
            // Opportunistic cleanup while we hold the lock anyway
            let _ = auth_db::cleanup_expired_sessions(&conn);
        }
    }

    let removal = Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build();
    (jar.remove(removal), Redirect::to("/"))
}
