//! Authentication middleware and extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::db as auth_db;
use crate::db::{self, users};
use crate::domain::{PlanTier, UserProfile};
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "fu_session";

/// Authenticated request context.
/// Add this as a handler parameter to require authentication.
/// Redirects to /login if not authenticated.
#[derive(Clone)]
pub struct AuthContext {
    pub profile: UserProfile,
}

impl AuthContext {
    pub fn user_id(&self) -> i64 {
        self.profile.id
    }

    pub fn is_admin(&self) -> bool {
        self.profile.role.is_admin()
    }

    pub fn tier(&self) -> PlanTier {
        self.profile.tier()
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| Redirect::to("/login").into_response())?;

        let token = jar
            .get(SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .ok_or_else(|| Redirect::to("/login").into_response())?;

        let conn = db::try_lock(&state.db)
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response())?;

        let user_id = auth_db::get_session_user(&conn, &token)
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response())?
            .ok_or_else(|| Redirect::to("/login").into_response())?;

        let profile = users::get_profile(&conn, user_id)
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response())?
            .ok_or_else(|| Redirect::to("/login").into_response())?;

        Ok(AuthContext { profile })
    }
}

/// Optional authentication extractor.
/// Returns Some(AuthContext) if authenticated, None otherwise.
/// Use for pages that work both with and without authentication.
pub struct OptionalAuth(pub Option<AuthContext>);

impl OptionalAuth {
    /// Effective plan tier: guests until proven otherwise.
    pub fn tier(&self) -> PlanTier {
        self.0.as_ref().map(|a| a.tier()).unwrap_or(PlanTier::Guest)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|a| a.user_id())
    }
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthContext::from_request_parts(parts, state).await {
            Ok(auth) => Ok(OptionalAuth(Some(auth))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
