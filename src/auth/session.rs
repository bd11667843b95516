// region:    --- Imports
use crate::database::DatabaseManager;
use crate::listing::model::User;
use crate::query::handlers as query;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::convert::Infallible;
use std::sync::Arc;
// endregion: --- Imports

pub const SESSION_COOKIE: &str = "session";

/// Cookie carrying a fresh session token.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build()
}

/// Cookie removal, path must match the one set at login.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// The signed-in user, required. Missing or stale sessions redirect to
/// the login page instead of failing the request.
pub struct AuthSession(pub User);

#[async_trait]
impl FromRequestParts<Arc<DatabaseManager>> for AuthSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<DatabaseManager>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return Err(Redirect::to("/login")),
        };
        match query::get_session_user(state, &token).await {
            Ok(Some(user)) => Ok(AuthSession(user)),
            _ => Err(Redirect::to("/login")),
        }
    }
}

/// The signed-in user, if any. Pages that render for both visitors and
/// members take this instead of [`AuthSession`].
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<Arc<DatabaseManager>> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<DatabaseManager>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user = match jar.get(SESSION_COOKIE) {
            Some(cookie) => query::get_session_user(state, cookie.value())
                .await
                .ok()
                .flatten(),
            None => None,
        };
        Ok(MaybeUser(user))
    }
}
