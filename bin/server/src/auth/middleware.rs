//! Authentication extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use rolebridge_platform_access::{Session, SessionId};
use std::sync::Arc;

use super::{AppState, SESSION_COOKIE};

/// Extractor for requiring an authenticated session.
///
/// If there is no live session, the request is redirected to the login
/// options.
pub struct RequireAuth(pub Session);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        // CookieJar extraction is infallible.
        let Ok(jar) = CookieJar::from_request_parts(parts, state).await;

        let session_cookie = jar
            .get(SESSION_COOKIE)
            .ok_or(AuthRejection::NotAuthenticated)?;
        let session_id = SessionId::new(session_cookie.value().to_string());

        let session = app_state
            .sessions
            .find(&session_id)
            .await
            .ok_or(AuthRejection::NotAuthenticated)?;

        Ok(RequireAuth(session))
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => Redirect::to("/login").into_response(),
        }
    }
}
