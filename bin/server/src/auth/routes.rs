//! Authentication routes for login, OAuth2 callback, and logout.

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration as ChronoDuration;
use rolebridge_platform_access::{Principal, Session, SessionId};
use serde::Deserialize;
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::csrf::{self, CSRF_PARAMETER};
use super::{AUTH_STATE_COOKIE, AppState, AuthState, RequireAuth, SESSION_COOKIE};
use crate::error::AuthError;
use crate::types::{
    CsrfOption, FormLoginOption, LoginOptions, ProviderOption, SERVICE_NAME, ServiceInfo,
};

/// Where the browser lands after a successful login.
const LOGIN_SUCCESS_PATH: &str = "/dashboard";

/// Form login fields.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
    #[serde(default, rename = "_csrf")]
    csrf: Option<String>,
}

/// Body of a form post that carries only the CSRF token.
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    #[serde(default, rename = "_csrf")]
    csrf: Option<String>,
}

/// Query parameters of the OAuth2 callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Public landing endpoint.
pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
    })
}

/// Lists the login methods on offer. Only registered providers appear.
///
/// Also issues the CSRF token that the login and logout forms must echo.
pub async fn login_options(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<LoginOptions>) {
    let (jar, token) = csrf::ensure_token(jar, state.session_config.secure_cookies);
    let providers = state
        .authenticator
        .registry()
        .iter()
        .map(|registration| ProviderOption {
            id: registration.id().to_string(),
            name: registration.client_name().to_string(),
            authorization_url: format!("/oauth2/authorization/{}", registration.id()),
        })
        .collect();

    let options = LoginOptions {
        form: FormLoginOption {
            action: "/login",
            method: "POST",
        },
        csrf: CsrfOption {
            parameter_name: CSRF_PARAMETER,
            token,
        },
        providers,
    };
    (jar, Json(options))
}

/// Authenticates a form login and starts a session.
pub async fn form_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), AuthError> {
    csrf::verify(&jar, form.csrf.as_deref())?;

    let principal = state
        .authenticator
        .authenticate_form(&form.username, &form.password)
        .await
        .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

    let session = start_session(&state, principal).await;
    Ok((
        jar.add(session_cookie(&state, &session)),
        Redirect::to(LOGIN_SUCCESS_PATH),
    ))
}

/// Redirects the browser to the provider's authorization endpoint.
pub async fn oauth_start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let client = state
        .providers
        .get(&provider)
        .ok_or_else(|| AuthError::UnknownProvider(provider.clone()))?;

    let (auth_url, auth_state) = client
        .authorization_url()
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let auth_state_json =
        serde_json::to_string(&auth_state).map_err(|e| AuthError::Internal(e.to_string()))?;

    let cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    Ok((jar.add(cookie), Redirect::to(&auth_url)))
}

/// Completes an OAuth2 login: validates state, exchanges the code, resolves
/// authorities and starts a session.
///
/// The auth state cookie is single use and is cleared whatever the outcome.
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), (CookieJar, AuthError)> {
    let outcome = complete_oauth_login(&state, &provider, query, &jar).await;
    let jar = jar.add(expired_cookie(AUTH_STATE_COOKIE));

    match outcome {
        Ok(session) => Ok((
            jar.add(session_cookie(&state, &session)),
            Redirect::to(LOGIN_SUCCESS_PATH),
        )),
        Err(e) => Err((jar, e)),
    }
}

async fn complete_oauth_login(
    state: &AppState,
    provider: &str,
    query: CallbackQuery,
    jar: &CookieJar,
) -> Result<Session, AuthError> {
    let oauth_login = state
        .oauth_login
        .as_ref()
        .ok_or_else(|| AuthError::UnknownProvider(provider.to_string()))?;
    let client = state
        .providers
        .get(provider)
        .ok_or_else(|| AuthError::UnknownProvider(provider.to_string()))?;

    if let Some(error) = query.error {
        return Err(AuthError::OAuthFailed(format!(
            "provider returned error: {error}"
        )));
    }

    let auth_state: AuthState = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or_else(|| AuthError::OAuthFailed("missing auth state".to_string()))
        .and_then(|cookie| {
            serde_json::from_str(cookie.value())
                .map_err(|_| AuthError::OAuthFailed("invalid auth state".to_string()))
        })?;

    if auth_state.provider != provider {
        return Err(AuthError::OAuthFailed(format!(
            "auth state belongs to provider '{}'",
            auth_state.provider
        )));
    }
    if query.state.as_deref() != Some(auth_state.csrf_token.as_str()) {
        return Err(AuthError::OAuthFailed("CSRF token mismatch".to_string()));
    }
    let code = query
        .code
        .ok_or_else(|| AuthError::OAuthFailed("missing authorization code".to_string()))?;

    let assertion = client
        .exchange_code(&code, &auth_state)
        .await
        .map_err(|e| AuthError::OAuthFailed(e.to_string()))?;

    let principal = oauth_login
        .authenticate(assertion)
        .await
        .map_err(|e| AuthError::OAuthFailed(e.to_string()))?;

    Ok(start_session(state, principal).await)
}

/// Returns the logged-in principal.
pub async fn dashboard(RequireAuth(session): RequireAuth) -> Json<Principal> {
    Json(session.principal().clone())
}

/// Logs out the user by deleting their session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<CsrfForm>,
) -> Result<(CookieJar, Redirect), AuthError> {
    csrf::verify(&jar, form.csrf.as_deref())?;

    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let session_id = SessionId::new(session_cookie.value().to_string());
        state.sessions.delete(&session_id).await;
    }

    Ok((jar.add(expired_cookie(SESSION_COOKIE)), Redirect::to("/")))
}

async fn start_session(state: &AppState, principal: Principal) -> Session {
    let session = state
        .sessions
        .create(
            principal,
            ChronoDuration::minutes(state.session_config.duration_minutes),
        )
        .await;
    tracing::info!(user_key = %session.principal().user_key(), "session started");
    session
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

fn session_cookie(state: &AppState, session: &Session) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.id().as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(state.session_config.duration_minutes))
        .build()
}
