//! Double-submit CSRF protection for the form endpoints.
//!
//! `GET /login` hands out a random token in both a cookie and the response
//! body. State-changing form posts must echo the token in the `_csrf` field;
//! a cross-site page can make the browser send the cookie but cannot read it.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use oauth2::CsrfToken;

use crate::error::AuthError;

/// Cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";

/// Form field the token must be echoed in.
pub const CSRF_PARAMETER: &str = "_csrf";

/// Returns the browser's current token, issuing a new one when it has none.
pub fn ensure_token(jar: CookieJar, secure: bool) -> (CookieJar, String) {
    if let Some(token) = jar
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
    {
        return (jar, token);
    }

    let token = CsrfToken::new_random().secret().clone();
    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build();
    (jar.add(cookie), token)
}

/// Checks a submitted token against the cookie.
///
/// # Errors
///
/// Returns `CsrfRejected` when either side is missing or they differ.
pub fn verify(jar: &CookieJar, submitted: Option<&str>) -> Result<(), AuthError> {
    let expected = jar
        .get(CSRF_COOKIE)
        .map(|c| c.value())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::CsrfRejected("no CSRF cookie".to_string()))?;
    let submitted = submitted
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::CsrfRejected("no CSRF token submitted".to_string()))?;

    if tokens_match(expected, submitted) {
        Ok(())
    } else {
        Err(AuthError::CsrfRejected("CSRF token mismatch".to_string()))
    }
}

fn tokens_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |diff, (x, y)| diff | (x ^ y))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar_with(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(CSRF_COOKIE, token.to_string()))
    }

    #[test]
    fn new_token_is_issued_once() {
        let (jar, token) = ensure_token(CookieJar::new(), false);
        assert!(!token.is_empty());
        assert_eq!(jar.get(CSRF_COOKIE).map(|c| c.value()), Some(token.as_str()));

        let (_, again) = ensure_token(jar, false);
        assert_eq!(again, token);
    }

    #[test]
    fn issued_tokens_differ() {
        let (_, a) = ensure_token(CookieJar::new(), false);
        let (_, b) = ensure_token(CookieJar::new(), false);
        assert_ne!(a, b);
    }

    #[test]
    fn matching_token_is_accepted() {
        assert!(verify(&jar_with("abc123"), Some("abc123")).is_ok());
    }

    #[test]
    fn missing_or_wrong_token_is_rejected() {
        assert!(verify(&jar_with("abc123"), None).is_err());
        assert!(verify(&jar_with("abc123"), Some("")).is_err());
        assert!(verify(&jar_with("abc123"), Some("abc124")).is_err());
        assert!(verify(&jar_with("abc123"), Some("abc1234")).is_err());
        assert!(verify(&CookieJar::new(), Some("abc123")).is_err());
    }
}
