use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use time::Duration;

use super::types::Flash;
use crate::types::SessionId;

const FLASH_ERROR_COOKIE: &str = "__shelf_flash_error";
const FLASH_SUCCESS_COOKIE: &str = "__shelf_flash_success";

/// One-shot flash message slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Error,
    Success,
}

impl FlashKind {
    fn cookie_name(self) -> &'static str {
        match self {
            Self::Error => FLASH_ERROR_COOKIE,
            Self::Success => FLASH_SUCCESS_COOKIE,
        }
    }
}

/// Generates a fresh session identifier (32 random bytes → base64url).
#[must_use]
pub(super) fn generate_session_id() -> SessionId {
    let random_bytes: [u8; 32] = rand::rng().random();
    SessionId(URL_SAFE_NO_PAD.encode(random_bytes))
}

/// Create session cookie.
pub(super) fn session_cookie(
    name: &str,
    session_id: &SessionId,
    ttl_minutes: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name.to_string(), session_id.0.clone()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::minutes(ttl_minutes))
        .build()
}

/// Create removal cookie for session.
pub(super) fn clear_session_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Get the session id from cookies.
pub(super) fn get_session_id(jar: &PrivateCookieJar, name: &str) -> Option<SessionId> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .map(SessionId)
}

/// Queue a flash message for the next rendered page.
pub(super) fn flash(
    jar: PrivateCookieJar,
    kind: FlashKind,
    message: impl Into<String>,
    secure: bool,
) -> PrivateCookieJar {
    let cookie = Cookie::build((kind.cookie_name(), message.into()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::minutes(5))
        .build();
    jar.add(cookie)
}

/// Read and remove pending flash messages.
pub(super) fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Flash) {
    let flash = Flash {
        error: jar.get(FLASH_ERROR_COOKIE).map(|c| c.value().to_string()),
        success: jar.get(FLASH_SUCCESS_COOKIE).map(|c| c.value().to_string()),
    };

    let mut jar = jar;
    for kind in [FlashKind::Error, FlashKind::Success] {
        if jar.get(kind.cookie_name()).is_some() {
            jar = jar.remove(Cookie::build(kind.cookie_name()).path("/".to_string()).build());
        }
    }
    (jar, flash)
}
