use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use super::cookies::{self, FlashKind};
use super::routes::LOGIN_PATH;
use super::session::Session;
use super::state::PortalState;
use super::traits::SessionStore;
use super::types::AuthSession;
use crate::token::TokenValidator;

pub(crate) const EXPIRED_SESSION_NOTICE: &str =
    "Tu sesión ha expirado. Por favor, inicia sesión nuevamente.";

/// Result of the authorization gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// Forward the request to the action unchanged.
    Allow,
    /// No token in the session.
    RedirectToLogin,
    /// A token was present but is malformed or expired; the session must be cleared.
    RedirectToLoginWithExpiryNotice,
}

/// Decide the gate outcome for a session snapshot. Pure.
#[must_use]
pub fn evaluate(session: &Session, validator: &dyn TokenValidator) -> AuthorizationOutcome {
    match session.token() {
        None => AuthorizationOutcome::RedirectToLogin,
        Some(token) if validator.is_valid(token) => AuthorizationOutcome::Allow,
        Some(_) => AuthorizationOutcome::RedirectToLoginWithExpiryNotice,
    }
}

/// Middleware guarding every protected page.
///
/// Reads a fresh session snapshot, evaluates [`evaluate`] and either forwards the
/// request (with an [`AuthSession`] extension) or short-circuits to the login
/// page. An invalid token clears the whole session and leaves a one-shot notice.
pub(crate) async fn require_auth<S: SessionStore>(
    State(state): State<PortalState<S>>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = cookies::get_session_id(&jar, &state.settings.session_cookie_name)
    else {
        return Redirect::to(LOGIN_PATH).into_response();
    };

    let session = match state.session_store.load(&session_id).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed; treating request as anonymous");
            return Redirect::to(LOGIN_PATH).into_response();
        }
    };

    match evaluate(&session, state.validator.as_ref()) {
        AuthorizationOutcome::Allow => {
            let auth = AuthSession {
                session_id,
                token: session.token().unwrap_or_default().to_string(),
                username: session.username().map(str::to_string),
            };
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        AuthorizationOutcome::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
        AuthorizationOutcome::RedirectToLoginWithExpiryNotice => {
            tracing::info!(session_id = %session_id, "Session token invalid or expired");
            if let Err(e) = state.session_store.clear(&session_id).await {
                tracing::warn!(error = %e, "Session clear failed after token expiry");
            }
            let jar = cookies::flash(
                jar,
                FlashKind::Error,
                EXPIRED_SESSION_NOTICE,
                state.settings.secure_cookies,
            );
            (jar, Redirect::to(LOGIN_PATH)).into_response()
        }
    }
}
