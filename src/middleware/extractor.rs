use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;

use super::routes::LOGIN_PATH;
use super::types::AuthSession;

/// Extracts the session admitted by the authorization gate.
///
/// Only meaningful behind the authorization gate; a route mounted without it
/// redirects to the login page instead.
///
/// # Example
///
/// ```rust,ignore
/// async fn index(auth: AuthSession) -> impl IntoResponse {
///     format!("Hola, {}", auth.username.unwrap_or_default())
/// }
/// ```
impl<S: Send + Sync> FromRequestParts<S> for AuthSession {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthSession>().cloned().ok_or_else(|| {
            tracing::warn!(path = %parts.uri.path(), "Protected handler reached without gate");
            Redirect::to(LOGIN_PATH)
        })
    }
}
