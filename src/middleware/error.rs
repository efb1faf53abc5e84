use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Typed failure raised by a page handler.
///
/// Handlers return `Result<_, ActionError>` and use `?`; the failure is turned
/// into a user-facing outcome by the classifier layer (see [`classify`](super::classify)).
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The catalog API refused the session's credentials.
    #[error("Access denied by the catalog API")]
    Unauthorized,

    /// The catalog API answered with a status the action cannot handle.
    #[error("Catalog API returned status {0}")]
    Status(StatusCode),

    /// A handled, user-meaningful condition raised by the service layer.
    #[error("{0}")]
    Application(String),

    /// Anything else.
    #[error("Unexpected failure: {0}")]
    Unexpected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ActionError {
    pub fn unexpected(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Unexpected(err.into())
    }
}

/// Response extension carrying a raised [`ActionError`] to the classifier.
#[derive(Debug, Clone)]
pub(crate) struct RaisedFailure(pub(crate) Arc<ActionError>);

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        // Placeholder; replaced by the classifier layer.
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response
            .extensions_mut()
            .insert(RaisedFailure(Arc::new(self)));
        response
    }
}
