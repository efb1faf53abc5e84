use serde::Serialize;

use crate::types::SessionId;

/// Session data of a request that passed the authorization gate.
///
/// Inserted into request extensions by the authorization gate; extract it in
/// handlers behind the gate.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: SessionId,
    /// Bearer token for the catalog API.
    pub token: String,
    pub username: Option<String>,
}

/// One-shot messages shown on the next rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Flash {
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "Success", skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
}

impl Flash {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.success.is_none()
    }
}

/// A rendered page: view name, model and pending flash messages.
///
/// The HTML layer selects a template by `view`.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub view: &'static str,
    pub model: T,
    pub flash: Flash,
}

/// Error view selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorViewName {
    NotFound,
    Error,
}

/// Payload of the shared error views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorView {
    pub view: ErrorViewName,
    pub message: String,
    pub status_code: u16,
}
