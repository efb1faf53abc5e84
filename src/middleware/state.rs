use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::PortalSettings;
use super::traits::SessionStore;
use crate::api::ApiClient;
use crate::catalog::{AuthorService, BookService};
use crate::token::TokenValidator;

/// Shared state for the portal's middleware and page handlers.
pub(crate) struct PortalState<S> {
    pub(crate) api: Arc<ApiClient>,
    pub(crate) authors: Arc<AuthorService>,
    pub(crate) books: Arc<BookService>,
    pub(crate) session_store: Arc<S>,
    pub(crate) validator: Arc<dyn TokenValidator>,
    pub(crate) settings: PortalSettings,
}

// Manual Clone: avoid derive adding an `S: Clone` bound.
impl<S> Clone for PortalState<S> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            authors: self.authors.clone(),
            books: self.books.clone(),
            session_store: self.session_store.clone(),
            validator: self.validator.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<S: SessionStore> FromRef<PortalState<S>> for Key {
    fn from_ref(state: &PortalState<S>) -> Self {
        state.settings.cookie_key.clone()
    }
}
