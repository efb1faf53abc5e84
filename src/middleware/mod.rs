//! Session-backed request pipeline for the portal's axum router.
//!
//! Two layers wrap every protected page:
//!
//! 1. the **authorization gate** ([`evaluate`]) reads the session, checks the
//!    bearer token and either forwards the request or redirects to the login
//!    page, clearing the session when the token is no longer usable;
//! 2. the **failure classifier** ([`classify`]) turns any [`ActionError`]
//!    raised by the page into exactly one user-facing outcome.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use shelf_portal::middleware::{MemorySessionStore, PortalConfig, portal_routes};
//!
//! let config = PortalConfig::from_env()?;
//! let app = portal_routes(config, MemorySessionStore::new())?;
//! axum::serve(listener, app).await?;
//! ```

mod classify;
mod config;
mod cookies;
mod error;
mod extractor;
mod gate;
mod handlers;
mod routes;
mod session;
mod state;
mod traits;
mod types;

pub use classify::{FailureOutcome, classify, controller_from_path};
pub use config::PortalConfig;
pub use error::ActionError;
pub use gate::{AuthorizationOutcome, evaluate};
pub use routes::portal_routes;
pub use session::{DEFAULT_IDLE_TIMEOUT, MemorySessionStore, Session, SessionKey};
pub use traits::SessionStore;
pub use types::{AuthSession, ErrorView, ErrorViewName, Flash, Page};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
