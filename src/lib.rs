#![doc = include_str!("../README.md")]

pub mod api;
pub mod catalog;
pub mod error;
pub mod middleware;
pub mod token;
pub mod types;

// Re-exports for convenient access
pub use api::{ApiClient, ApiConfig};
pub use catalog::{AuthorService, BookService};
pub use error::Error;
pub use middleware::{MemorySessionStore, PortalConfig, SessionStore, portal_routes};
pub use token::{ExpiryValidator, TokenValidator, is_token_valid, token_expiry};
pub use types::{Author, AuthorId, Book, BookId, LoginRequest, LoginResponse, SessionId};
