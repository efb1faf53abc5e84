//! Author and book services over the shared [`ApiClient`].
//!
//! Every call carries the session's bearer token. Transport failures are raised
//! as [`ActionError::Application`] with an `"Error al ..."` message, refusals as
//! [`ActionError::Unauthorized`], and unusable read statuses as
//! [`ActionError::Status`].

use std::sync::Arc;

use axum::http::StatusCode;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::ApiClient;
use crate::error::Error;
use crate::middleware::ActionError;
use crate::types::{Author, AuthorId, Book, BookId};

/// CRUD endpoint of a single catalog resource.
struct Resource {
    client: Arc<ApiClient>,
    endpoint: &'static str,
    /// Singular noun used in failure messages.
    singular: &'static str,
    /// Plural noun used in failure messages.
    plural: &'static str,
}

impl Resource {
    async fn list<T: DeserializeOwned>(&self, token: &str) -> Result<Vec<T>, ActionError> {
        self.client
            .get_json::<Vec<T>>(self.endpoint, token, "list")
            .await
            .map_err(|e| self.read_failure(e, format!("obtener {}", self.plural)))
    }

    async fn get<T: DeserializeOwned>(&self, id: i64, token: &str) -> Result<T, ActionError> {
        self.client
            .get_json::<T>(&format!("{}/{id}", self.endpoint), token, "lookup")
            .await
            .map_err(|e| self.read_failure(e, format!("obtener {} {id}", self.singular)))
    }

    async fn create<T: Serialize>(&self, entity: &T, token: &str) -> Result<bool, ActionError> {
        let status = self
            .client
            .send(Method::POST, self.endpoint, token, Some(entity))
            .await
            .map_err(|e| transport_failure(&e, format!("crear {}", self.singular)))?;
        write_outcome(status)
    }

    async fn update<T: Serialize>(
        &self,
        id: i64,
        entity: &T,
        token: &str,
    ) -> Result<bool, ActionError> {
        let status = self
            .client
            .send(
                Method::PUT,
                &format!("{}/{id}", self.endpoint),
                token,
                Some(entity),
            )
            .await
            .map_err(|e| transport_failure(&e, format!("actualizar {} {id}", self.singular)))?;
        write_outcome(status)
    }

    async fn delete(&self, id: i64, token: &str) -> Result<bool, ActionError> {
        let status = self
            .client
            .send::<()>(Method::DELETE, &format!("{}/{id}", self.endpoint), token, None)
            .await
            .map_err(|e| transport_failure(&e, format!("eliminar {} {id}", self.singular)))?;
        write_outcome(status)
    }

    fn read_failure(&self, err: Error, operation: String) -> ActionError {
        match err {
            Error::Api { status, .. } => status_failure(status),
            other => transport_failure(&other, operation),
        }
    }
}

fn transport_failure(err: &Error, operation: String) -> ActionError {
    ActionError::Application(format!("Error al {operation}: {err}"))
}

fn status_failure(status: u16) -> ActionError {
    match StatusCode::from_u16(status) {
        Ok(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => ActionError::Unauthorized,
        Ok(code) => ActionError::Status(code),
        Err(_) => ActionError::Status(StatusCode::BAD_GATEWAY),
    }
}

fn write_outcome(status: reqwest::StatusCode) -> Result<bool, ActionError> {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ActionError::Unauthorized);
    }
    Ok(status.is_success())
}

/// Authors (`v1/autores`).
pub struct AuthorService {
    resource: Resource,
}

impl AuthorService {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            resource: Resource {
                client,
                endpoint: "v1/autores",
                singular: "autor",
                plural: "autores",
            },
        }
    }

    pub async fn list(&self, token: &str) -> Result<Vec<Author>, ActionError> {
        self.resource.list(token).await
    }

    pub async fn get(&self, id: AuthorId, token: &str) -> Result<Author, ActionError> {
        self.resource.get(id.0, token).await
    }

    pub async fn create(&self, author: &Author, token: &str) -> Result<bool, ActionError> {
        self.resource.create(author, token).await
    }

    pub async fn update(
        &self,
        id: AuthorId,
        author: &Author,
        token: &str,
    ) -> Result<bool, ActionError> {
        self.resource.update(id.0, author, token).await
    }

    pub async fn delete(&self, id: AuthorId, token: &str) -> Result<bool, ActionError> {
        self.resource.delete(id.0, token).await
    }
}

/// Books (`v1/libros`).
pub struct BookService {
    resource: Resource,
}

impl BookService {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            resource: Resource {
                client,
                endpoint: "v1/libros",
                singular: "libro",
                plural: "libros",
            },
        }
    }

    pub async fn list(&self, token: &str) -> Result<Vec<Book>, ActionError> {
        self.resource.list(token).await
    }

    pub async fn get(&self, id: BookId, token: &str) -> Result<Book, ActionError> {
        self.resource.get(id.0, token).await
    }

    pub async fn create(&self, book: &Book, token: &str) -> Result<bool, ActionError> {
        self.resource.create(book, token).await
    }

    pub async fn update(&self, id: BookId, book: &Book, token: &str) -> Result<bool, ActionError> {
        self.resource.update(id.0, book, token).await
    }

    pub async fn delete(&self, id: BookId, token: &str) -> Result<bool, ActionError> {
        self.resource.delete(id.0, token).await
    }
}
