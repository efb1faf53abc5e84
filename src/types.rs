use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};

/// Catalog API identifier of an author.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, FromStr,
    From, Into,
)]
#[serde(transparent)]
pub struct AuthorId(pub i64);

/// Catalog API identifier of a book.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, FromStr,
    From, Into,
)]
#[serde(transparent)]
pub struct BookId(pub i64);

/// Opaque server-side session identifier carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SessionId(pub String);

/// Author as exchanged with the catalog API (`v1/autores`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: AuthorId,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "ciudadProcedencia", default)]
    pub city_of_origin: Option<String>,
    /// ISO-8601 date or date-time, passed through as the API emits it.
    #[serde(rename = "fechaNacimiento", default)]
    pub birth_date: Option<String>,
}

/// Book as exchanged with the catalog API (`v1/libros`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub id: BookId,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "anio", default)]
    pub year: i32,
    #[serde(rename = "genero", default)]
    pub genre: String,
    #[serde(rename = "numeroPaginas", default)]
    pub page_count: i32,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "autorId", default)]
    pub author_id: AuthorId,
    /// Expanded author, present on reads only.
    #[serde(rename = "autor", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
}

/// Credentials posted to `v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful response of `v1/auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct LoginResponse {
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
    #[serde(rename = "expiresAtUtc", default)]
    pub expires_at_utc: Option<String>,
    #[serde(rename = "tokenType", default)]
    pub token_type: Option<String>,
}
