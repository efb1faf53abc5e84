//! Author and book pages.
//!
//! Every handler here runs behind the authorization gate and returns
//! `Result<Response, ActionError>`; failures are turned into responses by the
//! classifier layer.

use axum::extract::rejection::{FormRejection, PathRejection};
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::PrivateCookieJar;
use serde::Serialize;

use super::cookies::{self, FlashKind};
use super::error::ActionError;
use super::routes::action_path;
use super::state::PortalState;
use super::traits::SessionStore;
use super::types::{AuthSession, Page};
use crate::types::{Author, AuthorId, Book, BookId};

const AUTHORS: &str = "Autores";
const BOOKS: &str = "Libros";

pub(super) fn catalog_routes<S: SessionStore>() -> Router<PortalState<S>> {
    Router::new()
        .route("/Autores", get(authors_index::<S>))
        .route("/Autores/Index", get(authors_index::<S>))
        .route(
            "/Autores/Create",
            get(author_create_form).post(author_create::<S>),
        )
        .route("/Autores/Details/{id}", get(author_details::<S>))
        .route(
            "/Autores/Edit/{id}",
            get(author_edit_form::<S>).post(author_edit::<S>),
        )
        .route(
            "/Autores/Delete/{id}",
            get(author_delete_form::<S>).post(author_delete::<S>),
        )
        .route("/Libros", get(books_index::<S>))
        .route("/Libros/Index", get(books_index::<S>))
        .route(
            "/Libros/Create",
            get(book_create_form::<S>).post(book_create::<S>),
        )
        .route("/Libros/Details/{id}", get(book_details::<S>))
        .route(
            "/Libros/Edit/{id}",
            get(book_edit_form::<S>).post(book_edit::<S>),
        )
        .route(
            "/Libros/Delete/{id}",
            get(book_delete_form::<S>).post(book_delete::<S>),
        )
}

// ── Rendering ──────────────────────────────────────────────────────

fn render<T: Serialize>(jar: PrivateCookieJar, view: &'static str, model: T) -> Response {
    render_with_error(jar, view, model, None)
}

fn render_with_error<T: Serialize>(
    jar: PrivateCookieJar,
    view: &'static str,
    model: T,
    error: Option<String>,
) -> Response {
    let (jar, mut flash) = cookies::take_flash(jar);
    if error.is_some() {
        flash.error = error;
    }
    (jar, Json(Page { view, model, flash })).into_response()
}

fn redirect_to_index<S>(
    state: &PortalState<S>,
    jar: PrivateCookieJar,
    controller: &str,
    kind: FlashKind,
    message: &str,
) -> Response {
    let jar = cookies::flash(jar, kind, message, state.settings.secure_cookies);
    (jar, Redirect::to(&action_path(controller, "Index"))).into_response()
}

// Extractor rejections carry deserializer text; it is logged, never rendered.
fn rejected(rejection: impl std::fmt::Display) -> ActionError {
    tracing::warn!(error = %rejection, "Request rejected by extractor");
    ActionError::Status(StatusCode::BAD_REQUEST)
}

// ── Authors ────────────────────────────────────────────────────────

async fn authors_index<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
) -> Result<Response, ActionError> {
    // Index is where business failures redirect to, so it renders them in place.
    match state.authors.list(&auth.token).await {
        Ok(authors) => Ok(render(jar, "Autores/Index", authors)),
        Err(ActionError::Application(message)) => {
            tracing::warn!(error = %message, "Author list unavailable");
            let empty = Vec::<Author>::new();
            Ok(render_with_error(jar, "Autores/Index", empty, Some(message)))
        }
        Err(e) => Err(e),
    }
}

async fn author_create_form(jar: PrivateCookieJar) -> Response {
    render(jar, "Autores/Create", Author::default())
}

async fn author_create<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    author: Result<Form<Author>, FormRejection>,
) -> Result<Response, ActionError> {
    let Form(author) = author.map_err(rejected)?;
    let author = normalize_author(author);
    if state.authors.create(&author, &auth.token).await? {
        return Ok(redirect_to_index(
            &state,
            jar,
            AUTHORS,
            FlashKind::Success,
            "Autor creado exitosamente",
        ));
    }
    Ok(render_with_error(
        jar,
        "Autores/Create",
        author,
        Some("No se pudo crear el autor".into()),
    ))
}

async fn author_details<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<AuthorId>, PathRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let author = state.authors.get(id, &auth.token).await?;
    Ok(render(jar, "Autores/Details", author))
}

async fn author_edit_form<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<AuthorId>, PathRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let author = state.authors.get(id, &auth.token).await?;
    Ok(render(jar, "Autores/Edit", author))
}

async fn author_edit<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<AuthorId>, PathRejection>,
    author: Result<Form<Author>, FormRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let Form(author) = author.map_err(rejected)?;
    let author = Author {
        id,
        ..normalize_author(author)
    };
    if state.authors.update(id, &author, &auth.token).await? {
        return Ok(redirect_to_index(
            &state,
            jar,
            AUTHORS,
            FlashKind::Success,
            "Autor actualizado exitosamente",
        ));
    }
    Ok(render_with_error(
        jar,
        "Autores/Edit",
        author,
        Some("No se pudo actualizar el autor".into()),
    ))
}

async fn author_delete_form<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<AuthorId>, PathRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let author = state.authors.get(id, &auth.token).await?;
    Ok(render(jar, "Autores/Delete", author))
}

async fn author_delete<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<AuthorId>, PathRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let (kind, message) = if state.authors.delete(id, &auth.token).await? {
        (FlashKind::Success, "Autor eliminado exitosamente")
    } else {
        (FlashKind::Error, "No se pudo eliminar el autor")
    };
    Ok(redirect_to_index(&state, jar, AUTHORS, kind, message))
}

// HTML forms post empty strings for untouched optional inputs.
fn normalize_author(mut author: Author) -> Author {
    author.city_of_origin = author.city_of_origin.filter(|c| !c.trim().is_empty());
    author.birth_date = author.birth_date.filter(|d| !d.trim().is_empty());
    author
}

// ── Books ──────────────────────────────────────────────────────────

/// Selectable author in the book form.
#[derive(Debug, Serialize)]
struct AuthorOption {
    id: AuthorId,
    name: String,
}

#[derive(Debug, Serialize)]
struct BookFormModel {
    book: Book,
    authors: Vec<AuthorOption>,
}

/// Author choices for the book form; an unavailable list degrades to empty.
async fn author_options<S: SessionStore>(
    state: &PortalState<S>,
    token: &str,
) -> Vec<AuthorOption> {
    match state.authors.list(token).await {
        Ok(authors) => authors
            .into_iter()
            .map(|a| AuthorOption {
                id: a.id,
                name: a.name,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Author options unavailable");
            Vec::new()
        }
    }
}

async fn books_index<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
) -> Result<Response, ActionError> {
    match state.books.list(&auth.token).await {
        Ok(books) => Ok(render(jar, "Libros/Index", books)),
        Err(ActionError::Application(message)) => {
            tracing::warn!(error = %message, "Book list unavailable");
            let empty = Vec::<Book>::new();
            Ok(render_with_error(jar, "Libros/Index", empty, Some(message)))
        }
        Err(e) => Err(e),
    }
}

async fn book_create_form<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
) -> Response {
    let model = BookFormModel {
        book: Book::default(),
        authors: author_options(&state, &auth.token).await,
    };
    render(jar, "Libros/Create", model)
}

async fn book_create<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    book: Result<Form<Book>, FormRejection>,
) -> Result<Response, ActionError> {
    let Form(book) = book.map_err(rejected)?;
    if state.books.create(&book, &auth.token).await? {
        return Ok(redirect_to_index(
            &state,
            jar,
            BOOKS,
            FlashKind::Success,
            "Libro creado exitosamente",
        ));
    }
    let model = BookFormModel {
        book,
        authors: author_options(&state, &auth.token).await,
    };
    Ok(render_with_error(
        jar,
        "Libros/Create",
        model,
        Some("No se pudo crear el libro".into()),
    ))
}

async fn book_details<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let book = state.books.get(id, &auth.token).await?;
    Ok(render(jar, "Libros/Details", book))
}

async fn book_edit_form<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let book = state.books.get(id, &auth.token).await?;
    let model = BookFormModel {
        book,
        authors: author_options(&state, &auth.token).await,
    };
    Ok(render(jar, "Libros/Edit", model))
}

async fn book_edit<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<BookId>, PathRejection>,
    book: Result<Form<Book>, FormRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let Form(book) = book.map_err(rejected)?;
    let book = Book { id, ..book };
    if state.books.update(id, &book, &auth.token).await? {
        return Ok(redirect_to_index(
            &state,
            jar,
            BOOKS,
            FlashKind::Success,
            "Libro actualizado exitosamente",
        ));
    }
    let model = BookFormModel {
        book,
        authors: author_options(&state, &auth.token).await,
    };
    Ok(render_with_error(
        jar,
        "Libros/Edit",
        model,
        Some("No se pudo actualizar el libro".into()),
    ))
}

async fn book_delete_form<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let book = state.books.get(id, &auth.token).await?;
    Ok(render(jar, "Libros/Delete", book))
}

async fn book_delete<S: SessionStore>(
    State(state): State<PortalState<S>>,
    auth: AuthSession,
    jar: PrivateCookieJar,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Response, ActionError> {
    let Path(id) = id.map_err(rejected)?;
    let (kind, message) = if state.books.delete(id, &auth.token).await? {
        (FlashKind::Success, "Libro eliminado exitosamente")
    } else {
        (FlashKind::Error, "No se pudo eliminar el libro")
    };
    Ok(redirect_to_index(&state, jar, BOOKS, kind, message))
}
