use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};

use super::classify::{GENERIC_REQUEST_FAILURE, classify_failures};
use super::config::PortalConfig;
use super::cookies::{self, FlashKind};
use super::gate::{AuthorizationOutcome, EXPIRED_SESSION_NOTICE, evaluate, require_auth};
use super::handlers;
use super::session::Session;
use super::state::PortalState;
use super::traits::SessionStore;
use super::types::Page;
use crate::api::ApiClient;
use crate::catalog::{AuthorService, BookService};
use crate::error::Error;
use crate::types::{LoginRequest, SessionId};

pub(crate) const LOGIN_PATH: &str = "/Auth/Login";
pub(crate) const HOME_PATH: &str = "/Home/Index";

/// Path of `action` on `controller`, following `/{controller}/{action}`.
#[must_use]
pub(crate) fn action_path(controller: &str, action: &str) -> String {
    format!("/{controller}/{action}")
}

/// Create the portal router.
///
/// Public pages (login, logout, dashboard) are mounted as-is; the author and
/// book pages run behind the authorization gate, wrapped by the failure
/// classifier.
///
/// # Errors
///
/// Returns [`Error::Http`] if the catalog API client cannot be built.
pub fn portal_routes<S>(config: PortalConfig, session_store: S) -> Result<Router, Error>
where
    S: SessionStore,
{
    let state = portal_state(config, session_store)?;

    let protected = handlers::catalog_routes::<S>()
        .route_layer(from_fn_with_state(state.clone(), require_auth::<S>));
    let protected = with_failure_handling(protected, &state);

    let router = Router::new()
        .route("/", get(login_page::<S>))
        .route(LOGIN_PATH, get(login_page::<S>).post(login::<S>))
        .route("/Auth/Logout", get(logout::<S>).post(logout::<S>))
        .route("/Home", get(home::<S>))
        .route(HOME_PATH, get(home::<S>))
        .merge(protected);

    Ok(router.with_state(state))
}

fn portal_state<S: SessionStore>(
    config: PortalConfig,
    session_store: S,
) -> Result<PortalState<S>, Error> {
    let api = Arc::new(ApiClient::new(config.api)?);
    Ok(PortalState {
        authors: Arc::new(AuthorService::new(api.clone())),
        books: Arc::new(BookService::new(api.clone())),
        api,
        session_store: Arc::new(session_store),
        validator: config.validator,
        settings: config.settings,
    })
}

/// Wrap `router` in the failure classifier, the outermost layer of every
/// protected page.
fn with_failure_handling<S: SessionStore>(
    router: Router<PortalState<S>>,
    state: &PortalState<S>,
) -> Router<PortalState<S>> {
    router.route_layer(from_fn_with_state(state.clone(), classify_failures::<S>))
}

// ── Login ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
struct LoginModel {
    username: Option<String>,
    error: Option<String>,
}

#[derive(Default, Deserialize)]
struct LoginForm {
    username: Option<String>,
    password: Option<String>,
}

fn login_view(jar: PrivateCookieJar, model: LoginModel) -> Response {
    let (jar, flash) = cookies::take_flash(jar);
    let page = Page {
        view: "Auth/Login",
        model,
        flash,
    };
    (jar, Json(page)).into_response()
}

async fn login_page<S: SessionStore>(
    State(state): State<PortalState<S>>,
    jar: PrivateCookieJar,
) -> Response {
    if let Some((_, session)) = current_session(&state, &jar).await {
        if evaluate(&session, state.validator.as_ref()) == AuthorizationOutcome::Allow {
            return Redirect::to(HOME_PATH).into_response();
        }
    }
    login_view(jar, LoginModel::default())
}

async fn login<S: SessionStore>(
    State(state): State<PortalState<S>>,
    jar: PrivateCookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    // An unreadable body is treated like an empty one.
    let form = form.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Login form rejected");
            LoginForm::default()
        },
        |Form(form)| form,
    );
    let username = form.username.unwrap_or_default().trim().to_string();
    let password = form.password.unwrap_or_default();

    let rerender = |jar, error: &str| {
        login_view(
            jar,
            LoginModel {
                username: Some(username.clone()).filter(|u| !u.is_empty()),
                error: Some(error.to_string()),
            },
        )
    };

    if username.is_empty() || password.is_empty() {
        return rerender(jar, "Por favor complete todos los campos requeridos");
    }

    let request = LoginRequest {
        username: username.clone(),
        password,
    };

    let token = match state.api.login(&request).await {
        Ok(Some(response)) => response.access_token.filter(|t| !t.is_empty()),
        Ok(None) => None,
        Err(e) => {
            tracing::error!(error = %e, "Login request failed");
            return rerender(
                jar,
                "No se pudo conectar con el backend. Verifica que el servicio esté disponible.",
            );
        }
    };

    let Some(token) = token else {
        return rerender(
            jar,
            "Usuario o contraseña incorrectos. Verifica las credenciales.",
        );
    };

    // Fresh id on every login; a pre-login id is never promoted, only dropped.
    if let Some(previous) = cookies::get_session_id(&jar, &state.settings.session_cookie_name) {
        if let Err(e) = state.session_store.clear(&previous).await {
            tracing::warn!(error = %e, "Previous session clear failed during login");
        }
    }
    let session_id = cookies::generate_session_id();
    if let Err(e) = state
        .session_store
        .save(&session_id, Session::authenticated(token, username.clone()))
        .await
    {
        tracing::error!(error = %e, "Session creation failed");
        return rerender(jar, GENERIC_REQUEST_FAILURE);
    }

    let session_cookie = cookies::session_cookie(
        &state.settings.session_cookie_name,
        &session_id,
        state.settings.session_ttl_minutes,
        state.settings.secure_cookies,
    );
    let jar = cookies::flash(
        jar.add(session_cookie),
        FlashKind::Success,
        format!("¡Bienvenido {username}!"),
        state.settings.secure_cookies,
    );

    tracing::info!(username = %username, "Login successful");

    (jar, Redirect::to(HOME_PATH)).into_response()
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<S: SessionStore>(
    State(state): State<PortalState<S>>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    if let Some(session_id) = cookies::get_session_id(&jar, &state.settings.session_cookie_name) {
        if let Err(e) = state.session_store.clear(&session_id).await {
            tracing::warn!(error = %e, "Session deletion failed during logout");
        }
    }

    let clear_cookie = cookies::clear_session_cookie(&state.settings.session_cookie_name);
    let jar = cookies::flash(
        jar.remove(clear_cookie),
        FlashKind::Success,
        "Sesión cerrada exitosamente",
        state.settings.secure_cookies,
    );
    (jar, Redirect::to(LOGIN_PATH))
}

// ── Dashboard ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct HomeModel {
    username: Option<String>,
}

async fn home<S: SessionStore>(
    State(state): State<PortalState<S>>,
    jar: PrivateCookieJar,
) -> Response {
    let current = current_session(&state, &jar).await;
    let outcome = current.as_ref().map_or(AuthorizationOutcome::RedirectToLogin, |(_, s)| {
        evaluate(s, state.validator.as_ref())
    });

    match (outcome, current) {
        (AuthorizationOutcome::Allow, Some((_, session))) => {
            let (jar, flash) = cookies::take_flash(jar);
            let page = Page {
                view: "Home/Index",
                model: HomeModel {
                    username: session.username().map(str::to_string),
                },
                flash,
            };
            (jar, Json(page)).into_response()
        }
        (AuthorizationOutcome::RedirectToLoginWithExpiryNotice, Some((session_id, _))) => {
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
        _ => {
            let jar = cookies::flash(
                jar,
                FlashKind::Error,
                "Debe iniciar sesión para acceder al dashboard",
                state.settings.secure_cookies,
            );
            (jar, Redirect::to(LOGIN_PATH)).into_response()
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────

async fn current_session<S: SessionStore>(
    state: &PortalState<S>,
    jar: &PrivateCookieJar,
) -> Option<(SessionId, Session)> {
    let session_id = cookies::get_session_id(jar, &state.settings.session_cookie_name)?;
    match state.session_store.load(&session_id).await {
        Ok(session) => Some((session_id, session)),
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed");
            None
        }
    }
}
