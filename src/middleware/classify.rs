use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;
use futures_util::FutureExt;

use super::cookies::{self, FlashKind};
use super::error::{ActionError, RaisedFailure};
use super::routes::{LOGIN_PATH, action_path};
use super::state::PortalState;
use super::traits::SessionStore;
use super::types::{ErrorView, ErrorViewName};

/// Marker that lets a service message reach the user verbatim.
pub(crate) const OPERATION_FAILED_MARKER: &str = "Error al";
pub(crate) const GENERIC_REQUEST_FAILURE: &str = "Ha ocurrido un error al procesar tu solicitud";
pub(crate) const STATUS_FAILURE: &str = "Ha ocurrido un error en la aplicación";
pub(crate) const UNEXPECTED_FAILURE: &str =
    "Ha ocurrido un error inesperado. Por favor, intenta nuevamente.";
pub(crate) const NOT_FOUND: &str = "El recurso solicitado no existe";

const DEFAULT_CONTROLLER: &str = "Home";

/// User-facing outcome of a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    ClearSessionAndRedirectToLogin,
    NotFoundPage,
    GenericErrorPage {
        status_code: StatusCode,
        message: &'static str,
    },
    FlashErrorAndRedirect {
        controller: String,
        action: &'static str,
        message: String,
    },
}

/// Map a failure onto exactly one outcome. Pure.
///
/// `controller` is the controller that was executing, if any.
#[must_use]
pub fn classify(failure: &ActionError, controller: Option<&str>) -> FailureOutcome {
    match failure {
        ActionError::Unauthorized => FailureOutcome::ClearSessionAndRedirectToLogin,
        ActionError::Status(StatusCode::NOT_FOUND) => FailureOutcome::NotFoundPage,
        ActionError::Status(status_code) => FailureOutcome::GenericErrorPage {
            status_code: *status_code,
            message: STATUS_FAILURE,
        },
        ActionError::Application(message) => FailureOutcome::FlashErrorAndRedirect {
            controller: controller.unwrap_or(DEFAULT_CONTROLLER).to_string(),
            action: "Index",
            message: if message.contains(OPERATION_FAILED_MARKER) {
                message.clone()
            } else {
                GENERIC_REQUEST_FAILURE.to_string()
            },
        },
        ActionError::Unexpected(_) => FailureOutcome::GenericErrorPage {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            message: UNEXPECTED_FAILURE,
        },
    }
}

/// Controller name of a request path: its first segment.
#[must_use]
pub fn controller_from_path(path: &str) -> Option<&str> {
    path.split('/').find(|segment| !segment.is_empty())
}

/// Middleware turning raised [`ActionError`]s into user-facing responses.
///
/// Responses without a raised failure pass through untouched. A panic in an
/// inner layer or handler is raised as [`ActionError::Unexpected`]. Every
/// failure is logged before classification.
pub(crate) async fn classify_failures<S: SessionStore>(
    State(state): State<PortalState<S>>,
    jar: PrivateCookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let mut response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => ActionError::unexpected(format!(
            "action panicked: {}",
            panic_message(panic.as_ref())
        ))
        .into_response(),
    };

    let Some(RaisedFailure(failure)) = response.extensions_mut().remove::<RaisedFailure>() else {
        return response;
    };

    tracing::error!(error = %failure, detail = ?failure, path = %path, "Action failed");

    let outcome = classify(&failure, controller_from_path(&path));
    render(&state, jar, outcome).await
}

async fn render<S: SessionStore>(
    state: &PortalState<S>,
    jar: PrivateCookieJar,
    outcome: FailureOutcome,
) -> Response {
    match outcome {
        FailureOutcome::ClearSessionAndRedirectToLogin => {
            if let Some(session_id) =
                cookies::get_session_id(&jar, &state.settings.session_cookie_name)
            {
                if let Err(e) = state.session_store.clear(&session_id).await {
                    tracing::warn!(error = %e, "Session clear failed after access denial");
                }
            }
            Redirect::to(LOGIN_PATH).into_response()
        }
        FailureOutcome::NotFoundPage => {
            error_view(ErrorViewName::NotFound, StatusCode::NOT_FOUND, NOT_FOUND)
        }
        FailureOutcome::GenericErrorPage {
            status_code,
            message,
        } => error_view(ErrorViewName::Error, status_code, message),
        FailureOutcome::FlashErrorAndRedirect {
            controller,
            action,
            message,
        } => {
            let secure = state.settings.secure_cookies;
            let jar = cookies::flash(jar, FlashKind::Error, message, secure);
            (jar, Redirect::to(&action_path(&controller, action))).into_response()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn error_view(view: ErrorViewName, status_code: StatusCode, message: &str) -> Response {
    let body = ErrorView {
        view,
        message: message.to_string(),
        status_code: status_code.as_u16(),
    };
    (status_code, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_clears_session() {
        assert_eq!(
            classify(&ActionError::Unauthorized, Some("Autores")),
            FailureOutcome::ClearSessionAndRedirectToLogin
        );
    }

    #[test]
    fn test_not_found_status_yields_not_found_page() {
        assert_eq!(
            classify(&ActionError::Status(StatusCode::NOT_FOUND), Some("Libros")),
            FailureOutcome::NotFoundPage
        );
    }

    #[test]
    fn test_other_status_yields_error_page_with_that_code() {
        assert_eq!(
            classify(&ActionError::Status(StatusCode::BAD_GATEWAY), None),
            FailureOutcome::GenericErrorPage {
                status_code: StatusCode::BAD_GATEWAY,
                message: STATUS_FAILURE,
            }
        );
    }

    #[test]
    fn test_marked_business_message_is_preserved() {
        let failure = ActionError::Application("Error al crear autor: timeout".into());
        assert_eq!(
            classify(&failure, Some("Autores")),
            FailureOutcome::FlashErrorAndRedirect {
                controller: "Autores".into(),
                action: "Index",
                message: "Error al crear autor: timeout".into(),
            }
        );
    }

    #[test]
    fn test_unmarked_business_message_is_replaced() {
        let failure = ActionError::Application("socket closed by peer 10.0.0.3".into());
        let FailureOutcome::FlashErrorAndRedirect { message, .. } = classify(&failure, None) else {
            panic!("expected flash outcome");
        };
        assert_eq!(message, GENERIC_REQUEST_FAILURE);
    }

    #[test]
    fn test_business_failure_without_controller_goes_home() {
        let failure = ActionError::Application("Error al obtener libros: timeout".into());
        let FailureOutcome::FlashErrorAndRedirect { controller, .. } = classify(&failure, None)
        else {
            panic!("expected flash outcome");
        };
        assert_eq!(controller, "Home");
    }

    #[test]
    fn test_unexpected_failure_hides_its_message() {
        let failure = ActionError::unexpected("connection string user=sa password=hunter2");
        let outcome = classify(&failure, Some("Autores"));
        assert_eq!(
            outcome,
            FailureOutcome::GenericErrorPage {
                status_code: StatusCode::INTERNAL_SERVER_ERROR,
                message: UNEXPECTED_FAILURE,
            }
        );
        assert!(!format!("{outcome:?}").contains("hunter2"));
    }

    #[test]
    fn test_controller_is_first_path_segment() {
        assert_eq!(controller_from_path("/Autores/Edit/3"), Some("Autores"));
        assert_eq!(controller_from_path("/Libros"), Some("Libros"));
        assert_eq!(controller_from_path("/"), None);
        assert_eq!(controller_from_path(""), None);
    }

    #[test]
    fn test_panic_message_from_payload() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(literal.as_ref()), "boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(owned.as_ref()), "owned boom");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_error_view_payload() {
        let response = error_view(ErrorViewName::Error, StatusCode::BAD_GATEWAY, STATUS_FAILURE);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
