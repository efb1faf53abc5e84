//! End-to-end tests for the portal pipeline.
//!
//! Each test starts a stub catalog API and the portal on ephemeral ports and
//! drives the portal with a cookie-keeping `reqwest` client that does not
//! follow redirects.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::net::TcpListener;

use shelf_portal::ApiConfig;
use shelf_portal::middleware::{MemorySessionStore, PortalConfig, portal_routes};

const EXPIRY_NOTICE: &str = "Tu sesión ha expirado. Por favor, inicia sesión nuevamente.";

fn jwt_expiring_in(seconds: i64) -> String {
    let exp = OffsetDateTime::now_utc().unix_timestamp() + seconds;
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"lector","exp":{exp}}}"#));
    let signature = URL_SAFE_NO_PAD.encode(b"stub-signature");
    format!("{header}.{payload}.{signature}")
}

// ── Stub catalog API ───────────────────────────────────────────────

async fn stub_login(Json(body): Json<Value>) -> Response {
    let token = match (body["username"].as_str(), body["password"].as_str()) {
        (Some("lector"), Some("secreto")) => jwt_expiring_in(3600),
        (Some("caducado"), Some("secreto")) => jwt_expiring_in(-1),
        _ => return StatusCode::UNAUTHORIZED.into_response(),
    };
    Json(json!({
        "accessToken": token,
        "expiresAtUtc": "2030-01-01T00:00:00Z",
        "tokenType": "Bearer"
    }))
    .into_response()
}

fn has_bearer(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") && v.len() > "Bearer ".len())
}

async fn stub_list_authors(headers: HeaderMap) -> Response {
    if !has_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([
        { "id": 1, "nombre": "Gabriela Mistral", "email": "gm@example.com" }
    ]))
    .into_response()
}

async fn stub_get_author(headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !has_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id != 1 {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({ "id": 1, "nombre": "Gabriela Mistral", "email": "gm@example.com" }))
        .into_response()
}

async fn stub_slow_create() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(3)).await;
    StatusCode::CREATED
}

async fn stub_books_denied() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

// ── Harness ────────────────────────────────────────────────────────

struct TestHarness {
    client: Client,
    base_url: String,
    store: MemorySessionStore,
}

impl TestHarness {
    async fn new() -> Self {
        let stub = Router::new()
            .route("/api/v1/auth/login", post(stub_login))
            .route("/api/v1/autores", get(stub_list_authors).post(stub_slow_create))
            .route("/api/v1/autores/{id}", get(stub_get_author))
            .route("/api/v1/libros", get(stub_books_denied));
        let stub_addr = serve(stub).await;

        let api = ApiConfig::new(format!("http://{stub_addr}/api").parse().unwrap())
            .with_timeout(Duration::from_millis(500));
        let config = PortalConfig::new(api).with_secure_cookies(false);
        let store = MemorySessionStore::new();
        let app = portal_routes(config, store.clone()).expect("portal router");
        let portal_addr = serve(app).await;

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("client");

        Self {
            client,
            base_url: format!("http://{portal_addr}"),
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("request")
    }

    async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/Auth/Login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("login request")
    }
}

fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_anonymous_request_redirects_to_login() {
    let harness = TestHarness::new().await;

    let response = harness.get("/Autores").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/Auth/Login");
}

#[tokio::test]
async fn test_login_then_protected_page_is_allowed() {
    let harness = TestHarness::new().await;

    let response = harness.login("lector", "secreto").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/Home/Index");
    assert_eq!(harness.store.len(), 1);

    let response = harness.get("/Autores").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["view"], "Autores/Index");
    assert_eq!(page["model"][0]["nombre"], "Gabriela Mistral");
    assert_eq!(page["flash"]["Success"], "¡Bienvenido lector!");

    // Flash is one-shot; the session is untouched.
    let page: Value = harness.get("/Autores/Index").await.json().await.unwrap();
    assert!(page["flash"].get("Success").is_none());
    assert_eq!(harness.store.len(), 1);
}

#[tokio::test]
async fn test_dashboard_shows_username() {
    let harness = TestHarness::new().await;
    harness.login("lector", "secreto").await;

    let page: Value = harness.get("/Home/Index").await.json().await.unwrap();
    assert_eq!(page["view"], "Home/Index");
    assert_eq!(page["model"]["username"], "lector");
}

#[tokio::test]
async fn test_wrong_credentials_rerender_login() {
    let harness = TestHarness::new().await;

    let response = harness.login("lector", "equivocada").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["view"], "Auth/Login");
    assert_eq!(
        page["model"]["error"],
        "Usuario o contraseña incorrectos. Verifica las credenciales."
    );
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_missing_login_fields_are_rejected() {
    let harness = TestHarness::new().await;

    let response = harness.login("lector", "").await;
    let page: Value = response.json().await.unwrap();
    assert_eq!(
        page["model"]["error"],
        "Por favor complete todos los campos requeridos"
    );
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_expired_token_clears_session_with_notice() {
    let harness = TestHarness::new().await;

    harness.login("caducado", "secreto").await;
    assert_eq!(harness.store.len(), 1);

    let response = harness.get("/Autores").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/Auth/Login");
    assert!(harness.store.is_empty());

    let page: Value = harness.get("/Auth/Login").await.json().await.unwrap();
    assert_eq!(page["view"], "Auth/Login");
    assert_eq!(page["flash"]["Error"], EXPIRY_NOTICE);

    // Notice is shown once; the next protected request is a plain redirect.
    let page: Value = harness.get("/Auth/Login").await.json().await.unwrap();
    assert!(page["flash"].get("Error").is_none());
    let response = harness.get("/Autores").await;
    assert_eq!(location(&response), "/Auth/Login");
}

#[tokio::test]
async fn test_missing_author_renders_not_found_view() {
    let harness = TestHarness::new().await;
    harness.login("lector", "secreto").await;

    let response = harness.get("/Autores/Details/99").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let view: Value = response.json().await.unwrap();
    assert_eq!(view["view"], "NotFound");
    assert_eq!(view["statusCode"], 404);

    let response = harness.get("/Autores/Details/1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["view"], "Autores/Details");
}

#[tokio::test]
async fn test_remote_denial_clears_session() {
    let harness = TestHarness::new().await;
    harness.login("lector", "secreto").await;
    assert_eq!(harness.store.len(), 1);

    let response = harness.get("/Libros").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/Auth/Login");
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_backend_timeout_flashes_and_redirects_to_index() {
    let harness = TestHarness::new().await;
    harness.login("lector", "secreto").await;

    let response = harness
        .client
        .post(harness.url("/Autores/Create"))
        .form(&[("nombre", "Cesar Vallejo"), ("email", "cv@example.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/Autores/Index");

    let page: Value = harness.get("/Autores/Index").await.json().await.unwrap();
    let error = page["flash"]["Error"].as_str().unwrap();
    assert!(error.starts_with("Error al crear autor: "), "{error}");
    assert_eq!(harness.store.len(), 1);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let harness = TestHarness::new().await;
    harness.login("lector", "secreto").await;

    let response = harness.get("/Auth/Logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/Auth/Login");
    assert!(harness.store.is_empty());

    let page: Value = harness.get("/Auth/Login").await.json().await.unwrap();
    assert_eq!(page["flash"]["Success"], "Sesión cerrada exitosamente");

    let response = harness.get("/Autores").await;
    assert_eq!(location(&response), "/Auth/Login");
}

#[tokio::test]
async fn test_authenticated_login_page_redirects_home() {
    let harness = TestHarness::new().await;
    harness.login("lector", "secreto").await;

    let response = harness.get("/Auth/Login").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/Home/Index");
}

#[tokio::test]
async fn test_unparseable_id_renders_error_view() {
    let harness = TestHarness::new().await;
    harness.login("lector", "secreto").await;

    let response = harness.get("/Autores/Details/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await.unwrap();
    assert!(!body.contains("i64"), "{body}");

    let view: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(view["view"], "Error");
    assert_eq!(view["statusCode"], 400);
    assert_eq!(view["message"], "Ha ocurrido un error en la aplicación");
    assert_eq!(harness.store.len(), 1);
}

#[tokio::test]
async fn test_malformed_form_renders_error_view() {
    let harness = TestHarness::new().await;
    harness.login("lector", "secreto").await;

    let response = harness
        .client
        .post(harness.url("/Libros/Create"))
        .form(&[("titulo", "Trilce"), ("anio", "mil"), ("autorId", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await.unwrap();
    assert!(!body.contains("invalid digit"), "{body}");

    let view: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(view["view"], "Error");
    assert_eq!(view["statusCode"], 400);
}

#[tokio::test]
async fn test_repeated_logins_keep_one_session() {
    let harness = TestHarness::new().await;

    for _ in 0..5 {
        let response = harness.login("lector", "secreto").await;
        assert_eq!(location(&response), "/Home/Index");
    }
    assert_eq!(harness.store.len(), 1);

    let page: Value = harness.get("/Home/Index").await.json().await.unwrap();
    assert_eq!(page["model"]["username"], "lector");
}
