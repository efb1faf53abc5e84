use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Error;
use crate::types::{LoginRequest, LoginResponse};

const LOGIN_ENDPOINT: &str = "v1/auth/login";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog API connection settings.
///
/// ```rust,ignore
/// use shelf_portal::ApiConfig;
///
/// let config = ApiConfig::new("http://localhost:5000/api".parse()?)
///     .with_timeout(std::time::Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
}

impl ApiConfig {
    /// Create a configuration for the API rooted at `base_url`.
    ///
    /// A trailing `/` is added to the path if missing so relative endpoints
    /// resolve beneath it.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout (default: 30 seconds).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Process-wide client for the catalog API.
///
/// Construct once and share behind an `Arc`; the inner `reqwest::Client` keeps
/// the connection pool. Bearer tokens are attached per request, never stored.
pub struct ApiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl ApiClient {
    /// Build the client and its pooled HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the TLS backend cannot be initialised.
    pub fn new(config: ApiConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    /// Resolve an endpoint path against the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the path cannot be joined onto the base.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("invalid endpoint {path}: {e}")))
    }

    /// Authenticate against the identity endpoint.
    ///
    /// Returns `Ok(None)` when the API answers with a non-success status
    /// (wrong credentials, locked account, ...).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure or an unreadable body.
    pub async fn login(&self, request: &LoginRequest) -> Result<Option<LoginResponse>, Error> {
        let url = self.endpoint(LOGIN_ENDPOINT)?;
        let response = self.http.post(url).json(request).send().await?;

        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                username = %request.username,
                "Login rejected by identity endpoint"
            );
            return Ok(None);
        }

        response.json::<LoginResponse>().await.map(Some).map_err(Into::into)
    }

    /// GET a JSON document with the caller's bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or [`Error::Api`] carrying the
    /// status code if the API answers with a non-success status.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        operation: &'static str,
    ) -> Result<T, Error> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::ensure_success(response, operation).await?;
        response.json::<T>().await.map_err(Into::into)
    }

    /// Send a write request (optionally with a JSON body) and report the status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure only; any status is returned as-is.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&B>,
    ) -> Result<StatusCode, Error> {
        let mut request = self
            .http
            .request(method, self.endpoint(path)?)
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Ok(response.status())
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        Err(Error::Api {
            operation,
            status,
            detail,
        })
    }
}
