//! Sales backend API client.
//!
//! All calls go to the `/vendas/` application of the backend. Reads return
//! JSON that either carries the success shape or an `{erro}` field; the sale
//! submission answers `{sucesso, ...}`. Both structured failures surface as
//! [`ApiError::Rejected`].
//!
//! The finalize POST is CSRF-protected: fetching the register page (the
//! catalog) primes the `csrftoken` cookie in the client's jar, and its value
//! is echoed back in the `X-CSRFToken` header.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::ApiError;
use crate::models::{DayPreview, MonthReport, QuickStats, ReportArtifact, SaleReceipt, SaleRequest};

/// Default timeout for API requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Mount point of the sales application on the backend.
const APP_PREFIX: &str = "/vendas";

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Shown when a finalize rejection carries no message.
const DEFAULT_SALE_REJECTION: &str = "Erro ao finalizar venda";

#[async_trait]
pub trait SalesBackend: Send + Sync {
    /// Products embedded in the register page.
    async fn fetch_catalog(&self) -> Result<Catalog, ApiError>;

    async fn quick_stats(&self) -> Result<QuickStats, ApiError>;

    async fn month_report(&self, year: i32, month: u32) -> Result<MonthReport, ApiError>;

    async fn day_preview(&self, year: i32, month: u32, day: u32)
        -> Result<DayPreview, ApiError>;

    async fn finalize_sale(&self, request: &SaleRequest) -> Result<SaleReceipt, ApiError>;

    async fn download(&self, artifact: &ReportArtifact) -> Result<Vec<u8>, ApiError>;
}

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
/// - strip a trailing `/vendas` segment
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if url.is_empty() {
        return url;
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    if url.ends_with(APP_PREFIX) {
        url.truncate(url.len() - APP_PREFIX.len());
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

/// Value of cookie `name` in a `Cookie:` header string (`a=1; b=2`).
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.trim().to_string())
    })
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach sales backend at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid sales backend URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        403 => "Request refused by sales backend (CSRF token missing or expired)".to_string(),
        404 => "Sales backend endpoint not found".to_string(),
        s if s >= 500 => format!("Sales backend server error (HTTP {s})"),
        s => format!("Unexpected response from sales backend (HTTP {s})"),
    }
}

/// Application-level rejection carried in an otherwise well-formed body.
pub fn rejection_message(json: &Value) -> Option<String> {
    match json.get("erro") {
        Some(Value::Null) | None => {}
        Some(Value::String(s)) => return Some(s.clone()),
        Some(other) => return Some(other.to_string()),
    }

    if json.get("sucesso").and_then(Value::as_bool) == Some(false) {
        let message = json
            .get("mensagem")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SALE_REJECTION);
        return Some(message.to_string());
    }

    None
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpBackend {
    client: Client,
    jar: Arc<Jar>,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url);
        Url::parse(&base_url)
            .map_err(|e| ApiError::Transport(format!("Invalid sales backend URL {base_url}: {e}")))?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(timeout)
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{APP_PREFIX}{path}", self.base_url)
    }

    /// Current CSRF token from the cookie jar, if the backend issued one.
    pub fn csrf_token(&self) -> Option<String> {
        let url = Url::parse(&self.base_url).ok()?;
        let header = self.jar.cookies(&url)?;
        cookie_value(header.to_str().ok()?, CSRF_COOKIE)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let mut req = self.client.get(&url);
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.base_url, &e)))?;
        self.read_json(resp).await
    }

    async fn read_json(&self, resp: Response) -> Result<Value, ApiError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.base_url, &e)))?;
        let parsed = serde_json::from_str::<Value>(&body);

        if !status.is_success() {
            if let Some(message) = parsed.as_ref().ok().and_then(rejection_message) {
                return Err(ApiError::Rejected(message));
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: status_error(status),
            });
        }

        let json = parsed?;
        if let Some(message) = rejection_message(&json) {
            return Err(ApiError::Rejected(message));
        }
        Ok(json)
    }
}

#[async_trait]
impl SalesBackend for HttpBackend {
    async fn fetch_catalog(&self) -> Result<Catalog, ApiError> {
        let url = self.url("/registrar-vendas/");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.base_url, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: status_error(status),
            });
        }

        let html = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.base_url, &e)))?;
        let catalog =
            Catalog::from_embedded_page(&html).map_err(|e| ApiError::Decode(e.to_string()))?;

        if self.csrf_token().is_none() {
            warn!("Register page did not set a CSRF cookie; sale submission may be refused");
        }
        info!(products = catalog.len(), "Catalog loaded from register page");
        Ok(catalog)
    }

    async fn quick_stats(&self) -> Result<QuickStats, ApiError> {
        let json = self.get_json("/estatisticas-rapidas/", &[]).await?;
        Ok(serde_json::from_value(json)?)
    }

    async fn month_report(&self, year: i32, month: u32) -> Result<MonthReport, ApiError> {
        let json = self
            .get_json(
                "/buscar-relatorios-mes/",
                &[("ano", year.to_string()), ("mes", month.to_string())],
            )
            .await?;
        Ok(serde_json::from_value(json)?)
    }

    async fn day_preview(
        &self,
        year: i32,
        month: u32,
        day: u32,
    ) -> Result<DayPreview, ApiError> {
        let path = format!("/preview-relatorio-diario/{year}/{month}/{day}/");
        let json = self.get_json(&path, &[]).await?;
        Ok(serde_json::from_value(json)?)
    }

    async fn finalize_sale(&self, request: &SaleRequest) -> Result<SaleReceipt, ApiError> {
        let url = self.url("/finalizar-venda/");
        let mut req = self
            .client
            .post(&url)
            .header("Referer", format!("{}/", self.base_url))
            .json(request);

        match self.csrf_token() {
            Some(token) => req = req.header(CSRF_HEADER, token),
            None => warn!("No CSRF token available for sale submission"),
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.base_url, &e)))?;
        let json = self.read_json(resp).await?;
        Ok(serde_json::from_value(json)?)
    }

    async fn download(&self, artifact: &ReportArtifact) -> Result<Vec<u8>, ApiError> {
        let url = self.url(&artifact.path());
        debug!(url = %url, "GET artifact");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.base_url, &e)))?;

        if !resp.status().is_success() {
            // Error pages may still carry {erro}.
            return match self.read_json(resp).await {
                Ok(_) => Err(ApiError::Decode("empty artifact".to_string())),
                Err(e) => Err(e),
            };
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(friendly_error(&self.base_url, &e)))?;
        Ok(bytes.to_vec())
    }
}
