//! HTTP client for the bootstrap and usage endpoints.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;

use super::error::PollError;
use super::types::UsageResponse;

const APP_USER_AGENT: &str = concat!("usage-tray/", env!("CARGO_PKG_VERSION"));

/// Global HTTP client for reuse across cycles (avoids TLS handshake overhead)
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client(timeout: Duration) -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("UsageClient: falling back to default HTTP client: {}", e);
                Client::new()
            })
    })
}

/// Source of the two documents a poll cycle needs.
pub trait UsageApi {
    /// Fetch the bootstrap document and extract the organization id.
    fn fetch_org_id(&self) -> impl Future<Output = Result<String, PollError>> + Send;

    /// Fetch the usage document for an organization.
    fn fetch_usage(
        &self,
        org_id: &str,
    ) -> impl Future<Output = Result<UsageResponse, PollError>> + Send;
}

type SessionKeyProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// `UsageApi` over HTTPS with the browser session cookie as credentials.
///
/// The session key is looked up on every request, so a key stored mid-run
/// is picked up by the next cycle. The lookup may block on the keyring and
/// runs on the blocking pool.
pub struct WebUsageClient {
    base_url: String,
    session_key: SessionKeyProvider,
    client: &'static Client,
}

impl WebUsageClient {
    pub fn new(
        base_url: &str,
        session_key: impl Fn() -> Option<String> + Send + Sync + 'static,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_key: Arc::new(session_key),
            client: get_http_client(timeout),
        }
    }

    pub fn bootstrap_url(&self) -> String {
        format!("{}/api/bootstrap", self.base_url)
    }

    pub fn usage_url(&self, org_id: &str) -> String {
        format!("{}/api/organizations/{}/usage", self.base_url, org_id)
    }

    async fn session_key(&self) -> Result<String, PollError> {
        let provider = Arc::clone(&self.session_key);
        let key = tokio::task::spawn_blocking(move || provider())
            .await
            .unwrap_or_else(|e| {
                log::warn!("UsageClient: session key lookup failed: {}", e);
                None
            });
        key.filter(|k| !k.is_empty())
            .ok_or(PollError::MissingSession)
    }

    async fn headers(&self) -> Result<HeaderMap, PollError> {
        let key = self.session_key().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("sessionKey={}", key))
                .map_err(|_| PollError::InvalidSessionKey)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(APP_USER_AGENT));
        Ok(headers)
    }

    async fn get_json(&self, endpoint: &'static str, url: &str) -> Result<Value, PollError> {
        let headers = self.headers().await?;

        log::debug!("UsageClient: GET {}", url);
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| PollError::Network(format!("{}: {}", endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Http {
                endpoint,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| PollError::Parse(format!("{}: {}", endpoint, e)))
    }
}

impl UsageApi for WebUsageClient {
    async fn fetch_org_id(&self) -> Result<String, PollError> {
        let body = self.get_json("bootstrap", &self.bootstrap_url()).await?;
        extract_org_id(&body)
    }

    async fn fetch_usage(&self, org_id: &str) -> Result<UsageResponse, PollError> {
        let body = self.get_json("usage", &self.usage_url(org_id)).await?;
        serde_json::from_value(body).map_err(|e| PollError::Parse(format!("usage: {}", e)))
    }
}

/// Pull `account.memberships[0].organization.uuid` out of the bootstrap document.
pub fn extract_org_id(bootstrap: &Value) -> Result<String, PollError> {
    let org_id = bootstrap
        .pointer("/account/memberships/0/organization/uuid")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty());

    match org_id {
        Some(id) => Ok(id.to_string()),
        None if bootstrap.pointer("/account").is_none() => Err(PollError::OrgUnresolved(
            "bootstrap has no account (session expired?)".to_string(),
        )),
        None => Err(PollError::OrgUnresolved(
            "no organization membership in bootstrap".to_string(),
        )),
    }
}
