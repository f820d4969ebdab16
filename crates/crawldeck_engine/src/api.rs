use std::sync::Arc;
use std::time::Duration;

use crawldeck_logging::{deck_debug, deck_trace};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::{ApiError, BrokenLinkRecord, FailureKind, LinkCountRecord, UrlRecord};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Read access to the stored credential, consulted on every authorized request.
pub trait TokenSource: Send + Sync {
    fn bearer(&self) -> Option<String>;
}

/// No credential, ever. For clients that only sign in or register.
pub struct NoToken;

impl TokenSource for NoToken {
    fn bearer(&self) -> Option<String> {
        None
    }
}

/// The crawl backend's HTTP surface.
#[async_trait::async_trait]
pub trait ConsoleApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError>;

    async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ApiError>;

    async fn list_urls(&self) -> Result<Vec<UrlRecord>, ApiError>;

    async fn add_url(&self, url: &str) -> Result<(), ApiError>;

    async fn delete_url(&self, id: u64) -> Result<(), ApiError>;

    async fn start_urls(&self, ids: &[u64]) -> Result<(), ApiError>;

    async fn stop_urls(&self, ids: &[u64]) -> Result<(), ApiError>;

    async fn link_count(&self, id: u64) -> Result<LinkCountRecord, ApiError>;

    async fn broken_links(&self, id: u64) -> Result<Vec<BrokenLinkRecord>, ApiError>;
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct ReqwestApiClient {
    base: Url,
    client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
}

impl ReqwestApiClient {
    pub fn new(settings: ApiSettings, tokens: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        let mut base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            base,
            client,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn request(&self, method: Method, path: &str, authorized: bool) -> Result<RequestBuilder, ApiError> {
        let url = self
            .base
            .join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let mut builder = self.client.request(method, url).header(ACCEPT, "application/json");
        if authorized {
            match self.tokens.bearer() {
                Some(token) => builder = builder.bearer_auth(token),
                None => deck_trace!("No credential for {}", path),
            }
        }
        Ok(builder)
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>, ApiError> {
        let builder = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string()),
            None => builder,
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| body.error)
                .unwrap_or_default();
            deck_debug!("Backend answered {} ({})", status.as_u16(), message);
            return Err(ApiError::new(FailureKind::HttpStatus(status.as_u16()), message));
        }
        Ok(bytes.to_vec())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path, true)?;
        let bytes = self.send(builder, None).await?;
        decode(&bytes)
    }

    async fn post_ack(&self, path: &str, body: serde_json::Value) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, path, true)?;
        self.send(builder, Some(body)).await.map(|_| ())
    }

    async fn token(&self, path: &str, body: serde_json::Value) -> Result<String, ApiError> {
        let builder = self.request(Method::POST, path, false)?;
        let bytes = self.send(builder, Some(body)).await?;
        decode::<TokenBody>(&bytes).map(|body| body.token)
    }
}

#[async_trait::async_trait]
impl ConsoleApi for ReqwestApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        self.token(
            "login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        self.token(
            "register",
            serde_json::json!({
                "first_name": first_name,
                "last_name": last_name,
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    async fn list_urls(&self) -> Result<Vec<UrlRecord>, ApiError> {
        self.get::<Option<Vec<UrlRecord>>>("urls")
            .await
            .map(Option::unwrap_or_default)
    }

    async fn add_url(&self, url: &str) -> Result<(), ApiError> {
        self.post_ack("admin/urls", serde_json::json!({ "url": url }))
            .await
    }

    async fn delete_url(&self, id: u64) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("admin/urls/{id}"), true)?;
        self.send(builder, None).await.map(|_| ())
    }

    async fn start_urls(&self, ids: &[u64]) -> Result<(), ApiError> {
        self.post_ack("admin/urls/start", serde_json::json!({ "url_ids": ids }))
            .await
    }

    async fn stop_urls(&self, ids: &[u64]) -> Result<(), ApiError> {
        self.post_ack("admin/urls/stop", serde_json::json!({ "url_ids": ids }))
            .await
    }

    async fn link_count(&self, id: u64) -> Result<LinkCountRecord, ApiError> {
        self.get(&format!("urls/{id}/link-count")).await
    }

    async fn broken_links(&self, id: u64) -> Result<Vec<BrokenLinkRecord>, ApiError> {
        self.get::<Option<Vec<BrokenLinkRecord>>>(&format!("urls/{id}/broken-links"))
            .await
            .map(Option::unwrap_or_default)
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
