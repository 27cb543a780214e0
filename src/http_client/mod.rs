/// Authenticated HTTP client
///
/// Single egress point for every backend call:
/// 1. Resolves the target service's base URL
/// 2. Decorates the request with the stored bearer token
/// 3. Recovers from a 401 through one coordinated token refresh and a
///    single retry (see `refresh`)
/// 4. Normalizes both response conventions into `Result<T, ClientError>`

mod navigator;
mod refresh;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::configuration::Settings;
use crate::error::{ApiError, ClientError, ConfigError};
use crate::logger::RequestTimer;
use crate::models::StandardResponse;
use crate::token_store::SessionStore;

pub use navigator::{LoggingNavigator, Navigator};
use refresh::{RefreshCoordinator, Refresher};

/// Body placeholder for calls that send parameters only in the query.
pub const NO_BODY: Option<&()> = None;

/// Backend service a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    User,
    Business,
    Product,
    Order,
}

/// How a service shapes its response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeConvention {
    /// `{ success, message, data, errorCode?, timestamp? }`
    Standard,
    /// The payload is the body
    Raw,
}

impl Backend {
    pub fn envelope(&self) -> EnvelopeConvention {
        match self {
            Backend::User => EnvelopeConvention::Standard,
            Backend::Business | Backend::Product | Backend::Order => EnvelopeConvention::Raw,
        }
    }
}

/// Per-request headers and query parameters
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn query_pairs(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn header(mut self, key: &str, value: impl ToString) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }
}

struct PreparedRequest {
    method: Method,
    backend: Backend,
    path: String,
    body: Option<Value>,
    options: RequestOptions,
    retried: bool,
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    settings: Settings,
    store: SessionStore,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    pub fn new(
        settings: &Settings,
        store: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(settings.http.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                ConfigError::InvalidValue(format!("http client: {}", e))
            })?;

        let refresher = Refresher::new(
            http_client.clone(),
            format!("{}/sessions/refresh", base(&settings.services.user_base_url)),
            store.clone(),
            navigator,
            settings.session.refresh_token_rotation,
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                settings: settings.clone(),
                store,
                refresh: RefreshCoordinator::new(refresher),
            }),
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        self.request(Method::GET, backend, path, NO_BODY, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        backend: Backend,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        self.request(Method::DELETE, backend, path, NO_BODY, options).await
    }

    pub async fn post<B, T>(
        &self,
        backend: Backend,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, backend, path, body, options).await
    }

    pub async fn put<B, T>(
        &self,
        backend: Backend,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, backend, path, body, options).await
    }

    pub async fn patch<B, T>(
        &self,
        backend: Backend,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, backend, path, body, options).await
    }

    /// Refreshes the access token now, sharing any refresh already in flight.
    ///
    /// Failure tears the session down like an unrecoverable 401 does.
    pub async fn refresh_session(&self) -> Result<(), ClientError> {
        self.inner.refresh.refresh().await
    }

    async fn request<B, T>(
        &self,
        method: Method,
        backend: Backend,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        self.execute(PreparedRequest {
            method,
            backend,
            path: path.to_string(),
            body,
            options,
            retried: false,
        })
        .await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        mut request: PreparedRequest,
    ) -> Result<T, ClientError> {
        loop {
            let token = self.inner.store.access_token()?;
            let response = self.dispatch(&request, token.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return decode_response(request.backend, response).await;
            }
            if request.retried {
                // Second 401 goes back to the caller as the backend sent it.
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    "Request rejected again after refresh"
                );
                return decode_response(request.backend, response).await;
            }

            tracing::info!(
                method = %request.method,
                path = %request.path,
                "Access token rejected, refreshing session"
            );
            request.retried = true;
            self.inner.refresh.recover(token.as_deref()).await?;
        }
    }

    async fn dispatch(
        &self,
        request: &PreparedRequest,
        token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.base_url(request.backend), request.path);
        let timer = RequestTimer::start(&request.method, &request.path, &request.options.query);

        let mut builder = self
            .inner
            .http_client
            .request(request.method.clone(), &url);
        builder = decorate(builder, token);
        for (key, value) in &request.options.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if !request.options.query.is_empty() {
            builder = builder.query(&request.options.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        match builder.send().await {
            Ok(response) => {
                timer.finish(response.status());
                Ok(response)
            }
            Err(e) => {
                timer.fail(&e.to_string());
                Err(e.into())
            }
        }
    }

    fn base_url(&self, backend: Backend) -> &str {
        let services = &self.inner.settings.services;
        let url = match backend {
            Backend::User => &services.user_base_url,
            Backend::Business => &services.business_base_url,
            Backend::Product => &services.product_base_url,
            Backend::Order => &services.order_base_url,
        };
        base(url)
    }
}

fn base(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Sets `Authorization: Bearer <token>` when a token is stored; nothing else.
fn decorate(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// Turns a response into the payload of `backend`'s convention.
async fn decode_response<T: DeserializeOwned>(
    backend: Backend,
    response: Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(ApiError::from_body(status.as_u16(), &body).into());
    }

    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };

    match backend.envelope() {
        EnvelopeConvention::Raw => Ok(serde_json::from_value(value)?),
        EnvelopeConvention::Standard => unwrap_envelope(status.as_u16(), value),
    }
}

fn unwrap_envelope<T: DeserializeOwned>(status: u16, value: Value) -> Result<T, ClientError> {
    if value.is_null() {
        return Ok(serde_json::from_value(Value::Null)?);
    }

    let envelope: StandardResponse<Value> = serde_json::from_value(value)?;
    if !envelope.success {
        return Err(ApiError {
            status,
            message: envelope.message,
            error_code: envelope.error_code,
        }
        .into());
    }

    Ok(serde_json::from_value(envelope.data.unwrap_or(Value::Null))?)
}
