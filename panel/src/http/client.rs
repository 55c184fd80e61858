use anyhow::Result;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::constants::http::ENTRY_PATH;
use crate::errors::ApiError;
use crate::notifications::ToastCenter;
use crate::stores::SessionStore;

/// Navigation requests raised by the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were rejected and cleared; the UI should return to the entry page
    Expired { redirect_to: String },
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    session: SessionStore,
    toasts: ToastCenter,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionStore, toasts: ToastCenter) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        let (events, _) = broadcast::channel(16);

        info!(
            "API client targeting {} ({}s timeout)",
            config.base_url(),
            config.request_timeout_seconds
        );

        Ok(Self {
            base_url: config.base_url().to_string(),
            client,
            session,
            toasts,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn toasts(&self) -> &ToastCenter {
        &self.toasts
    }

    pub fn session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path).await;
        self.execute(request, Method::GET, path).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path).await.query(query);
        self.execute(request, Method::GET, path).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path).await.json(body);
        self.execute(request, Method::POST, path).await
    }

    /// POST whose response body is ignored
    pub async fn post_no_content<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path).await.json(body);
        self.dispatch(request, &Method::POST, path).await.map(|_| ())
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::PUT, path).await.json(body);
        self.execute(request, Method::PUT, path).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::PATCH, path).await.json(body);
        self.execute(request, Method::PATCH, path).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, path).await;
        self.dispatch(request, &Method::DELETE, path).await.map(|_| ())
    }

    /// Build a request with the stored bearer token attached
    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(token) = self.session.token().await {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(request, &method, path).await?;

        match response.json::<T>().await {
            Ok(value) => Ok(value),
            Err(e) => {
                let error = ApiError::Decode {
                    reason: e.to_string(),
                };
                error!("Failed to decode {} {} response: {}", method, path, e);
                self.report(&error).await;
                Err(error)
            }
        }
    }

    /// Send the request; any failure is classified and reported here
    async fn dispatch(
        &self,
        request: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        debug!("{} {}", method, path);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} {} got no response: {}", method, path, e);
                let error = ApiError::Network {
                    reason: e.to_string(),
                };
                self.report(&error).await;
                return Err(error);
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_failure(status, &body);
        warn!("{} {} failed with {}: {}", method, path, status, error);
        self.report(&error).await;
        Err(error)
    }

    /// The single notification (and 401 side effects) for a failed request
    async fn report(&self, error: &ApiError) {
        if matches!(error, ApiError::Unauthorized) {
            if let Err(e) = self.session.clear().await {
                error!("Failed to clear session after 401: {}", e);
            }
            let _ = self.events.send(SessionEvent::Expired {
                redirect_to: ENTRY_PATH.to_string(),
            });
        }
        self.toasts.error(error.notification_message()).await;
    }
}

/// Map a non-success response to its failure class
pub fn classify_failure(status: StatusCode, body: &str) -> ApiError {
    let message = server_message(body);

    match status.as_u16() {
        401 => ApiError::Unauthorized,
        403 => ApiError::Forbidden,
        404 => ApiError::NotFound,
        422 => ApiError::Validation { message },
        429 => ApiError::RateLimited,
        code if status.is_server_error() => ApiError::Server { status: code },
        code => ApiError::Unclassified {
            status: code,
            message,
        },
    }
}

fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}
