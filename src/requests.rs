//! Fire-and-forget HTTP requests whose results are delivered to the event
//! loop.

use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::app::{EventLoopProxy, TokioRuntime};

/// The endpoint requests are sent to unless configured otherwise.
pub const DEFAULT_ENDPOINT: &str = "https://echo.free.beeceptor.com";

/// Returns the body sent with POST requests unless configured otherwise.
#[must_use]
pub fn default_payload() -> Value {
    json!({"Hello": "World!"})
}

/// An error that prevented a request from producing a JSON response.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum NetworkError {
    /// The request could not be sent or its response could not be received.
    #[error("request could not be completed: {0}")]
    Transport(String),
    /// The server responded with a non-success status code.
    #[error("server responded with status {0}")]
    Status(u16),
    /// The response body was not valid JSON.
    #[error("response body was not valid json: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// The eventual result of a request.
pub type ResponseFuture = Pin<Box<dyn Future<Output = Result<Value, NetworkError>> + Send>>;

/// A client capable of issuing JSON requests.
pub trait HttpClient: Send + Sync + 'static {
    /// Returns a future that performs a GET request to `url`.
    fn get(&self, url: &str) -> ResponseFuture;

    /// Returns a future that performs a POST request to `url` with `body`
    /// encoded as JSON.
    fn post(&self, url: &str, body: &Value) -> ResponseFuture;
}

/// An [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Returns a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying TLS backend cannot be initialized.
    pub fn new() -> Result<Self, NetworkError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
        })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> ResponseFuture {
        let request = self.client.get(url);
        Box::pin(async move {
            let response = request.send().await?.error_for_status()?;
            Ok(response.json::<Value>().await?)
        })
    }

    fn post(&self, url: &str, body: &Value) -> ResponseFuture {
        let request = self.client.post(url).json(body);
        Box::pin(async move {
            let response = request.send().await?.error_for_status()?;
            Ok(response.json::<Value>().await?)
        })
    }
}

/// Issues requests on a background runtime and hands the results back to an
/// event loop.
///
/// Requests cannot be cancelled, are never retried, and have no timeout
/// beyond the client's own. Every result is logged; failures never reach
/// further than the completion callback.
#[derive(Clone)]
pub struct RequestManager {
    client: Arc<dyn HttpClient>,
    endpoint: String,
    payload: Value,
    runtime: TokioRuntime,
    event_loop: EventLoopProxy,
}

impl RequestManager {
    /// Returns a manager that sends requests with `client` on `runtime`, and
    /// delivers results through `event_loop`.
    pub fn new(
        client: impl HttpClient,
        runtime: TokioRuntime,
        event_loop: EventLoopProxy,
    ) -> Self {
        Self {
            client: Arc::new(client),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            payload: default_payload(),
            runtime,
            event_loop,
        }
    }

    /// Sets the URL requests are sent to and returns self.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the body [`post_logged()`](Self::post_logged) sends and returns
    /// self.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Returns the URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the body [`post_logged()`](Self::post_logged) sends.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Sends a GET request, invoking `on_complete` on the event loop with its
    /// result.
    pub fn get<F>(&self, on_complete: F)
    where
        F: FnOnce(Result<Value, NetworkError>) + Send + 'static,
    {
        let response = self.client.get(&self.endpoint);
        self.dispatch("GET", response, on_complete);
    }

    /// Sends a POST request with `payload`, invoking `on_complete` on the
    /// event loop with its result.
    pub fn post<F>(&self, payload: &Value, on_complete: F)
    where
        F: FnOnce(Result<Value, NetworkError>) + Send + 'static,
    {
        let response = self.client.post(&self.endpoint, payload);
        self.dispatch("POST", response, on_complete);
    }

    /// Sends a GET request whose result is only logged.
    pub fn get_logged(&self) {
        self.get(|_| {});
    }

    /// Sends a POST request with the configured payload whose result is only
    /// logged.
    pub fn post_logged(&self) {
        self.post(&self.payload, |_| {});
    }

    fn dispatch<F>(&self, method: &'static str, response: ResponseFuture, on_complete: F)
    where
        F: FnOnce(Result<Value, NetworkError>) + Send + 'static,
    {
        let url = self.endpoint.clone();
        let event_loop = self.event_loop.clone();
        self.runtime.spawn(async move {
            let result = response.await;
            match &result {
                Ok(body) => info!(method, %url, %body, "request completed"),
                Err(err) => error!(method, %url, %err, "request failed"),
            }
            if event_loop.post(move || on_complete(result)).is_err() {
                warn!(method, %url, "event loop closed before the response arrived");
            }
        });
    }
}

impl Debug for RequestManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestManager")
            .field("endpoint", &self.endpoint)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}
