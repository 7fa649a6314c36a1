//! HTTP client implementation

use super::request::{Body, Method, Request};
use super::Response;
use crate::utils::{error::NetworkError, Result, RuntimeConfig};
use futures::future::LocalBoxFuture;
use futures::FutureExt;

/// Something that can perform an HTTP exchange.
///
/// The runtime is single-threaded, so returned futures need not be `Send`.
pub trait HttpClient {
    /// Execute an HTTP request
    fn execute(&self, request: Request) -> LocalBoxFuture<'_, Result<Response>>;
}

/// HTTP client backed by reqwest
///
/// Two connection pools are kept: one with a cookie store for requests to
/// the document's own origin, and an anonymous one for everything else.
pub struct ReqwestClient {
    credentialed: reqwest::Client,
    anonymous: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new HTTP client
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let credentialed = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .build()
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;
        let anonymous = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            credentialed,
            anonymous,
        })
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let client = if request.credentials() {
            &self.credentialed
        } else {
            &self.anonymous
        };

        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };
        let mut req = client.request(method, request.url().clone());

        for (name, value) in request.headers() {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Body::Multipart(data) = request.body() {
            let mut form = reqwest::multipart::Form::new();
            for (name, value) in data.entries() {
                form = form.text(name.clone(), value.clone());
            }
            req = req.multipart(form);
        }

        log::trace!("{} {}", request.method().as_str(), request.url());
        let response = req.send().await.map_err(map_error)?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response.text().await.map_err(map_error)?;

        Ok(Response::with_headers(status, body, headers))
    }
}

impl HttpClient for ReqwestClient {
    fn execute(&self, request: Request) -> LocalBoxFuture<'_, Result<Response>> {
        self.send(request).boxed_local()
    }
}

fn map_error(error: reqwest::Error) -> crate::utils::NagareError {
    if error.is_timeout() {
        NetworkError::Timeout.into()
    } else {
        NetworkError::ConnectionFailed(error.to_string()).into()
    }
}
