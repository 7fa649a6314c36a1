//! HTTP request types

use crate::dom::FormData;
use crate::utils::{error::NetworkError, Result};
use url::Url;

/// HTTP methods used by background requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    /// `multipart/form-data` fields
    Multipart(FormData),
}

/// HTTP request
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: Body,
    credentials: bool,
}

impl Request {
    /// Create a new request
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: Body::Empty,
            credentials: false,
        }
    }

    /// Create a GET request from an absolute URL string
    pub fn get(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self::new(Method::Get, url))
    }

    /// Create a POST request
    pub fn post(url: Url) -> Self {
        Self::new(Method::Post, url)
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set the request body
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Send cookies with this request
    pub fn with_credentials(mut self, credentials: bool) -> Self {
        self.credentials = credentials;
        self
    }

    /// Get the URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Get headers in insertion order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get a header value, case-insensitively
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Get the body
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Whether cookies are attached
    pub fn credentials(&self) -> bool {
        self.credentials
    }
}
