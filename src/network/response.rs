//! HTTP response types

use crate::utils::Result;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    /// Header names are stored lowercase
    headers: HashMap<String, String>,
    body: String,
}

impl Response {
    /// Create a new response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Create a new response with headers
    pub fn with_headers<I, K, V>(status: u16, body: impl Into<String>, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut response = Self::new(status, body);
        for (key, value) in headers {
            response.add_header(key, value);
        }
        response
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Check if the response was successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response is a 503 carrying a `Location` header
    pub fn is_unavailable_redirect(&self) -> bool {
        self.status == 503 && self.location().is_some()
    }

    /// Get the response body
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Consume the response, returning its body
    pub fn into_text(self) -> String {
        self.body
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Get the content type from headers
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the `Location` header
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Get a specific header, case-insensitively
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Add a header
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(Response::new(204, "").is_success());
        assert!(!Response::new(500, "").is_success());
        assert!(!Response::new(503, "").is_unavailable_redirect());
        assert!(Response::with_headers(503, "", [("Location", "/login")]).is_unavailable_redirect());
    }

    #[test]
    fn test_headers_case_insensitive() {
        let response = Response::with_headers(200, "{}", [("Content-Type", "application/json")]);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn test_json_body() {
        let response = Response::new(200, r#"{"count": 3}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["count"], 3);
        assert!(Response::new(200, "not json").json::<serde_json::Value>().is_err());
    }
}
