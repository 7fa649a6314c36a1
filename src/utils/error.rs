//! Error types for the Nagare client runtime

use thiserror::Error;

/// Main error type for runtime operations
#[derive(Debug, Error)]
pub enum NagareError {
    /// Transport-level failure, no response was received
    #[error("network error: {0}")]
    Network(#[from] NetworkError),
    /// Non-success HTTP status; the body has been rendered as an error page
    #[error("server error: HTTP {status}")]
    Server { status: u16 },
    /// 503 carrying a `Location` header; the document has navigated away
    #[error("redirected to {location}")]
    Redirected { location: String },
    /// DOM parsing or patching errors
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    /// Script execution errors
    #[error("script error: {0}")]
    JavaScript(#[from] JsError),
    /// A remote call or manifest payload was not valid JSON
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Network-specific errors
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection could not be established or was interrupted
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Connection timed out
    #[error("request timed out")]
    Timeout,
    /// The action URL is missing or cannot be resolved
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Rendering-specific errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// HTML parsing error
    #[error("HTML parse error: {0}")]
    HtmlParse(String),
}

/// JavaScript-specific errors
#[derive(Debug, Error)]
pub enum JsError {
    /// Script threw while executing
    #[error("execution failed: {0}")]
    Execution(String),
    /// The executor prelude could not be installed
    #[error("executor setup failed: {0}")]
    Setup(String),
    /// A recorded API call had an unexpected shape
    #[error("malformed API call: {0}")]
    MalformedCall(String),
}

impl NagareError {
    /// Whether the failure already produced a user-visible navigation
    /// (redirect or error page)
    pub fn is_handled_by_transport(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Redirected { .. })
    }
}

/// Convenience Result type for runtime operations
pub type Result<T> = std::result::Result<T, NagareError>;
