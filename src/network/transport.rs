//! Background request transport
//!
//! Builds and issues the runtime's requests and applies the protocol's
//! failure handling: a 503 with `Location` navigates the document, any other
//! non-2xx status replaces the document with the error page.

use super::request::{Body, Method, Request};
use super::{HttpClient, Response};
use crate::dom::{FormData, SharedDocument};
use crate::security;
use crate::utils::{error::NetworkError, NagareError, Result, RuntimeConfig};
use serde_json::Value;
use std::rc::Rc;

/// How a request is sent
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Body,
}

impl RequestOptions {
    /// Plain GET
    pub fn get() -> Self {
        Self::default()
    }

    /// POST with a multipart body
    pub fn post(data: FormData) -> Self {
        Self {
            method: Method::Post,
            body: Body::Multipart(data),
        }
    }
}

/// Issues background requests on behalf of one document
#[derive(Clone)]
pub struct Transport {
    client: Rc<dyn HttpClient>,
    document: SharedDocument,
    config: Rc<RuntimeConfig>,
}

impl Transport {
    /// Create a transport for `document`
    pub fn new(client: Rc<dyn HttpClient>, document: SharedDocument, config: Rc<RuntimeConfig>) -> Self {
        Self {
            client,
            document,
            config,
        }
    }

    /// Document this transport acts for
    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Build the request for `url`, resolved against the document URL
    pub fn build_request(
        &self,
        url: Option<&str>,
        options: RequestOptions,
        extra_params: &[Value],
    ) -> Result<Request> {
        let url = url.ok_or_else(|| NetworkError::InvalidUrl("missing action URL".to_string()))?;

        let (mut target, credentials) = {
            let document = self.document.borrow();
            let target = document.resolve(url)?;
            let credentials = security::credentials_allowed(document.url(), &target);
            (target, credentials)
        };

        if !extra_params.is_empty() {
            let encoded = serde_json::to_string(extra_params)?;
            target
                .query_pairs_mut()
                .append_pair(&self.config.params_key, &encoded);
        }

        let (header, value) = &self.config.background_header;
        Ok(Request::new(options.method, target)
            .header(header.as_str(), value.as_str())
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .with_body(options.body)
            .with_credentials(credentials))
    }

    /// Send a background request.
    ///
    /// Resolves with the raw response on 2xx; every other outcome is an
    /// error, after the redirect or error page has been applied.
    pub async fn send(
        &self,
        url: Option<&str>,
        options: RequestOptions,
        extra_params: &[Value],
    ) -> Result<Response> {
        let request = self.build_request(url, options, extra_params)?;
        log::debug!("{} {}", request.method().as_str(), request.url());

        let response = self.client.execute(request).await?;

        if response.is_success() {
            return Ok(response);
        }

        if response.is_unavailable_redirect() {
            let location = response.location().unwrap_or_default().to_string();
            let target = self.document.borrow().resolve(&location)?;
            self.document.borrow_mut().navigate(target);
            return Err(NagareError::Redirected { location });
        }

        let status = response.status();
        log::warn!("HTTP {} received, rendering error page", status);
        if let Err(e) = self.document.borrow_mut().rewrite(response.text()) {
            log::debug!("error page could not be rendered: {}", e);
        }
        Err(NagareError::Server { status })
    }
}
