//! Network stack for the runtime
//!
//! Background requests go through [`Transport`], which resolves action URLs
//! against the document and applies redirect and error-page handling. The
//! actual HTTP exchange sits behind the [`HttpClient`] trait so the runtime
//! can be driven by reqwest or by a scripted client.

mod client;
mod request;
mod response;
mod transport;

pub use client::{HttpClient, ReqwestClient};
pub use request::{Body, Method, Request};
pub use response::Response;
pub use transport::{RequestOptions, Transport};
