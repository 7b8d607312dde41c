//! Blocking client for the Test Monitor results API.
//!
//! # Overview
//! Creates, updates, and deletes test results and their steps. Payloads are
//! opaque JSON objects; the client wraps them in the request envelopes the
//! server expects and attaches the `X-NI-API-KEY` header.
//!
//! # Design
//! - `ResultsClient` owns its `ClientConfig`; there is no global state.
//! - Each operation is split into `build_*` (validates, produces request) and
//!   `parse_*` (consumes response), with one-call methods on top that run
//!   both through a `Transport`.
//! - `UreqTransport` is the default transport. Tests substitute their own.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::ResultsClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use transport::UreqTransport;
pub use types::Record;
