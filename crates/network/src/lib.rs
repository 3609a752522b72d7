// crates/network/src/lib.rs
//! HTTP plumbing for talking to the logging server
//!
//! Wraps `reqwest` with per-attempt timeouts and retry with backoff.

mod client;
mod error;
mod response;

pub use client::{Client, ClientConfig};
pub use error::{NetworkError, NetworkResult};
pub use response::{attachment_filename, HttpResponse};
pub use reqwest::multipart;
