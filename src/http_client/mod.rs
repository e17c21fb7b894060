//! This module provides a retryable HTTP client for webhook delivery.

mod client;

pub use client::create_retryable_http_client;
