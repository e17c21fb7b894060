//! Report delivery to webhook endpoints.

pub mod error;
pub mod sink;
pub mod webhook;

pub use error::DeliveryError;
pub use sink::ReportSink;
pub use webhook::WebhookSink;
