//! The delivery interface the engine pushes reports through.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::error::DeliveryError;
use crate::models::Report;

/// Delivers rendered reports to their output group.
///
/// An `Ok` return means the text body was accepted by an endpoint; image
/// delivery is best-effort and never fails the report.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Delivers one report to an endpoint of its group.
    async fn deliver(&self, report: &Report) -> Result<(), DeliveryError>;
}
