//! Webhook delivery implementation.
//!
//! Sends reports to group-chat bot webhooks. For each report the sink first
//! attempts an image message built from the product logo, then always sends
//! the text body. Only the text send decides success; image failures degrade
//! silently to text-only.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use md5::{Digest, Md5};
use reqwest_middleware::ClientWithMiddleware;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::{error::DeliveryError, sink::ReportSink};
use crate::{config::WebhookConfig, models::Report};

/// Bot APIs cap image payloads; larger logos fall back to text-only.
const MAX_IMAGE_BASE64_BYTES: usize = 2 * 1024 * 1024;

/// Webhook sink with per-group bot rotation.
///
/// Each output group owns a cursor into its URL list. The cursor advances
/// only after a successful text delivery, so a failing bot is retried by the
/// next report rather than silently skipped over.
pub struct WebhookSink {
    config: WebhookConfig,
    /// Retrying client for webhook posts.
    client: Arc<ClientWithMiddleware>,
    /// Plain client for logo downloads; a slow CDN should not eat webhook
    /// retry budget.
    image_client: reqwest::Client,
    cursors: [Mutex<usize>; 3],
}

impl WebhookSink {
    /// Creates a new sink. Fails when every group's URL list is empty.
    pub fn new(
        config: WebhookConfig,
        client: Arc<ClientWithMiddleware>,
        image_client: reqwest::Client,
    ) -> Result<Self, DeliveryError> {
        if config.group_1.is_empty() && config.group_2.is_empty() && config.group_3.is_empty() {
            return Err(DeliveryError::ConfigError(
                "no webhook URLs configured for any group".to_string(),
            ));
        }
        Ok(Self {
            config,
            client,
            image_client,
            cursors: [Mutex::new(0), Mutex::new(0), Mutex::new(0)],
        })
    }

    /// Downloads the logo and builds the bot image payload, or `None` when
    /// the image is missing, oversized, or fails to download.
    async fn image_payload(&self, image_url: &str) -> Option<serde_json::Value> {
        if image_url.trim().is_empty() {
            return None;
        }
        let response = match self.image_client.get(image_url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!(status = %r.status(), url = %image_url, "Image download rejected.");
                return None;
            }
            Err(e) => {
                debug!(error = %e, url = %image_url, "Image download failed.");
                return None;
            }
        };
        let bytes = response.bytes().await.ok()?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        if encoded.len() > MAX_IMAGE_BASE64_BYTES {
            debug!(
                size = encoded.len(),
                url = %image_url,
                "Image exceeds payload cap, sending text only."
            );
            return None;
        }
        let digest = hex::encode(Md5::digest(&bytes));

        Some(serde_json::json!({
            "msgtype": "image",
            "image": { "base64": encoded, "md5": digest }
        }))
    }

    async fn post(&self, url: &Url, payload: &serde_json::Value) -> Result<(), DeliveryError> {
        let response = self.client.post(url.clone()).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::DeliveryFailed(format!(
                "webhook request failed with status: {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportSink for WebhookSink {
    async fn deliver(&self, report: &Report) -> Result<(), DeliveryError> {
        let index = report.group.index();
        let urls = self.config.urls(index);
        if urls.is_empty() {
            return Err(DeliveryError::ConfigError(format!(
                "no webhook URLs configured for group {}",
                report.group
            )));
        }

        let mut cursor = self.cursors[index.min(2)].lock().await;
        let url = &urls[*cursor % urls.len()];

        if let Some(payload) = self.image_payload(&report.image_url).await {
            if let Err(e) = self.post(url, &payload).await {
                warn!(error = %e, group = %report.group, "Image delivery failed, continuing with text.");
            }
        }

        let text_payload = serde_json::json!({
            "msgtype": "text",
            "text": { "content": report.text }
        });
        self.post(url, &text_payload).await?;

        // Advance the rotation only after the text body landed.
        *cursor = (*cursor + 1) % urls.len();
        Ok(())
    }
}
