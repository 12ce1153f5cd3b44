use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::types::HelpRequest;
use crate::events::{check_upstream, transport_error};
use crate::shared::AppError;

/// Where help requests from room displays go
#[async_trait]
pub trait HelpDesk {
    async fn request_help(&self, request: &HelpRequest) -> Result<(), AppError>;
}

/// Posts help requests as JSON to a webhook
pub struct WebhookHelpDesk {
    client: Client,
    url: Url,
}

impl WebhookHelpDesk {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build help desk client: {}", e)))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl HelpDesk for WebhookHelpDesk {
    #[instrument(skip(self))]
    async fn request_help(&self, request: &HelpRequest) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        check_upstream(response).await?;

        info!(room_id = %request.room_id, "Help request forwarded");
        Ok(())
    }
}

/// Help desk for deployments without a webhook: the request only shows up in the logs
pub struct LoggingHelpDesk;

#[async_trait]
impl HelpDesk for LoggingHelpDesk {
    async fn request_help(&self, request: &HelpRequest) -> Result<(), AppError> {
        warn!(
            room_id = %request.room_id,
            message = ?request.message,
            "Help requested but no help desk is configured"
        );
        Ok(())
    }
}
