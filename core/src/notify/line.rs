use crate::config::ChannelKind;
use crate::errors::CostNotifyError;
use crate::model::Message;
use crate::notify::Notifier;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct LineNotifier {
    client: reqwest::Client,
    token: String,
    endpoint: String,
}

impl LineNotifier {
    pub fn new(token: String, endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build LINE Notify HTTP client")?;
        Ok(Self {
            client,
            token,
            endpoint,
        })
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Line
    }

    async fn publish(&self, message: &Message) -> Result<()> {
        tracing::info!("LINE notification: {}", message.subject);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("authorization", format!("Bearer {}", self.token))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(form_body(&message.body))
            .send()
            .await
            .map_err(|err| CostNotifyError::Transport {
                service: "LINE Notify",
                message: err.to_string(),
            })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|err| CostNotifyError::Transport {
            service: "LINE Notify",
            message: format!("read response body: {}", err),
        })?;
        if !status.is_success() {
            return Err(CostNotifyError::WebhookStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        tracing::info!("LINE Notify response: {}", body);
        Ok(())
    }
}

/// `application/x-www-form-urlencoded` payload carrying the message text.
fn form_body(text: &str) -> String {
    format!("message={}", urlencoding::encode(text))
}
