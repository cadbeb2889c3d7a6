use futures::future::BoxFuture;
use serde::Serialize;

use crate::config::EmailRelayConfig;
use crate::services::{truncate_body, ChannelError};

/// Outbound email transport.
pub trait EmailChannel: Send + Sync {
    fn send<'a>(
        &'a self,
        subject: &'a str,
        body: &'a str,
        recipients: &'a [String],
    ) -> BoxFuture<'a, Result<(), ChannelError>>;
}

/// Email through an HTTP mail relay that accepts one JSON message per request.
#[derive(Clone)]
pub struct HttpEmailRelay {
    client: reqwest::Client,
    relay_url: String,
    relay_token: Option<String>,
    from: String,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

impl HttpEmailRelay {
    /// Returns `None` unless the relay URL and sender are set. The token is optional.
    pub fn from_config(config: &EmailRelayConfig, client: reqwest::Client) -> Option<Self> {
        if config.relay_url.is_empty() || config.from.is_empty() {
            return None;
        }
        Some(Self {
            client,
            relay_url: config.relay_url.clone(),
            relay_token: Some(config.relay_token.clone()).filter(|t| !t.is_empty()),
            from: config.from.clone(),
        })
    }
}

impl EmailChannel for HttpEmailRelay {
    fn send<'a>(
        &'a self,
        subject: &'a str,
        body: &'a str,
        recipients: &'a [String],
    ) -> BoxFuture<'a, Result<(), ChannelError>> {
        Box::pin(async move {
            let mut req = self.client.post(&self.relay_url).json(&RelayMessage {
                from: &self.from,
                to: recipients,
                subject,
                text: body,
            });
            if let Some(token) = &self.relay_token {
                req = req.bearer_auth(token);
            }

            let resp = req.send().await?;
            let status = resp.status();
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(ChannelError::Api {
                    status: status.as_u16(),
                    message: truncate_body(&message),
                });
            }
            tracing::info!(recipients = recipients.len(), "Email accepted by relay");
            Ok(())
        })
    }
}
