use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::TwilioConfig;
use crate::services::{truncate_body, ChannelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Error,
}

/// Result of sending to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsDelivery {
    pub recipient: String,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SmsDelivery {
    pub fn sent(recipient: &str, provider_id: String) -> Self {
        Self {
            recipient: recipient.to_string(),
            status: DeliveryStatus::Sent,
            provider_id: Some(provider_id),
            error: None,
        }
    }

    pub fn failed(recipient: &str, error: &ChannelError) -> Self {
        Self {
            recipient: recipient.to_string(),
            status: DeliveryStatus::Error,
            provider_id: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// Outbound SMS transport.
///
/// Implementations must attempt every recipient; one bad number never aborts
/// delivery to the rest.
pub trait SmsChannel: Send + Sync {
    fn send<'a>(&'a self, body: &'a str, recipients: &'a [String])
        -> BoxFuture<'a, Vec<SmsDelivery>>;
}

/// SMS through the Twilio Messages API.
#[derive(Clone)]
pub struct TwilioSms {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

impl TwilioSms {
    /// Returns `None` unless sid, token and sender number are all set.
    pub fn from_config(config: &TwilioConfig, client: reqwest::Client) -> Option<Self> {
        if config.account_sid.is_empty()
            || config.auth_token.is_empty()
            || config.from_number.is_empty()
        {
            return None;
        }
        Some(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }

    async fn send_one(&self, body: &str, to: &str) -> Result<String, ChannelError> {
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Api {
                status: status.as_u16(),
                message: truncate_body(&message),
            });
        }

        let message: MessageResource = resp.json().await?;
        Ok(message.sid)
    }
}

impl SmsChannel for TwilioSms {
    fn send<'a>(
        &'a self,
        body: &'a str,
        recipients: &'a [String],
    ) -> BoxFuture<'a, Vec<SmsDelivery>> {
        Box::pin(async move {
            let mut deliveries = Vec::with_capacity(recipients.len());
            for to in recipients {
                match self.send_one(body, to).await {
                    Ok(sid) => {
                        tracing::info!(recipient = %to, sid = %sid, "SMS sent");
                        deliveries.push(SmsDelivery::sent(to, sid));
                    }
                    Err(e) => {
                        tracing::warn!(recipient = %to, error = %e, "SMS delivery failed");
                        deliveries.push(SmsDelivery::failed(to, &e));
                    }
                }
            }
            deliveries
        })
    }
}
