use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use drowsiness_core::EventKind;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::NotifierConfig;
use crate::services::email::{EmailChannel, HttpEmailRelay};
use crate::services::http_client;
use crate::services::sms::{SmsChannel, SmsDelivery, TwilioSms};

pub const ALERT_SUBJECT: &str = "Driver Drowsiness Alert";

/// Per-channel result of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ChannelReport {
    NotConfigured {
        reason: String,
    },
    Sent {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        deliveries: Vec<SmsDelivery>,
    },
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        deliveries: Vec<SmsDelivery>,
    },
}

impl ChannelReport {
    fn not_configured(reason: &str) -> Self {
        ChannelReport::NotConfigured {
            reason: reason.to_string(),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, ChannelReport::Sent { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum NotificationOutcome {
    #[serde(rename_all = "camelCase")]
    RateLimited { retry_after_secs: i64 },
    Dispatched {
        message: String,
        sms: ChannelReport,
        email: ChannelReport,
    },
}

impl NotificationOutcome {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, NotificationOutcome::RateLimited { .. })
    }
}

/// Time of the last dispatch. A `None` means nothing has been sent yet.
#[derive(Debug, Default)]
pub struct CooldownState {
    last_sent: Option<DateTime<Utc>>,
}

impl CooldownState {
    /// Claims the dispatch slot at `now`, or returns the remaining wait.
    ///
    /// A clock that moved backwards counts as still cooling down.
    pub fn try_acquire(&mut self, now: DateTime<Utc>, cooldown: Duration) -> Result<(), Duration> {
        if let Some(last) = self.last_sent {
            let elapsed = now - last;
            if elapsed < cooldown {
                return Err(cooldown - elapsed);
            }
        }
        self.last_sent = Some(now);
        Ok(())
    }

    pub fn last_sent(&self) -> Option<DateTime<Utc>> {
        self.last_sent
    }
}

pub fn alert_message(kind: EventKind, count: Option<usize>) -> String {
    match count {
        Some(count) => format!(
            "ALERT: Driver had {count} drowsiness events in the configured time window. \
             Please check immediately."
        ),
        None => format!(
            "ALERT: Driver {} detected. Please check immediately.",
            kind.describe()
        ),
    }
}

/// Whole seconds, rounded up so a blocked caller never sees 0
fn ceil_secs(remaining: Duration) -> i64 {
    let secs = remaining.num_seconds();
    if remaining > Duration::seconds(secs) {
        secs + 1
    } else {
        secs
    }
}

/// Rate-limited fan-out of alerts to SMS and email.
///
/// The cooldown slot is claimed before any channel runs, so concurrent callers
/// see exactly one dispatch per cooldown period.
pub struct NotificationGateway {
    cooldown: Mutex<CooldownState>,
    cooldown_period: Duration,
    sms: Option<Arc<dyn SmsChannel>>,
    email: Option<Arc<dyn EmailChannel>>,
    phones: Vec<String>,
    emails: Vec<String>,
}

impl NotificationGateway {
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            cooldown: Mutex::new(CooldownState::default()),
            cooldown_period: Duration::seconds(cooldown_secs.min(u64::from(u32::MAX)) as i64),
            sms: None,
            email: None,
            phones: Vec::new(),
            emails: Vec::new(),
        }
    }

    pub fn with_sms(mut self, channel: Arc<dyn SmsChannel>, phones: Vec<String>) -> Self {
        self.sms = Some(channel);
        self.phones = phones;
        self
    }

    pub fn with_email(mut self, channel: Arc<dyn EmailChannel>, emails: Vec<String>) -> Self {
        self.email = Some(channel);
        self.emails = emails;
        self
    }

    pub fn from_config(config: &NotifierConfig) -> Self {
        let client = http_client(config.channel_timeout_secs);
        let mut gateway = Self::new(config.cooldown_secs);

        match TwilioSms::from_config(&config.twilio, client.clone()) {
            Some(sms) => gateway = gateway.with_sms(Arc::new(sms), config.phones.clone()),
            None => tracing::warn!("Twilio credentials not set, SMS alerts disabled"),
        }
        match HttpEmailRelay::from_config(&config.email, client) {
            Some(relay) => gateway = gateway.with_email(Arc::new(relay), config.emails.clone()),
            None => tracing::warn!("Email relay not set, email alerts disabled"),
        }
        gateway
    }

    pub fn cooldown_secs(&self) -> i64 {
        self.cooldown_period.num_seconds()
    }

    pub fn sms_enabled(&self) -> bool {
        self.sms.is_some() && !self.phones.is_empty()
    }

    pub fn email_enabled(&self) -> bool {
        self.email.is_some() && !self.emails.is_empty()
    }

    pub async fn notify(&self, kind: EventKind, count: Option<usize>) -> NotificationOutcome {
        self.notify_at(Utc::now(), kind, count).await
    }

    pub async fn notify_at(
        &self,
        now: DateTime<Utc>,
        kind: EventKind,
        count: Option<usize>,
    ) -> NotificationOutcome {
        let acquired = self
            .cooldown
            .lock()
            .await
            .try_acquire(now, self.cooldown_period);
        if let Err(remaining) = acquired {
            let retry_after_secs = ceil_secs(remaining);
            tracing::info!(%kind, retry_after_secs, "Notification suppressed by cooldown");
            return NotificationOutcome::RateLimited { retry_after_secs };
        }

        let message = alert_message(kind, count);
        tracing::warn!(%kind, ?count, message = %message, "Dispatching driver alert");

        let sms = self.dispatch_sms(&message).await;
        let email = self.dispatch_email(&message).await;

        NotificationOutcome::Dispatched {
            message,
            sms,
            email,
        }
    }

    async fn dispatch_sms(&self, message: &str) -> ChannelReport {
        let Some(channel) = &self.sms else {
            return ChannelReport::not_configured("sms credentials missing");
        };
        if self.phones.is_empty() {
            return ChannelReport::not_configured("no phone recipients");
        }

        let deliveries = channel.send(message, &self.phones).await;
        if deliveries.iter().any(SmsDelivery::is_sent) {
            ChannelReport::Sent { deliveries }
        } else {
            ChannelReport::Failed {
                error: "no recipient accepted the message".to_string(),
                deliveries,
            }
        }
    }

    async fn dispatch_email(&self, message: &str) -> ChannelReport {
        let Some(channel) = &self.email else {
            return ChannelReport::not_configured("email relay missing");
        };
        if self.emails.is_empty() {
            return ChannelReport::not_configured("no email recipients");
        }

        match channel.send(ALERT_SUBJECT, message, &self.emails).await {
            Ok(()) => ChannelReport::Sent {
                deliveries: Vec::new(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Email delivery failed");
                ChannelReport::Failed {
                    error: e.to_string(),
                    deliveries: Vec::new(),
                }
            }
        }
    }
}
