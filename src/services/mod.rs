pub mod email;
pub mod event_window;
pub mod notifier;
pub mod reporter;
pub mod sms;

/// Failure of a single outbound delivery attempt.
///
/// Never propagated past the notification gateway; recorded per recipient or
/// per channel in the outcome instead.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("provider error: status={status}, message={message}")]
    Api { status: u16, message: String },
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ChannelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChannelError::Timeout
        } else if e.is_decode() {
            ChannelError::Decode(e.to_string())
        } else {
            ChannelError::Network(e.to_string())
        }
    }
}

/// Shared HTTP client for outbound channels.
pub fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Collapse a provider error body so it fits on one log line.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    let one_line = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if one_line.chars().count() > MAX {
        let cut: String = one_line.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        one_line
    }
}
