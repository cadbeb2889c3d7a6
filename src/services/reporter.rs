use std::sync::Arc;
use std::time::Duration;

use drowsiness_core::{EventKind, EventSink};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::ReporterConfig;
use crate::services::notifier::NotificationGateway;

/// Posts each raised event to the escalation server.
///
/// `report` never blocks the frame loop: the POST runs on the runtime behind
/// `handle` and any failure is logged and dropped.
pub struct HttpEventReporter {
    client: reqwest::Client,
    url: String,
    handle: Handle,
    in_flight: Vec<JoinHandle<()>>,
}

impl HttpEventReporter {
    pub fn new(config: &ReporterConfig, handle: Handle) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: update_url(&config.server_url),
            handle,
            in_flight: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for reports that are still in flight.
    pub async fn flush(self) {
        flush_all(self.in_flight).await;
    }
}

impl EventSink for HttpEventReporter {
    fn report(&mut self, kind: EventKind) {
        let client = self.client.clone();
        let url = self.url.clone();
        self.in_flight.retain(|task| !task.is_finished());
        self.in_flight.push(self.handle.spawn(async move {
            let body = serde_json::json!({ "drowsy": true, "type": kind.as_str() });
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(%kind, "Event reported");
                }
                Ok(resp) => {
                    tracing::debug!(%kind, status = %resp.status(), "Server rejected event report");
                }
                Err(e) => {
                    tracing::debug!(%kind, error = %e, "Event report failed");
                }
            }
        }));
    }
}

/// Sends an alert per raised event straight through the gateway, bypassing
/// the server-side window.
pub struct DirectNotifier {
    gateway: Arc<NotificationGateway>,
    handle: Handle,
    in_flight: Vec<JoinHandle<()>>,
}

impl DirectNotifier {
    pub fn new(gateway: Arc<NotificationGateway>, handle: Handle) -> Self {
        Self {
            gateway,
            handle,
            in_flight: Vec::new(),
        }
    }

    pub async fn flush(self) {
        flush_all(self.in_flight).await;
    }
}

impl EventSink for DirectNotifier {
    fn report(&mut self, kind: EventKind) {
        let gateway = self.gateway.clone();
        self.in_flight.retain(|task| !task.is_finished());
        self.in_flight.push(self.handle.spawn(async move {
            let outcome = gateway.notify(kind, None).await;
            tracing::debug!(%kind, ?outcome, "Direct notification finished");
        }));
    }
}

fn update_url(server_url: &str) -> String {
    let base = server_url.trim_end_matches('/');
    if base.ends_with("/update") {
        base.to_string()
    } else {
        format!("{base}/update")
    }
}

async fn flush_all(tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Report task aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_url_is_normalized() {
        assert_eq!(update_url("http://127.0.0.1:5000"), "http://127.0.0.1:5000/update");
        assert_eq!(update_url("http://127.0.0.1:5000/"), "http://127.0.0.1:5000/update");
        assert_eq!(
            update_url("http://127.0.0.1:5000/update"),
            "http://127.0.0.1:5000/update"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_swallowed() {
        let config = ReporterConfig {
            server_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 200,
            ..Default::default()
        };
        let mut reporter = HttpEventReporter::new(&config, Handle::current());
        reporter.report(EventKind::Drowsiness);
        reporter.report(EventKind::Yawn);
        reporter.flush().await;
    }

    #[tokio::test]
    async fn direct_notifier_goes_through_cooldown() {
        let gateway = Arc::new(NotificationGateway::new(60));
        let mut notifier = DirectNotifier::new(gateway.clone(), Handle::current());
        notifier.report(EventKind::HeadTilt);
        notifier.flush().await;

        assert!(gateway.notify(EventKind::Yawn, None).await.is_rate_limited());
    }
}
