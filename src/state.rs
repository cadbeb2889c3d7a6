use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::services::event_window::EventWindow;
use crate::services::notifier::NotificationGateway;

#[derive(Clone)]
pub struct AppState {
    events: Arc<EventWindow>,
    notifier: Arc<NotificationGateway>,
    config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let notifier = Arc::new(NotificationGateway::from_config(&config.notifier));
        Self::with_notifier(config, notifier)
    }

    /// 测试中注入自定义通道时使用
    pub fn with_notifier(config: &Config, notifier: Arc<NotificationGateway>) -> Self {
        Self {
            events: Arc::new(EventWindow::from_config(&config.escalation)),
            notifier,
            config: Arc::new(config.clone()),
            started_at: Instant::now(),
        }
    }

    pub fn events(&self) -> &EventWindow {
        &self.events
    }

    pub fn notifier(&self) -> &Arc<NotificationGateway> {
        &self.notifier
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
