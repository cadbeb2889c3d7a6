use std::sync::Arc;

use axum::Router;

use drowsiness_core::DetectionConfig;
use drowsy_guard::config::{Config, EscalationConfig, NotifierConfig, ReporterConfig};
use drowsy_guard::routes::build_router;
use drowsy_guard::services::notifier::NotificationGateway;
use drowsy_guard::state::AppState;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
}

/// 直接构造 Config，避免 set_var 在并发测试中的竞态
pub fn test_config(window_secs: u64, threshold: usize) -> Config {
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 0,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "*".to_string(),
        escalation: EscalationConfig {
            window_secs,
            threshold,
        },
        notifier: NotifierConfig {
            cooldown_secs: 60,
            ..NotifierConfig::default()
        },
        reporter: ReporterConfig::default(),
        detection: DetectionConfig::default(),
    }
}

pub fn spawn_with_gateway(config: Config, gateway: Arc<NotificationGateway>) -> TestApp {
    let state = AppState::with_notifier(&config, gateway);
    let app = build_router(state.clone());
    TestApp { app, state, config }
}

pub fn spawn_with_threshold(window_secs: u64, threshold: usize) -> TestApp {
    let config = test_config(window_secs, threshold);
    let state = AppState::new(&config);
    let app = build_router(state.clone());
    TestApp { app, state, config }
}

pub fn spawn_test_app() -> TestApp {
    spawn_with_threshold(60, 3)
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}
