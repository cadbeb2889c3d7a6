use std::any::Any;
use std::net::SocketAddr;

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use drowsy_guard::config::Config;
use drowsy_guard::logging::{init_tracing, LogConfig};
use drowsy_guard::response::AppError;
use drowsy_guard::routes::build_router;
use drowsy_guard::state::AppState;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig::from_config(&config, "drowsy-guard"));
    tracing::info!(
        window_secs = config.escalation.window_secs,
        threshold = config.escalation.threshold,
        cooldown_secs = config.notifier.cooldown_secs,
        "Starting escalation server"
    );
    tracing::debug!(?config, "Loaded configuration");

    let cors_layer = match build_cors_layer(&config) {
        Ok(layer) => layer,
        Err(e) => {
            tracing::error!(error = %e, "Invalid CORS_ORIGIN");
            std::process::exit(1);
        }
    };

    let state = AppState::new(&config);

    let app = build_router(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind TCP listener");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Shutdown complete");
}

fn build_cors_layer(config: &Config) -> Result<CorsLayer, String> {
    let headers = [header::CONTENT_TYPE, header::ACCEPT];
    if config.cors_origin.trim() == "*" {
        // 检测端可能运行在任意主机上，默认放开
        return Ok(CorsLayer::new()
            .allow_origin(AnyOrigin)
            .allow_headers(headers)
            .allow_methods(AnyOrigin));
    }

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| format!("'{}': {e}", config.cors_origin))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_headers(headers)
        .allow_methods(AnyOrigin))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::internal(detail).into_response()
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
}
