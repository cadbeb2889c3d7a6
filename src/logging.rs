use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    /// File name prefix, one per binary (`drowsy-guard`, `detector`)
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
            file_prefix: "drowsy-guard".to_string(),
        }
    }
}

impl LogConfig {
    pub fn from_config(config: &Config, file_prefix: &str) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
            file_prefix: file_prefix.to_string(),
        }
    }
}

pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);

    let registry = Registry::default().with(env_filter).with(stdout_layer);

    let mut file_error = None;
    let file_appender = if config.enable_file_logs {
        match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .max_log_files(30)
            .build(&config.log_dir)
        {
            Ok(appender) => Some(appender),
            Err(e) => {
                // The detection loop must keep running without file logs
                file_error = Some(e.to_string());
                None
            }
        }
    } else {
        None
    };

    let result = match file_appender {
        Some(appender) => {
            let file_layer = fmt::layer().with_writer(appender).with_ansi(false).json();
            registry.with(file_layer).try_init()
        }
        None => registry.try_init(),
    };

    // A subscriber set earlier (tests, embedding) is fine
    if let Err(e) = result {
        if !e.to_string().contains("already been set") {
            tracing::warn!(error = %e, "Tracing subscriber not installed");
        }
    }

    if let Some(error) = file_error {
        tracing::warn!(
            log_dir = %config.log_dir,
            error = %error,
            "File logging disabled, continuing with stdout only"
        );
    }
}
