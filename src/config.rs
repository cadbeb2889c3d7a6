use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use std::fmt;

use drowsiness_core::DetectionConfig;

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub escalation: EscalationConfig,
    pub notifier: NotifierConfig,
    pub reporter: ReporterConfig,
    pub detection: DetectionConfig,
}

#[derive(Debug, Clone)]
pub struct EscalationConfig {
    pub window_secs: u64,
    pub threshold: usize,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            window_secs: 1800,
            threshold: 2,
        }
    }
}

#[derive(Clone)]
pub struct NotifierConfig {
    pub cooldown_secs: u64,
    pub channel_timeout_secs: u64,
    pub twilio: TwilioConfig,
    pub email: EmailRelayConfig,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
}

#[derive(Clone, Default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_base: String,
}

#[derive(Clone, Default)]
pub struct EmailRelayConfig {
    pub relay_url: String,
    pub relay_token: String,
    pub from: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// POST each event to the escalation server
    Server,
    /// Trigger the notification gateway from the detection process itself
    Direct,
}

impl FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(ReportMode::Server),
            "direct" => Ok(ReportMode::Direct),
            other => Err(format!("unknown report mode: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub mode: ReportMode,
    pub server_url: String,
    pub timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 600,
            channel_timeout_secs: 10,
            twilio: TwilioConfig {
                api_base: DEFAULT_TWILIO_API_BASE.to_string(),
                ..TwilioConfig::default()
            },
            email: EmailRelayConfig::default(),
            phones: Vec::new(),
            emails: Vec::new(),
        }
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            mode: ReportMode::Server,
            server_url: "http://127.0.0.1:5000/update".to_string(),
            timeout_ms: 600,
        }
    }
}

const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("cors_origin", &self.cors_origin)
            .field("escalation", &self.escalation)
            .field("notifier", &self.notifier)
            .field("reporter", &self.reporter)
            .field("detection", &self.detection)
            .finish()
    }
}

impl fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("cooldown_secs", &self.cooldown_secs)
            .field("channel_timeout_secs", &self.channel_timeout_secs)
            .field("twilio_account_sid", &self.twilio.account_sid)
            .field("twilio_auth_token", &"***REDACTED***")
            .field("twilio_from_number", &self.twilio.from_number)
            .field("twilio_api_base", &self.twilio.api_base)
            .field("email_relay_url", &self.email.relay_url)
            .field("email_relay_token", &"***REDACTED***")
            .field("email_from", &self.email.from)
            .field("phones", &self.phones.len())
            .field("emails", &self.emails.len())
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: env_or_parse("PORT", 5000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "*"),
            escalation: EscalationConfig {
                window_secs: env_or_parse("NOTIFY_WINDOW_SEC", 1800_u64),
                threshold: env_or_parse("NOTIFY_THRESHOLD", 2_usize),
            },
            notifier: NotifierConfig {
                cooldown_secs: env_or_parse("NOTIFICATION_COOLDOWN_SEC", 600_u64),
                channel_timeout_secs: env_or_parse("CHANNEL_TIMEOUT_SECS", 10_u64),
                twilio: TwilioConfig {
                    account_sid: env_or("TWILIO_ACCOUNT_SID", ""),
                    auth_token: env_or("TWILIO_AUTH_TOKEN", ""),
                    from_number: env_or("TWILIO_FROM_NUMBER", ""),
                    api_base: env_or("TWILIO_API_BASE", DEFAULT_TWILIO_API_BASE),
                },
                email: EmailRelayConfig {
                    relay_url: env_or("EMAIL_RELAY_URL", ""),
                    relay_token: env_or("EMAIL_RELAY_TOKEN", ""),
                    from: env_or("EMAIL_FROM", ""),
                },
                phones: env_list("NOTIFY_PHONES"),
                emails: env_list("NOTIFY_EMAILS"),
            },
            reporter: ReporterConfig {
                mode: env_or_parse_str("REPORT_MODE", ReportMode::Server),
                server_url: env_or("SERVER_URL", "http://127.0.0.1:5000/update"),
                timeout_ms: env_or_parse("REPORT_TIMEOUT_MS", 600_u64),
            },
            detection: detection_from_env(),
        }
    }
}

fn detection_from_env() -> DetectionConfig {
    let d = DetectionConfig::default();
    DetectionConfig {
        calibration_frames: env_or_parse("CALIBRATION_FRAMES", d.calibration_frames),
        ear_window: env_or_parse("EAR_SMOOTH_WINDOW", d.ear_window),
        ear_threshold_factor: env_or_parse("EAR_THRESH_FACTOR", d.ear_threshold_factor),
        ear_consec_frames: env_or_parse("EAR_CONSEC_FRAMES", d.ear_consec_frames),
        mar_window: env_or_parse("MAR_SMOOTH_WINDOW", d.mar_window),
        mar_threshold: env_or_parse("MAR_THRESH", d.mar_threshold),
        mar_consec_frames: env_or_parse("MAR_CONSEC_FRAMES", d.mar_consec_frames),
        tilt_window: env_or_parse("TILT_SMOOTH_WINDOW", d.tilt_window),
        tilt_delta_ratio: env_or_parse("TILT_DELTA_RATIO", d.tilt_delta_ratio),
        tilt_velocity_threshold: env_or_parse("TILT_VELOCITY", d.tilt_velocity_threshold),
        tilt_consec_frames: env_or_parse("TILT_CONSEC_FRAMES", d.tilt_consec_frames),
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn env_or_parse_str<T>(key: &str, default: T) -> T
where
    T: FromStr<Err = String> + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Invalid env var, using default");
            default
        }),
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Comma-separated list; blank entries are dropped.
pub fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .map(|raw| split_list(&raw))
        .unwrap_or_default()
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
