use std::fmt;

use serde::{Deserialize, Serialize};

/// 告警事件类型，线上传输使用 snake_case 名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Drowsiness,
    Yawn,
    HeadTilt,
    #[serde(other)]
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Drowsiness => "drowsiness",
            EventKind::Yawn => "yawn",
            EventKind::HeadTilt => "head_tilt",
            EventKind::Unknown => "unknown",
        }
    }

    /// 无法识别的名称归为 `Unknown`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "drowsiness" => EventKind::Drowsiness,
            "yawn" => EventKind::Yawn,
            "head_tilt" => EventKind::HeadTilt,
            _ => EventKind::Unknown,
        }
    }

    /// 用于通知正文的描述
    pub fn describe(&self) -> &'static str {
        match self {
            EventKind::Drowsiness | EventKind::Unknown => "drowsiness",
            EventKind::Yawn => "yawning",
            EventKind::HeadTilt => "head drop",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
