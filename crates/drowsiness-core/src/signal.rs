//! 三态测量值与逐帧信号提取
//!
//! 几何计算失败时不再返回哨兵 0.0，而是显式区分
//! "有效读数" / "未检测到人脸" / "无法计算"，
//! 下游检测器据此区分"眼睛确实闭合"与"信号不可用"。

use serde::{Deserialize, Serialize};

use crate::ear::eye_aspect_ratio;
use crate::head_pose::nose_eye_ratio;
use crate::landmarks::LandmarkFrame;
use crate::mar::mouth_aspect_ratio;

/// 单个信号的测量结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Measurement {
    Value(f64),
    NoFace,
    /// 关键点缺失或几何退化
    Unavailable,
}

impl Measurement {
    /// 几何比值；NaN 或无穷大视为无法计算
    pub fn ratio(value: f64) -> Self {
        if value.is_finite() {
            Measurement::Value(value)
        } else {
            Measurement::Unavailable
        }
    }

    /// 有效读数；非有限值不算读数
    pub fn value(self) -> Option<f64> {
        match self {
            Measurement::Value(v) if v.is_finite() => Some(v),
            _ => None,
        }
    }

    /// 兼容旧接口的哨兵值：不可用时为 0.0
    pub fn raw(self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    pub fn is_value(self) -> bool {
        self.value().is_some()
    }
}

/// 单帧信号样本
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSample {
    pub ear: Measurement,
    pub mar: Measurement,
    pub tilt_ratio: Measurement,
    /// 秒
    pub timestamp: f64,
}

impl SignalSample {
    pub fn no_face(timestamp: f64) -> Self {
        Self {
            ear: Measurement::NoFace,
            mar: Measurement::NoFace,
            tilt_ratio: Measurement::NoFace,
            timestamp,
        }
    }

    pub fn has_face(&self) -> bool {
        !matches!(self.ear, Measurement::NoFace)
    }

    /// (ear, mar, tilt) 的原始值，不可用项为 0.0
    pub fn raw(&self) -> (f64, f64, f64) {
        (self.ear.raw(), self.mar.raw(), self.tilt_ratio.raw())
    }
}

/// 从一帧关键点提取三个信号；`None` 表示该帧未检测到人脸
pub fn extract(frame: Option<&LandmarkFrame>, timestamp: f64) -> SignalSample {
    match frame {
        None => SignalSample::no_face(timestamp),
        Some(frame) => SignalSample {
            ear: eye_aspect_ratio(frame),
            mar: mouth_aspect_ratio(frame),
            tilt_ratio: nose_eye_ratio(frame),
            timestamp,
        },
    }
}
