//! 自适应校准模块
//!
//! 启动时在参考姿态（睁眼、头部平视）下采集固定帧数，
//! 计算个人化的 EAR 阈值与俯仰基线。
//! 只统计检测到人脸且 EAR / tilt 均有效的帧。
//! 有效帧为 0 时回退到固定默认值，并标记为降级（不致命）。

use serde::{Deserialize, Serialize};

use crate::signal::SignalSample;

/// 无有效校准帧时的 EAR 阈值
pub const FALLBACK_EAR_THRESHOLD: f64 = 0.25;
/// 无有效校准帧时的俯仰基线
pub const FALLBACK_TILT_BASELINE: f64 = 0.35;

/// 校准结果，只能整体替换
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationProfile {
    pub ear_threshold: f64,
    pub tilt_baseline: f64,
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self {
            ear_threshold: FALLBACK_EAR_THRESHOLD,
            tilt_baseline: FALLBACK_TILT_BASELINE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CalibrationOutcome {
    Calibrated {
        profile: CalibrationProfile,
        valid_frames: u32,
    },
    /// 没有任何有效帧，`profile` 为默认值
    Degraded { profile: CalibrationProfile },
}

impl CalibrationOutcome {
    pub fn profile(&self) -> CalibrationProfile {
        match self {
            CalibrationOutcome::Calibrated { profile, .. } => *profile,
            CalibrationOutcome::Degraded { profile } => *profile,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, CalibrationOutcome::Degraded { .. })
    }
}

/// 校准采集器
#[derive(Debug, Clone)]
pub struct Calibrator {
    target_frames: u32,
    threshold_factor: f64,
    observed_frames: u32,
    valid_frames: u32,
    ear_sum: f64,
    tilt_sum: f64,
}

impl Calibrator {
    pub fn new(target_frames: u32, threshold_factor: f64) -> Self {
        Self {
            target_frames,
            threshold_factor,
            observed_frames: 0,
            valid_frames: 0,
            ear_sum: 0.0,
            tilt_sum: 0.0,
        }
    }

    /// 记录一帧，返回采集是否已完成
    ///
    /// 无人脸帧同样计入总帧数，但不参与均值
    pub fn observe(&mut self, sample: &SignalSample) -> bool {
        if self.is_complete() {
            return true;
        }
        self.observed_frames += 1;

        if let (Some(ear), Some(tilt)) = (sample.ear.value(), sample.tilt_ratio.value()) {
            self.ear_sum += ear;
            self.tilt_sum += tilt;
            self.valid_frames += 1;
        }

        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.observed_frames >= self.target_frames
    }

    pub fn observed_frames(&self) -> u32 {
        self.observed_frames
    }

    /// 根据已采集的帧计算结果
    pub fn finish(&self) -> CalibrationOutcome {
        if self.valid_frames == 0 {
            return CalibrationOutcome::Degraded {
                profile: CalibrationProfile::default(),
            };
        }

        let n = f64::from(self.valid_frames);
        let open_eye_ear = self.ear_sum / n;
        CalibrationOutcome::Calibrated {
            profile: CalibrationProfile {
                ear_threshold: open_eye_ear * self.threshold_factor,
                tilt_baseline: self.tilt_sum / n,
            },
            valid_frames: self.valid_frames,
        }
    }
}
