//! 三个持续性条件检测器
//!
//! 共享同一个状态机（见 `hysteresis`），各自维护平滑窗口：
//! - 闭眼: smoothedEAR < 校准阈值，连续 8 帧
//! - 哈欠: smoothedMAR > 0.70，连续 10 帧
//! - 低头: 相对基线增量 > 0.08 且 下移速度 > 0.012/s，连续 10 帧
//!
//! 检测器只接收有效读数；不可用帧由调用方跳过，计数保持不变。

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationProfile;
use crate::config::DetectionConfig;
use crate::hysteresis::{DetectorState, HysteresisCounter};
use crate::smoothing::SmoothingWindow;

/// 速度计算允许的最小时间间隔（秒）
const MIN_VELOCITY_DT: f64 = 1e-6;

/// 单个检测器在一帧上的评估结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorReading {
    pub smoothed: f64,
    /// 仅低头检测器提供
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
    pub condition: bool,
    pub count: u32,
    pub state: DetectorState,
}

#[derive(Debug, Clone)]
pub struct EyeClosureDetector {
    window: SmoothingWindow,
    counter: HysteresisCounter,
}

impl EyeClosureDetector {
    pub fn new(window: usize, consec_frames: u32) -> Self {
        Self {
            window: SmoothingWindow::new(window),
            counter: HysteresisCounter::new(consec_frames),
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.ear_window, config.ear_consec_frames)
    }

    pub fn update(&mut self, ear: f64, profile: &CalibrationProfile) -> DetectorReading {
        self.window.push(ear);
        let smoothed = self.window.average().unwrap_or(ear);
        let condition = smoothed < profile.ear_threshold;
        let state = self.counter.update(condition);
        DetectorReading {
            smoothed,
            velocity: None,
            condition,
            count: self.counter.count(),
            state,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.counter.state()
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.counter.reset();
    }
}

#[derive(Debug, Clone)]
pub struct YawnDetector {
    window: SmoothingWindow,
    counter: HysteresisCounter,
    mar_threshold: f64,
}

impl YawnDetector {
    pub fn new(window: usize, mar_threshold: f64, consec_frames: u32) -> Self {
        Self {
            window: SmoothingWindow::new(window),
            counter: HysteresisCounter::new(consec_frames),
            mar_threshold,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            config.mar_window,
            config.mar_threshold,
            config.mar_consec_frames,
        )
    }

    pub fn update(&mut self, mar: f64) -> DetectorReading {
        self.window.push(mar);
        let smoothed = self.window.average().unwrap_or(mar);
        let condition = smoothed > self.mar_threshold;
        let state = self.counter.update(condition);
        DetectorReading {
            smoothed,
            velocity: None,
            condition,
            count: self.counter.count(),
            state,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.counter.state()
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.counter.reset();
    }
}

/// 低头检测器
///
/// 复合条件：平滑后的比值高于基线 `delta_ratio`，
/// 且两次平滑值之间的变化速度超过 `velocity_threshold`。
/// 只有一个样本时速度为 0，条件必然为假。
#[derive(Debug, Clone)]
pub struct HeadTiltDetector {
    window: SmoothingWindow,
    counter: HysteresisCounter,
    delta_ratio: f64,
    velocity_threshold: f64,
    /// 上一帧的 (平滑值, 时间戳)
    previous: Option<(f64, f64)>,
}

impl HeadTiltDetector {
    pub fn new(
        window: usize,
        delta_ratio: f64,
        velocity_threshold: f64,
        consec_frames: u32,
    ) -> Self {
        Self {
            window: SmoothingWindow::new(window),
            counter: HysteresisCounter::new(consec_frames),
            delta_ratio,
            velocity_threshold,
            previous: None,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            config.tilt_window,
            config.tilt_delta_ratio,
            config.tilt_velocity_threshold,
            config.tilt_consec_frames,
        )
    }

    pub fn update(
        &mut self,
        tilt: f64,
        timestamp: f64,
        profile: &CalibrationProfile,
    ) -> DetectorReading {
        self.window.push(tilt);
        let smoothed = self.window.average().unwrap_or(tilt);

        let velocity = match self.previous {
            Some((prev, prev_ts)) if timestamp - prev_ts > MIN_VELOCITY_DT => {
                (smoothed - prev) / (timestamp - prev_ts)
            }
            _ => 0.0,
        };
        self.previous = Some((smoothed, timestamp));

        let delta = smoothed - profile.tilt_baseline;
        let condition = delta > self.delta_ratio && velocity > self.velocity_threshold;
        let state = self.counter.update(condition);
        DetectorReading {
            smoothed,
            velocity: Some(velocity),
            condition,
            count: self.counter.count(),
            state,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.counter.state()
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.counter.reset();
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CalibrationProfile {
        CalibrationProfile {
            ear_threshold: 0.216,
            tilt_baseline: 0.35,
        }
    }

    #[test]
    fn eye_closure_needs_eight_frames() {
        let mut det = EyeClosureDetector::new(6, 8);
        for _ in 0..7 {
            let reading = det.update(0.10, &profile());
            assert!(reading.condition);
            assert_ne!(reading.state, DetectorState::Triggered);
        }
        assert_eq!(det.update(0.10, &profile()).state, DetectorState::Triggered);
    }

    #[test]
    fn eye_closure_resets_once_smoothed_value_recovers() {
        let mut det = EyeClosureDetector::new(1, 8);
        for _ in 0..8 {
            det.update(0.10, &profile());
        }
        assert_eq!(det.state(), DetectorState::Triggered);

        let reading = det.update(0.30, &profile());
        assert_eq!(reading.state, DetectorState::Idle);
        assert_eq!(reading.count, 0);
    }

    #[test]
    fn smoothing_delays_eye_closure() {
        // 窗口内仍有睁眼值，平均值高于阈值
        let mut det = EyeClosureDetector::new(6, 1);
        for _ in 0..6 {
            det.update(0.30, &profile());
        }
        assert!(!det.update(0.10, &profile()).condition);
    }

    #[test]
    fn yawn_needs_ten_frames_above_threshold() {
        let mut det = YawnDetector::new(6, 0.70, 10);
        for _ in 0..9 {
            assert_ne!(det.update(0.9).state, DetectorState::Triggered);
        }
        assert_eq!(det.update(0.9).state, DetectorState::Triggered);
        // 平均值 (5*0.9 + 0.2)/6 仍高于阈值
        assert_eq!(det.update(0.2).state, DetectorState::Triggered);
        assert_eq!(det.update(0.2).state, DetectorState::Idle);
    }

    #[test]
    fn yawn_threshold_is_strict() {
        let mut det = YawnDetector::new(1, 0.70, 1);
        assert!(!det.update(0.70).condition);
    }

    #[test]
    fn slow_tilt_never_triggers() {
        // 增量 0.10 超过 0.08，但速度仅 0.005/s
        let mut det = HeadTiltDetector::new(6, 0.08, 0.012, 10);
        for i in 0..200 {
            let t = f64::from(i);
            let reading = det.update(0.45 + 0.005 * t, t, &profile());
            assert!(!reading.condition, "frame {i}: {reading:?}");
            assert_eq!(reading.count, 0);
        }
        assert_eq!(det.state(), DetectorState::Idle);
    }

    #[test]
    fn fast_tilt_triggers_after_ten_frames() {
        let mut det = HeadTiltDetector::new(1, 0.08, 0.012, 10);
        let mut last = DetectorState::Idle;
        for i in 0..11 {
            let t = f64::from(i) * 0.1;
            // 每 0.1s 上升 0.01 -> 0.1/s
            last = det.update(0.45 + 0.01 * f64::from(i), t, &profile()).state;
        }
        // 第一帧没有速度，之后 10 帧满足条件
        assert_eq!(last, DetectorState::Triggered);
    }

    #[test]
    fn first_tilt_sample_has_zero_velocity() {
        let mut det = HeadTiltDetector::new(6, 0.08, 0.012, 1);
        let reading = det.update(0.9, 0.0, &profile());
        assert_eq!(reading.velocity, Some(0.0));
        assert!(!reading.condition);
    }

    #[test]
    fn identical_timestamps_give_zero_velocity() {
        let mut det = HeadTiltDetector::new(1, 0.08, 0.012, 1);
        det.update(0.4, 1.0, &profile());
        let reading = det.update(0.9, 1.0, &profile());
        assert_eq!(reading.velocity, Some(0.0));
    }

    #[test]
    fn reset_forgets_window_counter_and_velocity() {
        let mut det = HeadTiltDetector::new(6, 0.08, 0.012, 10);
        for i in 0..5 {
            det.update(0.45 + 0.05 * f64::from(i), f64::from(i) * 0.1, &profile());
        }
        assert_eq!(det.state(), DetectorState::Accumulating);

        det.reset();
        assert_eq!(det.state(), DetectorState::Idle);
        let reading = det.update(0.9, 10.0, &profile());
        assert_eq!(reading.velocity, Some(0.0));
        assert!((reading.smoothed - 0.9).abs() < 1e-12);
    }
}
