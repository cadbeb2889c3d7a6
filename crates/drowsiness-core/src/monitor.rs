//! 逐帧处理流水线
//!
//! 关键点 → 信号提取 → 平滑 → (校准) → 检测器 → 告警动作
//!
//! 本模块不做任何 I/O，只返回 `FrameReport`，
//! 由外层（检测循环或 WASM 绑定）决定如何执行动作。

use serde::Serialize;

use crate::alert::AlertAction;
use crate::calibration::{CalibrationOutcome, CalibrationProfile, Calibrator};
use crate::config::DetectionConfig;
use crate::detectors::{DetectorReading, EyeClosureDetector, HeadTiltDetector, YawnDetector};
use crate::event::EventKind;
use crate::hysteresis::DetectorState;
use crate::landmarks::LandmarkFrame;
use crate::signal::{extract, SignalSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorPhase {
    Calibrating,
    Monitoring,
}

#[derive(Debug, Clone)]
enum Phase {
    Calibrating(Calibrator),
    Monitoring,
}

/// 单帧处理结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub sample: SignalSample,
    /// 处理本帧时所处的阶段
    pub phase: MonitorPhase,
    /// 本帧完成校准时给出结果
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationOutcome>,
    /// 校准失败时是否沿用了旧的校准结果
    pub kept_previous_profile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye: Option<DetectorReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yawn: Option<DetectorReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt: Option<DetectorReading>,
    pub actions: Vec<AlertAction>,
}

impl FrameReport {
    fn new(sample: SignalSample, phase: MonitorPhase) -> Self {
        Self {
            sample,
            phase,
            calibration: None,
            kept_previous_profile: false,
            eye: None,
            yawn: None,
            tilt: None,
            actions: Vec::new(),
        }
    }

    /// 本帧触发的事件类型
    pub fn raised(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.actions.iter().filter_map(|action| match action {
            AlertAction::Raise(kind) => Some(*kind),
            AlertAction::Silence => None,
        })
    }
}

/// 疲劳检测器
///
/// 创建后先进入校准阶段；校准完成前不评估检测器。
/// 校准结果在完成的那一帧整体替换，中间状态对检测器不可见。
#[derive(Debug, Clone)]
pub struct DrowsinessMonitor {
    config: DetectionConfig,
    profile: Option<CalibrationProfile>,
    phase: Phase,
    eye: EyeClosureDetector,
    yawn: YawnDetector,
    tilt: HeadTiltDetector,
}

impl DrowsinessMonitor {
    /// `calibration_frames` 为 0 时不校准，直接以默认阈值进入检测阶段
    pub fn new(config: DetectionConfig) -> Self {
        let (profile, phase) = if config.calibration_frames == 0 {
            (Some(CalibrationProfile::default()), Phase::Monitoring)
        } else {
            (
                None,
                Phase::Calibrating(Calibrator::new(
                    config.calibration_frames,
                    config.ear_threshold_factor,
                )),
            )
        };
        Self {
            eye: EyeClosureDetector::from_config(&config),
            yawn: YawnDetector::from_config(&config),
            tilt: HeadTiltDetector::from_config(&config),
            profile,
            phase,
            config,
        }
    }

    /// 跳过启动校准，直接使用给定的校准结果
    pub fn with_profile(config: DetectionConfig, profile: CalibrationProfile) -> Self {
        let mut monitor = Self::new(config);
        monitor.profile = Some(profile);
        monitor.phase = Phase::Monitoring;
        monitor
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// 当前生效的校准结果；首次校准完成前为 None
    pub fn profile(&self) -> Option<CalibrationProfile> {
        self.profile
    }

    pub fn phase(&self) -> MonitorPhase {
        match self.phase {
            Phase::Calibrating(_) => MonitorPhase::Calibrating,
            Phase::Monitoring => MonitorPhase::Monitoring,
        }
    }

    pub fn detector_states(&self) -> [DetectorState; 3] {
        [self.eye.state(), self.yawn.state(), self.tilt.state()]
    }

    /// 重新开始校准；完成前继续沿用当前校准结果，但暂停检测
    ///
    /// 检测器的平滑窗口与计数一并清空，旧姿态下的读数不带入新阈值。
    pub fn recalibrate(&mut self) {
        self.eye.reset();
        self.yawn.reset();
        self.tilt.reset();
        if self.config.calibration_frames == 0 {
            self.profile.get_or_insert_with(CalibrationProfile::default);
            self.phase = Phase::Monitoring;
            return;
        }
        self.phase = Phase::Calibrating(Calibrator::new(
            self.config.calibration_frames,
            self.config.ear_threshold_factor,
        ));
    }

    /// 整体替换校准结果并进入检测阶段
    pub fn apply_profile(&mut self, profile: CalibrationProfile) {
        self.profile = Some(profile);
        self.phase = Phase::Monitoring;
    }

    /// 处理一帧关键点；`frame` 为 None 表示未检测到人脸
    pub fn process(&mut self, timestamp: f64, frame: Option<&LandmarkFrame>) -> FrameReport {
        self.process_sample(extract(frame, timestamp))
    }

    /// 处理已提取的信号样本，便于直接喂入合成数据
    pub fn process_sample(&mut self, sample: SignalSample) -> FrameReport {
        match &mut self.phase {
            Phase::Calibrating(calibrator) => {
                let mut report = FrameReport::new(sample, MonitorPhase::Calibrating);
                if calibrator.observe(&sample) {
                    let outcome = calibrator.finish();
                    report.kept_previous_profile = self.finish_calibration(outcome);
                    report.calibration = Some(outcome);
                }
                report
            }
            Phase::Monitoring => self.detect(sample),
        }
    }

    /// 返回是否沿用了旧结果
    fn finish_calibration(&mut self, outcome: CalibrationOutcome) -> bool {
        let keep_previous = outcome.is_degraded() && self.profile.is_some();
        if !keep_previous {
            self.profile = Some(outcome.profile());
        }
        self.phase = Phase::Monitoring;
        keep_previous
    }

    fn detect(&mut self, sample: SignalSample) -> FrameReport {
        let mut report = FrameReport::new(sample, MonitorPhase::Monitoring);
        let profile = self.profile.unwrap_or_default();

        if let Some(ear) = sample.ear.value() {
            let reading = self.eye.update(ear, &profile);
            if !reading.condition {
                report.actions.push(AlertAction::Silence);
            } else if reading.state == DetectorState::Triggered {
                report.actions.push(AlertAction::Raise(EventKind::Drowsiness));
            }
            report.eye = Some(reading);
        }

        if let Some(mar) = sample.mar.value() {
            let reading = self.yawn.update(mar);
            if reading.state == DetectorState::Triggered {
                report.actions.push(AlertAction::Raise(EventKind::Yawn));
            }
            report.yawn = Some(reading);
        }

        if let Some(tilt) = sample.tilt_ratio.value() {
            let reading = self.tilt.update(tilt, sample.timestamp, &profile);
            if reading.state == DetectorState::Triggered {
                report.actions.push(AlertAction::Raise(EventKind::HeadTilt));
            }
            report.tilt = Some(reading);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Measurement;

    fn sample(ear: f64, mar: f64, tilt: f64, timestamp: f64) -> SignalSample {
        SignalSample {
            ear: Measurement::Value(ear),
            mar: Measurement::Value(mar),
            tilt_ratio: Measurement::Value(tilt),
            timestamp,
        }
    }

    fn calibrated() -> DrowsinessMonitor {
        DrowsinessMonitor::with_profile(
            DetectionConfig::default(),
            CalibrationProfile {
                ear_threshold: 0.216,
                tilt_baseline: 0.35,
            },
        )
    }

    #[test]
    fn calibration_completes_after_configured_frames() {
        let config = DetectionConfig {
            calibration_frames: 3,
            ..DetectionConfig::default()
        };
        let mut monitor = DrowsinessMonitor::new(config);

        for i in 0..2 {
            let report = monitor.process_sample(sample(0.30, 0.1, 0.35, f64::from(i)));
            assert_eq!(report.phase, MonitorPhase::Calibrating);
            assert!(report.calibration.is_none());
            assert!(report.actions.is_empty());
        }
        assert_eq!(monitor.profile(), None);

        let report = monitor.process_sample(sample(0.30, 0.1, 0.35, 2.0));
        assert!(matches!(
            report.calibration,
            Some(CalibrationOutcome::Calibrated { valid_frames: 3, .. })
        ));
        assert_eq!(monitor.phase(), MonitorPhase::Monitoring);
        let profile = monitor.profile().unwrap();
        assert!((profile.ear_threshold - 0.216).abs() < 1e-12);
    }

    #[test]
    fn startup_without_faces_installs_defaults() {
        let config = DetectionConfig {
            calibration_frames: 2,
            ..DetectionConfig::default()
        };
        let mut monitor = DrowsinessMonitor::new(config);
        monitor.process(0.0, None);
        let report = monitor.process(1.0, None);

        assert!(report.calibration.unwrap().is_degraded());
        assert!(!report.kept_previous_profile);
        assert_eq!(monitor.profile(), Some(CalibrationProfile::default()));
    }

    #[test]
    fn failed_recalibration_keeps_profile() {
        let config = DetectionConfig {
            calibration_frames: 2,
            ..DetectionConfig::default()
        };
        let original = CalibrationProfile {
            ear_threshold: 0.2,
            tilt_baseline: 0.3,
        };
        let mut monitor = DrowsinessMonitor::with_profile(config, original);
        monitor.recalibrate();
        assert_eq!(monitor.phase(), MonitorPhase::Calibrating);

        monitor.process(0.0, None);
        let report = monitor.process(1.0, None);
        assert!(report.kept_previous_profile);
        assert_eq!(monitor.profile(), Some(original));
    }

    #[test]
    fn eye_closure_raises_on_eighth_frame() {
        let mut monitor = calibrated();
        for i in 0..7 {
            let report = monitor.process_sample(sample(0.10, 0.1, 0.35, f64::from(i)));
            assert_eq!(report.raised().count(), 0, "frame {i}");
        }
        let report = monitor.process_sample(sample(0.10, 0.1, 0.35, 7.0));
        assert_eq!(
            report.actions,
            vec![AlertAction::Raise(EventKind::Drowsiness)]
        );
    }

    #[test]
    fn open_eyes_silence_every_frame() {
        let mut monitor = calibrated();
        let report = monitor.process_sample(sample(0.30, 0.1, 0.35, 0.0));
        assert_eq!(report.actions, vec![AlertAction::Silence]);
    }

    #[test]
    fn simultaneous_triggers_report_each_kind() {
        let mut monitor = calibrated();
        let mut last = None;
        for i in 0..10 {
            last = Some(monitor.process_sample(sample(0.10, 0.95, 0.35, f64::from(i))));
        }
        let kinds: Vec<_> = last.unwrap().raised().collect();
        assert_eq!(kinds, vec![EventKind::Drowsiness, EventKind::Yawn]);
    }

    #[test]
    fn missing_face_holds_counters() {
        let mut monitor = calibrated();
        for i in 0..7 {
            monitor.process_sample(sample(0.10, 0.1, 0.35, f64::from(i)));
        }
        let skipped = monitor.process(7.0, None);
        assert!(skipped.actions.is_empty());
        assert!(skipped.eye.is_none());

        let report = monitor.process_sample(sample(0.10, 0.1, 0.35, 8.0));
        assert_eq!(
            report.actions,
            vec![AlertAction::Raise(EventKind::Drowsiness)]
        );
    }

    #[test]
    fn unavailable_ear_is_not_treated_as_closed() {
        let mut monitor = calibrated();
        for i in 0..20 {
            let report = monitor.process_sample(SignalSample {
                ear: Measurement::Unavailable,
                ..sample(0.0, 0.1, 0.35, f64::from(i))
            });
            assert_eq!(report.raised().count(), 0);
        }
        assert_eq!(monitor.detector_states()[0], DetectorState::Idle);
    }

    #[test]
    fn zero_calibration_frames_start_monitoring() {
        let config = DetectionConfig {
            calibration_frames: 0,
            ear_consec_frames: 1,
            ear_window: 1,
            ..DetectionConfig::default()
        };
        let mut monitor = DrowsinessMonitor::new(config);
        assert_eq!(monitor.phase(), MonitorPhase::Monitoring);
        assert_eq!(monitor.profile(), Some(CalibrationProfile::default()));

        let report = monitor.process_sample(sample(0.0, 0.1, 0.35, 0.0));
        assert_eq!(report.phase, MonitorPhase::Monitoring);
        assert!(report.calibration.is_none());
        assert_eq!(
            report.actions,
            vec![AlertAction::Raise(EventKind::Drowsiness)]
        );

        monitor.recalibrate();
        assert_eq!(monitor.phase(), MonitorPhase::Monitoring);
        assert_eq!(monitor.profile(), Some(CalibrationProfile::default()));
    }

    #[test]
    fn nan_calibration_frame_leaves_profile_finite() {
        let config = DetectionConfig {
            calibration_frames: 2,
            ..DetectionConfig::default()
        };
        let mut monitor = DrowsinessMonitor::new(config);
        monitor.process_sample(sample(f64::NAN, 0.1, 0.35, 0.0));
        monitor.process_sample(sample(0.30, 0.1, 0.35, 1.0));

        let profile = monitor.profile().unwrap();
        assert!((profile.ear_threshold - 0.216).abs() < 1e-12);

        let raised = (0..50)
            .map(|i| monitor.process_sample(sample(0.0, 0.1, 0.35, 2.0 + f64::from(i))))
            .filter(|report| report.raised().next().is_some())
            .count();
        assert!(raised > 0);
    }

    #[test]
    fn recalibration_clears_detector_progress() {
        let config = DetectionConfig {
            calibration_frames: 1,
            ..DetectionConfig::default()
        };
        let mut monitor = DrowsinessMonitor::with_profile(
            config,
            CalibrationProfile {
                ear_threshold: 0.216,
                tilt_baseline: 0.35,
            },
        );
        for i in 0..7 {
            monitor.process_sample(sample(0.10, 0.1, 0.35, f64::from(i)));
        }
        assert_eq!(monitor.detector_states()[0], DetectorState::Accumulating);

        monitor.recalibrate();
        assert_eq!(monitor.detector_states()[0], DetectorState::Idle);
    }
}
