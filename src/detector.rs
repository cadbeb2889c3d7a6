//! Frame loop that drives `DrowsinessMonitor` from a landmark source.
//!
//! The face-mesh model and the camera live outside this process; they feed
//! landmark frames in as JSON lines and this loop turns them into alarms and
//! event reports.

use std::io::BufRead;
use std::time::Instant;

use drowsiness_core::{
    AlarmDevice, AlertAggregator, CalibrationOutcome, DrowsinessMonitor, EventSink,
    LandmarkFrame, Point,
};
use serde::Deserialize;

/// One frame from the landmark source. `landmarks` is `None` when no face was found.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInput {
    /// Seconds, monotonic within one run
    pub timestamp: f64,
    pub landmarks: Option<LandmarkFrame>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    Frame(FrameInput),
    /// Operator asked for a fresh calibration
    Recalibrate,
}

/// Source of frames and operator commands. `None` ends the loop.
pub trait LandmarkProvider {
    fn next_event(&mut self) -> Option<ProviderEvent>;
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum InputLine {
    Frame {
        #[serde(default)]
        timestamp: Option<f64>,
        width: u32,
        height: u32,
        points: Vec<[f64; 2]>,
    },
    NoFace {
        #[serde(default)]
        timestamp: Option<f64>,
    },
    Recalibrate,
}

/// Reads one JSON object per line:
///
/// ```text
/// {"kind":"frame","timestamp":1.5,"width":640,"height":480,"points":[[0.41,0.38],...]}
/// {"kind":"no_face","timestamp":1.53}
/// {"kind":"recalibrate"}
/// ```
///
/// Points are normalized to `[0, 1]`. A missing timestamp is filled from the
/// time since the provider was created. Malformed lines are logged and skipped.
pub struct JsonLinesProvider<R> {
    reader: R,
    started: Instant,
    buf: String,
    line_no: u64,
}

impl<R: BufRead> JsonLinesProvider<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            started: Instant::now(),
            buf: String::new(),
            line_no: 0,
        }
    }

    fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn convert(&self, line: InputLine) -> ProviderEvent {
        match line {
            InputLine::Frame {
                timestamp,
                width,
                height,
                points,
            } => {
                let points = points.into_iter().map(|[x, y]| Point::new(x, y)).collect();
                ProviderEvent::Frame(FrameInput {
                    timestamp: timestamp.unwrap_or_else(|| self.elapsed()),
                    landmarks: Some(LandmarkFrame::new(points, width, height)),
                })
            }
            InputLine::NoFace { timestamp } => ProviderEvent::Frame(FrameInput {
                timestamp: timestamp.unwrap_or_else(|| self.elapsed()),
                landmarks: None,
            }),
            InputLine::Recalibrate => ProviderEvent::Recalibrate,
        }
    }
}

impl<R: BufRead> LandmarkProvider for JsonLinesProvider<R> {
    fn next_event(&mut self) -> Option<ProviderEvent> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Landmark stream read failed");
                    return None;
                }
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<InputLine>(line) {
                Ok(parsed) => return Some(self.convert(parsed)),
                Err(e) => {
                    tracing::warn!(line = self.line_no, error = %e, "Skipping malformed landmark line");
                }
            }
        }
    }
}

/// Alarm that only logs. Transitions are logged once, repeats are ignored.
#[derive(Debug, Default)]
pub struct LogAlarm {
    sounding: bool,
    activations: u64,
}

impl LogAlarm {
    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    pub fn activations(&self) -> u64 {
        self.activations
    }
}

impl AlarmDevice for LogAlarm {
    fn activate(&mut self) {
        if !self.sounding {
            self.sounding = true;
            self.activations += 1;
            tracing::warn!("Alarm ON");
        }
    }

    fn deactivate(&mut self) {
        if self.sounding {
            self.sounding = false;
            tracing::info!("Alarm OFF");
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub no_face_frames: u64,
    pub events_reported: u64,
    pub calibrations: u32,
    pub degraded_calibrations: u32,
}

pub struct DetectionLoop<P, A, S> {
    provider: P,
    monitor: DrowsinessMonitor,
    alerts: AlertAggregator<A, S>,
}

impl<P, A, S> DetectionLoop<P, A, S>
where
    P: LandmarkProvider,
    A: AlarmDevice,
    S: EventSink,
{
    pub fn new(provider: P, monitor: DrowsinessMonitor, alarm: A, sink: S) -> Self {
        Self {
            provider,
            monitor,
            alerts: AlertAggregator::new(alarm, sink),
        }
    }

    /// Runs until the provider is exhausted.
    pub fn run(&mut self) -> LoopSummary {
        let mut summary = LoopSummary::default();
        tracing::info!(
            frames = self.monitor.config().calibration_frames,
            "Calibrating: keep your head straight and eyes open"
        );

        while let Some(event) = self.provider.next_event() {
            match event {
                ProviderEvent::Recalibrate => {
                    tracing::info!("Recalibration requested");
                    self.monitor.recalibrate();
                }
                ProviderEvent::Frame(input) => self.step(input, &mut summary),
            }
        }

        tracing::info!(
            frames = summary.frames,
            events = summary.events_reported,
            "Landmark stream ended"
        );
        summary
    }

    fn step(&mut self, input: FrameInput, summary: &mut LoopSummary) {
        summary.frames += 1;
        if input.landmarks.is_none() {
            summary.no_face_frames += 1;
        }

        let report = self
            .monitor
            .process(input.timestamp, input.landmarks.as_ref());

        match report.calibration {
            Some(CalibrationOutcome::Calibrated {
                profile,
                valid_frames,
            }) => {
                summary.calibrations += 1;
                tracing::info!(
                    ear_threshold = profile.ear_threshold,
                    tilt_baseline = profile.tilt_baseline,
                    valid_frames,
                    "Calibration complete"
                );
            }
            Some(CalibrationOutcome::Degraded { profile }) => {
                summary.degraded_calibrations += 1;
                if report.kept_previous_profile {
                    tracing::warn!("No face during recalibration, keeping previous thresholds");
                } else {
                    tracing::warn!(
                        ear_threshold = profile.ear_threshold,
                        tilt_baseline = profile.tilt_baseline,
                        "No face during calibration, using default thresholds"
                    );
                }
            }
            None => {}
        }

        summary.events_reported += self.alerts.dispatch(&report.actions) as u64;
    }

    pub fn monitor(&self) -> &DrowsinessMonitor {
        &self.monitor
    }

    pub fn into_parts(self) -> (DrowsinessMonitor, A, S) {
        let (alarm, sink) = self.alerts.into_parts();
        (self.monitor, alarm, sink)
    }
}
