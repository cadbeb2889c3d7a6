use std::io::BufReader;
use std::sync::Arc;

use drowsiness_core::{DetectionConfig, DrowsinessMonitor, EventSink};
use drowsy_guard::config::{Config, ReportMode};
use drowsy_guard::detector::{DetectionLoop, JsonLinesProvider, LogAlarm, LoopSummary};
use drowsy_guard::logging::{init_tracing, LogConfig};
use drowsy_guard::services::notifier::NotificationGateway;
use drowsy_guard::services::reporter::{DirectNotifier, HttpEventReporter};
use tokio::runtime::Handle;

/// Reads landmark frames as JSON lines on stdin until EOF.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    init_tracing(&LogConfig::from_config(&config, "detector"));
    tracing::info!(mode = ?config.reporter.mode, "Starting detector");

    let detection = config.detection.clone();
    let summary = match config.reporter.mode {
        ReportMode::Server => {
            let reporter = HttpEventReporter::new(&config.reporter, Handle::current());
            tracing::info!(url = reporter.url(), "Reporting events to escalation server");
            match run_on_stdin(detection, reporter).await {
                Some((summary, reporter)) => {
                    reporter.flush().await;
                    Some(summary)
                }
                None => None,
            }
        }
        ReportMode::Direct => {
            let gateway = Arc::new(NotificationGateway::from_config(&config.notifier));
            let notifier = DirectNotifier::new(gateway, Handle::current());
            match run_on_stdin(detection, notifier).await {
                Some((summary, notifier)) => {
                    notifier.flush().await;
                    Some(summary)
                }
                None => None,
            }
        }
    };

    match summary {
        Some(summary) => tracing::info!(
            frames = summary.frames,
            no_face_frames = summary.no_face_frames,
            events = summary.events_reported,
            calibrations = summary.calibrations,
            degraded_calibrations = summary.degraded_calibrations,
            "Detector stopped"
        ),
        None => std::process::exit(1),
    }
}

/// The frame loop is synchronous, so it runs on a blocking thread while
/// reports go out on the runtime.
async fn run_on_stdin<S>(detection: DetectionConfig, sink: S) -> Option<(LoopSummary, S)>
where
    S: EventSink + Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || {
        let provider = JsonLinesProvider::new(BufReader::new(std::io::stdin()));
        let monitor = DrowsinessMonitor::new(detection);
        let mut detection_loop = DetectionLoop::new(provider, monitor, LogAlarm::default(), sink);
        let summary = detection_loop.run();
        let (_, _, sink) = detection_loop.into_parts();
        (summary, sink)
    })
    .await;

    match joined {
        Ok(result) => Some(result),
        Err(e) => {
            tracing::error!(error = %e, "Detection loop panicked");
            None
        }
    }
}
