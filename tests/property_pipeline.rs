use proptest::prelude::*;

use drowsiness_core::{
    AlertAction, CalibrationProfile, DetectionConfig, DrowsinessMonitor, EventKind, Measurement,
    SignalSample,
};
use drowsy_guard::services::event_window::{EventRecord, EventWindow};

fn measurement() -> impl Strategy<Value = Measurement> {
    prop_oneof![
        6 => (0.0_f64..1.5).prop_map(Measurement::Value),
        1 => Just(Measurement::NoFace),
        1 => Just(Measurement::Unavailable),
    ]
}

fn sample_at(index: usize, ear: Measurement, mar: Measurement, tilt: Measurement) -> SignalSample {
    SignalSample {
        ear,
        mar,
        tilt_ratio: tilt,
        timestamp: index as f64 / 30.0,
    }
}

fn rank(action: &AlertAction) -> u8 {
    match action {
        AlertAction::Silence | AlertAction::Raise(EventKind::Drowsiness) => 0,
        AlertAction::Raise(EventKind::Yawn) => 1,
        AlertAction::Raise(_) => 2,
    }
}

proptest! {
    #[test]
    fn pt_actions_follow_available_signals(
        signals in proptest::collection::vec((measurement(), measurement(), measurement()), 1..200),
    ) {
        let mut monitor = DrowsinessMonitor::with_profile(
            DetectionConfig::default(),
            CalibrationProfile::default(),
        );

        for (i, (ear, mar, tilt)) in signals.into_iter().enumerate() {
            let report = monitor.process_sample(sample_at(i, ear, mar, tilt));

            prop_assert!(report.actions.len() <= 3);
            let ranks: Vec<u8> = report.actions.iter().map(rank).collect();
            prop_assert!(ranks.windows(2).all(|w| w[0] < w[1]));

            for action in &report.actions {
                match action {
                    AlertAction::Silence | AlertAction::Raise(EventKind::Drowsiness) => {
                        prop_assert!(ear.is_value());
                    }
                    AlertAction::Raise(EventKind::Yawn) => prop_assert!(mar.is_value()),
                    AlertAction::Raise(_) => prop_assert!(tilt.is_value()),
                }
            }
        }
    }

    #[test]
    fn pt_window_counts_only_recent_events(
        gaps in proptest::collection::vec(0_i64..120, 1..60),
        threshold in 1_usize..6,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        rt.block_on(async {
            let window = EventWindow::new(60, threshold);
            let mut ts = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
            for gap in gaps {
                ts += chrono::Duration::seconds(gap);
                let decision = window
                    .ingest(EventRecord { ts, kind: EventKind::Drowsiness })
                    .await;

                prop_assert!(decision.count <= threshold);
                prop_assert_eq!(decision.escalate, decision.count == threshold);
                let held = window.snapshot().await;
                if decision.escalate {
                    prop_assert!(held.is_empty());
                } else {
                    let in_window = held
                        .iter()
                        .filter(|r| ts - r.ts <= chrono::Duration::seconds(60))
                        .count();
                    prop_assert_eq!(in_window, decision.count);
                }
            }
            Ok(())
        })?;
    }
}
