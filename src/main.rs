//! Demo: run the pipeline on scripted collaborators and poll the results.

use anyhow::Result;
use nalgebra::Vector3;

use rigtrack::synthetic::{gray_frame, ScriptedConsent, ScriptedEstimator, ScriptedLocator, ScriptedSource};
use rigtrack::{LocalDetection, MarkerTracker, TrackerConfig};

/// 30 fps in 100 ns device ticks.
const FRAME_INTERVAL_TICKS: u64 = 333_333;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // a second's worth of synchronized 640x480 frame pairs
    let script = (1..=30u64).map(|i| {
        let ticks = i * FRAME_INTERVAL_TICKS;
        Some((gray_frame(640, 480, 128, ticks), gray_frame(640, 480, 128, ticks)))
    });

    // one marker half a meter down the left camera's optical axis
    let detection = LocalDetection {
        id: 23,
        rvec: Vector3::zeros(),
        tvec: Vector3::new(0.0, 0.0, 0.5),
    };

    let mut tracker = MarkerTracker::new(
        Box::new(ScriptedSource::with_identity_rig(script)),
        Box::new(ScriptedLocator::identity()),
        Box::new(ScriptedEstimator::fixed(vec![detection])),
        Box::new(ScriptedConsent::granted()),
        TrackerConfig::default(),
    );

    tracker.initialize()?;
    tracker.start()?;

    let publication = tracker.publication();
    for _ in 0..200 {
        if publication.markers_updated() {
            for marker in publication.markers().iter() {
                println!(
                    "marker {} at world position [{:.3}, {:.3}, {:.3}]",
                    marker.id, marker.position[0], marker.position[1], marker.position[2]
                );
            }
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    println!(
        "last detection took {} ms",
        publication.last_processing_time_ms()
    );

    tracker.stop();
    Ok(())
}
