// ============================================================
// Layer 2 — LiveUseCase
// ============================================================
// Classifies a camera feed frame by frame:
//
//   loop {
//     read frame        ── no frame? stop (end of stream)
//     classify frame    (same resize + scaling as training)
//     draw "Season: <label>" and show it
//     wait 1 ms for a key ── 'q'? stop
//   }
//   release camera, close window   (always, even on error)
//
// The loop only talks to the domain traits, so it is driven by
// OpenCV in the binary and by in-memory fakes in the tests.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::domain::{
    overlay::Overlay,
    traits::{FrameClassifier, FrameSink, FrameSource},
};

/// Key that ends the loop
pub const QUIT_KEY: char = 'q';

/// How long each iteration waits for a key press
pub const KEY_WAIT_MS: i32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct LiveConfig {
    pub model_path:   PathBuf,
    pub camera_index: i32,
    pub window_title: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model_path:   PathBuf::from("season_model.tar.gz"),
            camera_index: 0,
            window_title: "Season Detection".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The user pressed the quit key
    QuitKey,
    /// The source stopped producing frames
    EndOfStream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSummary {
    /// Frames classified and shown
    pub frames:      usize,
    pub stop_reason: StopReason,
}

// ─── LiveUseCase ──────────────────────────────────────────────────────────────
pub struct LiveUseCase<C: FrameClassifier> {
    classifier: C,
}

impl<C: FrameClassifier> LiveUseCase<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// Run until the quit key or end of stream. The source is
    /// released and the sink closed on every exit path.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<LiveSummary>
    where
        S: FrameSource,
        K: FrameSink,
    {
        let outcome  = self.run_loop(source, sink);
        let released = source.release();
        let closed   = sink.close();

        match outcome {
            Ok(summary) => {
                released.context("Failed to release the camera")?;
                closed.context("Failed to close the display window")?;
                tracing::info!(
                    "Live loop stopped after {} frames ({:?})",
                    summary.frames,
                    summary.stop_reason
                );
                Ok(summary)
            }
            Err(e) => {
                // the loop error is the one worth reporting
                if let Err(release_err) = released {
                    tracing::warn!("Also failed to release the camera: {release_err:#}");
                }
                if let Err(close_err) = closed {
                    tracing::warn!("Also failed to close the window: {close_err:#}");
                }
                Err(e)
            }
        }
    }

    fn run_loop<S, K>(&self, source: &mut S, sink: &mut K) -> Result<LiveSummary>
    where
        S: FrameSource,
        K: FrameSink,
    {
        let mut frames = 0usize;
        loop {
            let Some(frame) = source.read_frame()? else {
                return Ok(LiveSummary { frames, stop_reason: StopReason::EndOfStream });
            };

            let prediction = self.classifier.classify(&frame)?;
            tracing::debug!(
                "Frame {}: {} ({:.1}%)",
                frames + 1,
                prediction.label,
                prediction.confidence() * 100.0
            );

            sink.show(&frame, &Overlay::for_prediction(&prediction))?;
            frames += 1;

            if sink.poll_key(KEY_WAIT_MS)? == Some(QUIT_KEY) {
                return Ok(LiveSummary { frames, stop_reason: StopReason::QuitKey });
            }
        }
    }
}

// ─── Camera entry point ───────────────────────────────────────────────────────
/// Load the model, open the camera and the window, and run the loop.
#[cfg(feature = "camera")]
pub fn run_camera(cfg: &LiveConfig) -> Result<LiveSummary> {
    use crate::ml::inferencer::Inferencer;
    use crate::vision::{camera::OpenCvCamera, window::OpenCvWindow};

    let inferencer = Inferencer::from_artifact(&cfg.model_path)?;
    let mut camera = OpenCvCamera::open(cfg.camera_index)?;
    let mut window = OpenCvWindow::open(cfg.window_title.clone())?;

    println!("Press '{QUIT_KEY}' in the '{}' window to quit", cfg.window_title);
    LiveUseCase::new(inferencer).run(&mut camera, &mut window)
}

#[cfg(not(feature = "camera"))]
pub fn run_camera(_cfg: &LiveConfig) -> Result<LiveSummary> {
    anyhow::bail!(
        "This build has no camera support; rebuild with `--features camera` (requires OpenCV)"
    )
}
