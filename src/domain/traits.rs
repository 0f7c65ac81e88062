// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The live loop is written against these three traits instead
// of OpenCV and Burn directly:
//
//   FrameSource     — something that yields camera frames
//                     (OpenCvCamera, or a fake in tests)
//   FrameSink       — something that shows frames and reports
//                     key presses (OpenCvWindow, or a fake)
//   FrameClassifier — something that turns a frame into a
//                     Prediction (Inferencer, or a fake)
//
// The application layer only sees these traits, so the whole
// capture → predict → render loop runs in unit tests without a
// camera, a window or a GPU.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use image::RgbImage;

use crate::domain::overlay::Overlay;
use crate::domain::prediction::Prediction;

/// One captured video frame, RGB, at the camera's native size.
pub type Frame = RgbImage;

// ─── FrameSource ──────────────────────────────────────────────────────────────
/// A stream of frames, e.g. a camera.
pub trait FrameSource {
    /// Read the next frame.
    /// `Ok(None)` means the stream has ended (or the read failed);
    /// the caller must not retry.
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying device. Must be safe to call more than once.
    fn release(&mut self) -> Result<()>;
}

// ─── FrameSink ────────────────────────────────────────────────────────────────
/// A display surface that also reports key presses.
pub trait FrameSink {
    /// Draw the overlay on the frame and show it.
    fn show(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()>;

    /// Wait up to `wait_ms` milliseconds for a key press.
    /// Returns the pressed key, or None if nothing was pressed.
    fn poll_key(&mut self, wait_ms: i32) -> Result<Option<char>>;

    /// Close every window opened by this sink. Must be safe to call
    /// more than once.
    fn close(&mut self) -> Result<()>;
}

// ─── FrameClassifier ──────────────────────────────────────────────────────────
/// Anything that can label a frame.
pub trait FrameClassifier {
    fn classify(&self, frame: &Frame) -> Result<Prediction>;
}
