use anyhow::{bail, Context, Result};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY},
};

use crate::domain::traits::{Frame, FrameSource};
use crate::vision::mat_to_rgb;

/// A webcam opened through OpenCV's VideoCapture.
///
/// The device is released on `release()` or, failing that, on drop.
pub struct OpenCvCamera {
    capture: VideoCapture,
    index:   i32,
    open:    bool,
}

impl OpenCvCamera {
    /// Open camera `index` with the driver's default resolution and rate
    pub fn open(index: i32) -> Result<Self> {
        let capture = VideoCapture::new(index, CAP_ANY)
            .with_context(|| format!("Cannot open camera {index}"))?;
        if !capture.is_opened()? {
            bail!("Camera {index} is not available");
        }
        tracing::info!("Opened camera {}", index);
        Ok(Self { capture, index, open: true })
    }
}

impl FrameSource for OpenCvCamera {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        match self.capture.read(&mut mat) {
            Ok(true) if mat.rows() > 0 => Ok(Some(mat_to_rgb(&mat)?)),
            Ok(_) => {
                tracing::info!("Camera {} produced no frame", self.index);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Reading from camera {} failed: {}", self.index, e);
                Ok(None)
            }
        }
    }

    fn release(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.capture
                .release()
                .with_context(|| format!("Cannot release camera {}", self.index))?;
            tracing::debug!("Released camera {}", self.index);
        }
        Ok(())
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("{e:#}");
        }
    }
}
