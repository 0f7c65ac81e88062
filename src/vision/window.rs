use anyhow::{Context, Result};
use opencv::highgui;

use crate::domain::{
    overlay::Overlay,
    traits::{Frame, FrameSink},
};
use crate::vision::{draw_overlay, rgb_to_mat};

/// One titled HighGUI window.
pub struct OpenCvWindow {
    title: String,
    open:  bool,
}

impl OpenCvWindow {
    pub fn open(title: impl Into<String>) -> Result<Self> {
        let title = title.into();
        highgui::named_window(&title, highgui::WINDOW_AUTOSIZE)
            .with_context(|| format!("Cannot open window '{title}'"))?;
        Ok(Self { title, open: true })
    }
}

impl FrameSink for OpenCvWindow {
    fn show(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()> {
        let mut bgr = rgb_to_mat(frame)?;
        draw_overlay(&mut bgr, overlay)?;
        highgui::imshow(&self.title, &bgr)
            .with_context(|| format!("Cannot show frame in '{}'", self.title))?;
        Ok(())
    }

    fn poll_key(&mut self, wait_ms: i32) -> Result<Option<char>> {
        let key = highgui::wait_key(wait_ms)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(char::from_u32((key & 0xFF) as u32))
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            highgui::destroy_all_windows().context("Cannot close display windows")?;
        }
        Ok(())
    }
}

impl Drop for OpenCvWindow {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("{e:#}");
        }
    }
}
