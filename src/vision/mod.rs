// ============================================================
// Layer 7 — Vision Adapters (OpenCV)
// ============================================================
// Concrete camera and window implementations of the domain
// FrameSource / FrameSink traits. Compiled only with the
// `camera` cargo feature, since it needs a system OpenCV.
//
//   camera.rs — OpenCvCamera: VideoCapture → RGB frames
//   window.rs — OpenCvWindow: imshow + put_text + wait_key
//
// OpenCV stores pixels as BGR; the rest of the crate works in
// RGB (the order training images are decoded in), so every
// frame is converted once on the way in and once on the way out.
//
// Reference: opencv crate documentation (videoio, highgui, imgproc)

use anyhow::{Context, Result};
use image::RgbImage;
use opencv::{
    core::{Mat, Point, Scalar, CV_8UC3},
    imgproc,
    prelude::*,
};

use crate::domain::overlay::Overlay;

/// Camera capture
pub mod camera;

/// Display window with caption rendering
pub mod window;

/// BGR Mat (as delivered by VideoCapture) → RGB image
pub fn mat_to_rgb(bgr: &Mat) -> Result<RgbImage> {
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(bgr, &mut rgb, imgproc::COLOR_BGR2RGB)
        .context("Cannot convert camera frame from BGR to RGB")?;

    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    let bytes = rgb.data_bytes()?.to_vec();
    RgbImage::from_raw(width, height, bytes)
        .with_context(|| format!("Camera frame {width}x{height} has an unexpected pixel layout"))
}

/// RGB image → BGR Mat ready for imshow
pub fn rgb_to_mat(image: &RgbImage) -> Result<Mat> {
    let mut rgb = Mat::new_rows_cols_with_default(
        image.height() as i32,
        image.width() as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    rgb.data_bytes_mut()?.copy_from_slice(image.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR)?;
    Ok(bgr)
}

/// Rasterise the caption onto a BGR frame
pub fn draw_overlay(frame: &mut Mat, overlay: &Overlay) -> Result<()> {
    let [r, g, b] = overlay.color;
    imgproc::put_text(
        frame,
        &overlay.text,
        Point::new(overlay.origin.0, overlay.origin.1),
        imgproc::FONT_HERSHEY_SIMPLEX,
        overlay.font_scale,
        Scalar::new(b as f64, g as f64, r as f64, 0.0),
        overlay.thickness,
        imgproc::LINE_8,
        false,
    )
    .context("Cannot draw caption")?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::Prediction;
    use image::Rgb;

    #[test]
    fn test_colour_order_survives_conversion() {
        let image = RgbImage::from_pixel(4, 3, Rgb([200, 100, 50]));
        let mat   = rgb_to_mat(&image).unwrap();
        // BGR inside OpenCV
        assert_eq!(&mat.data_bytes().unwrap()[..3], &[50, 100, 200]);
        assert_eq!(mat_to_rgb(&mat).unwrap(), image);
    }

    #[test]
    fn test_overlay_renders_on_black_frame() {
        let prediction = Prediction { index: 0, label: "Invierno".into(), probabilities: vec![1.0] };
        let mut frame  = rgb_to_mat(&RgbImage::new(128, 128)).unwrap();
        draw_overlay(&mut frame, &Overlay::for_prediction(&prediction)).unwrap();

        // some pixels are now green
        let bytes = frame.data_bytes().unwrap();
        assert!(bytes.chunks(3).any(|px| px[1] > 0 && px[0] == 0 && px[2] == 0));
    }
}
