// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Turns an RGB image of any size into the model's input layout.
//
// The exact same steps run at training time (on dataset images)
// and at inference time (on camera frames):
//
//   1. Resize to size × size with bilinear filtering
//   2. Flatten to height × width × channel order (HWC)
//   3. Scale every byte to [0, 1] by dividing by 255
//
// Keeping both paths on this one struct is what guarantees the
// live model sees the same pixel distribution it was trained on.
//
// Reference: image crate documentation (imageops::resize)

use image::{imageops::FilterType, RgbImage};

/// Number of colour channels in every model input
pub const CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    /// Side length of the square model input
    size: u32,
}

impl Preprocessor {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Resize to the model input size. Images that already have the
    /// right size are copied unchanged.
    pub fn resize(&self, image: &RgbImage) -> RgbImage {
        if image.dimensions() == (self.size, self.size) {
            return image.clone();
        }
        image::imageops::resize(image, self.size, self.size, FilterType::Triangle)
    }

    /// Scale an image that is already size × size to [0, 1] floats in
    /// HWC order. `RgbImage` stores its bytes row-major RGB, which is
    /// exactly HWC, so this is a straight map over the raw buffer.
    pub fn normalize(&self, image: &RgbImage) -> Vec<f32> {
        debug_assert_eq!(image.dimensions(), (self.size, self.size));
        image.as_raw().iter().map(|&b| b as f32 / 255.0).collect()
    }

    /// Resize then normalise. Used on camera frames.
    pub fn prepare(&self, image: &RgbImage) -> Vec<f32> {
        self.normalize(&self.resize(image))
    }
}
