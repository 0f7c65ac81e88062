// ============================================================
// Layer 4 — Training-time Augmentation
// ============================================================
// Randomly perturbs each training image every time it is drawn,
// so the model sees a slightly different picture every epoch.
//
// Transformations (sampled independently per image):
//   - rotation   : uniform in [-30°, +30°] around the centre
//   - x shift    : uniform in [-20%, +20%] of the width
//   - y shift    : uniform in [-20%, +20%] of the height
//   - mirror     : horizontal flip with probability 0.5
//
// Rotation and shift are applied together as one affine warp:
// for every output pixel we compute where it came from in the
// source image and sample it with bilinear interpolation.
// Source coordinates that fall outside the image are clamped to
// the nearest edge pixel, so the border is extended instead of
// filled with black.
//
// The validation stream never goes through this module.
//
// Reference: image crate documentation
//            rand crate documentation (Rng::gen_range)

use anyhow::{ensure, Result};
use image::{ImageBuffer, Rgb, RgbImage};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ─── Augmentation Configuration ──────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    /// Maximum absolute rotation in degrees
    pub rotation_degrees: f32,

    /// Maximum horizontal shift as a fraction of the width
    pub width_shift: f32,

    /// Maximum vertical shift as a fraction of the height
    pub height_shift: f32,

    /// Mirror left/right with probability 0.5
    pub horizontal_flip: bool,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            rotation_degrees: 30.0,
            width_shift:      0.2,
            height_shift:     0.2,
            horizontal_flip:  true,
        }
    }
}

impl AugmentConfig {
    /// No-op configuration
    pub fn disabled() -> Self {
        Self {
            rotation_degrees: 0.0,
            width_shift:      0.0,
            height_shift:     0.0,
            horizontal_flip:  false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.rotation_degrees >= 0.0 && self.rotation_degrees <= 180.0,
            "rotation_degrees must be in [0, 180] (got {})",
            self.rotation_degrees
        );
        ensure!(
            (0.0..1.0).contains(&self.width_shift),
            "width_shift must be in [0, 1) (got {})",
            self.width_shift
        );
        ensure!(
            (0.0..1.0).contains(&self.height_shift),
            "height_shift must be in [0, 1) (got {})",
            self.height_shift
        );
        Ok(())
    }
}

// ─── Sampled Parameters ──────────────────────────────────────────────────────
/// One concrete draw of the random transformation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AugmentParams {
    pub angle_degrees: f32,

    /// Horizontal shift in pixels (positive moves content right)
    pub shift_x: f32,

    /// Vertical shift in pixels (positive moves content down)
    pub shift_y: f32,

    pub flip: bool,
}

impl AugmentParams {
    #[cfg(test)]
    pub fn identity() -> Self {
        Self { angle_degrees: 0.0, shift_x: 0.0, shift_y: 0.0, flip: false }
    }

    fn moves_pixels(&self) -> bool {
        self.angle_degrees != 0.0 || self.shift_x != 0.0 || self.shift_y != 0.0
    }
}

// ─── Augmenter ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct Augmenter {
    config: AugmentConfig,
}

impl Augmenter {
    pub fn new(config: AugmentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Draw random parameters for an image of the given size
    pub fn sample<R: Rng + ?Sized>(&self, width: u32, height: u32, rng: &mut R) -> AugmentParams {
        let c = &self.config;

        let angle_degrees = symmetric(rng, c.rotation_degrees);
        let shift_x       = symmetric(rng, c.width_shift)  * width  as f32;
        let shift_y       = symmetric(rng, c.height_shift) * height as f32;
        let flip          = c.horizontal_flip && rng.gen_bool(0.5);

        AugmentParams { angle_degrees, shift_x, shift_y, flip }
    }

    /// Sample parameters and apply them
    pub fn apply<R: Rng + ?Sized>(&self, image: &RgbImage, rng: &mut R) -> RgbImage {
        let (w, h) = image.dimensions();
        let params = self.sample(w, h, rng);
        apply_params(image, &params)
    }
}

/// Uniform sample in [-max, +max]; exactly 0 when max is 0
fn symmetric<R: Rng + ?Sized>(rng: &mut R, max: f32) -> f32 {
    if max <= 0.0 {
        0.0
    } else {
        rng.gen_range(-max..=max)
    }
}

/// Warp (rotate + shift) then optionally mirror.
pub fn apply_params(image: &RgbImage, params: &AugmentParams) -> RgbImage {
    let warped = if params.moves_pixels() {
        warp_affine(image, params.angle_degrees, params.shift_x, params.shift_y)
    } else {
        image.clone()
    };

    if params.flip {
        image::imageops::flip_horizontal(&warped)
    } else {
        warped
    }
}

/// Rotate by `angle_degrees` around the image centre and translate by
/// (shift_x, shift_y). Inverse-mapped with bilinear sampling and
/// nearest-edge fill.
fn warp_affine(image: &RgbImage, angle_degrees: f32, shift_x: f32, shift_y: f32) -> RgbImage {
    let (w, h) = image.dimensions();
    let cx     = (w as f32 - 1.0) / 2.0;
    let cy     = (h as f32 - 1.0) / 2.0;

    // Inverse rotation maps output coordinates back to the source
    let (sin, cos) = angle_degrees.to_radians().sin_cos();

    ImageBuffer::from_fn(w, h, |x, y| {
        // Undo the shift, then undo the rotation about the centre
        let dx = x as f32 - shift_x - cx;
        let dy = y as f32 - shift_y - cy;
        let sx =  cos * dx + sin * dy + cx;
        let sy = -sin * dx + cos * dy + cy;
        sample_bilinear(image, sx, sy)
    })
}

fn sample_bilinear(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (w, h) = image.dimensions();
    let max_x  = (w - 1) as f32;
    let max_y  = (h - 1) as f32;

    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = image.get_pixel(x0, y0);
    let p10 = image.get_pixel(x1, y0);
    let p01 = image.get_pixel(x0, y1);
    let p11 = image.get_pixel(x1, y1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top    = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        let value  = top * (1.0 - fy) + bottom * fy;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 128]))
    }

    #[test]
    fn test_identity_params_keep_image() {
        let img = gradient(8, 6);
        assert_eq!(apply_params(&img, &AugmentParams::identity()), img);
    }

    #[test]
    fn test_flip_mirrors_columns() {
        let img     = gradient(5, 3);
        let params  = AugmentParams { flip: true, ..AugmentParams::identity() };
        let flipped = apply_params(&img, &params);
        for y in 0..3 {
            for x in 0..5 {
                assert_eq!(flipped.get_pixel(x, y), img.get_pixel(4 - x, y));
            }
        }
    }

    #[test]
    fn test_integer_shift_moves_content() {
        let img     = gradient(10, 10);
        let params  = AugmentParams { shift_x: 2.0, ..AugmentParams::identity() };
        let shifted = apply_params(&img, &params);
        // Interior pixels come from two columns to the left
        assert_eq!(shifted.get_pixel(5, 4), img.get_pixel(3, 4));
        // Left edge is filled with the nearest source column
        assert_eq!(shifted.get_pixel(0, 4), img.get_pixel(0, 4));
    }

    #[test]
    fn test_half_turn_rotation() {
        let img     = gradient(7, 7);
        let params  = AugmentParams { angle_degrees: 180.0, ..AugmentParams::identity() };
        let rotated = apply_params(&img, &params);
        assert_eq!(rotated.get_pixel(0, 0), img.get_pixel(6, 6));
        assert_eq!(rotated.get_pixel(3, 3), img.get_pixel(3, 3));
    }

    #[test]
    fn test_sampled_params_stay_in_range() {
        let aug     = Augmenter::new(AugmentConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = aug.sample(128, 128, &mut rng);
            assert!(p.angle_degrees.abs() <= 30.0);
            assert!(p.shift_x.abs() <= 0.2 * 128.0);
            assert!(p.shift_y.abs() <= 0.2 * 128.0);
        }
    }

    #[test]
    fn test_disabled_config_is_noop() {
        let aug     = Augmenter::new(AugmentConfig::disabled()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let img     = gradient(9, 9);
        assert_eq!(aug.apply(&img, &mut rng), img);
    }

    #[test]
    fn test_output_keeps_dimensions() {
        let aug     = Augmenter::new(AugmentConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let out     = aug.apply(&gradient(20, 12), &mut rng);
        assert_eq!(out.dimensions(), (20, 12));
    }

    #[test]
    fn test_rejects_bad_shift() {
        let cfg = AugmentConfig { width_shift: 1.5, ..AugmentConfig::default() };
        assert!(Augmenter::new(cfg).is_err());
    }
}
