// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<ImageItem>
// into tensors on the target device.
//
// How batching works here:
//   Input:  Vec of N ImageItems, each with size × size × 3 floats
//   Output: ImageBatch with
//             images  [N, size, size, 3]   (NHWC, values in [0, 1])
//             targets [N]                  (class indices)
//
//   We concatenate all pixel buffers into one long Vec, upload it
//   once, then reshape. The model permutes to NCHW itself.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::{dataset::ImageItem, preprocessor::CHANNELS};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Shape: [batch_size, size, size, 3]
    pub images: Tensor<B, 4>,

    /// Shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the correct
/// GPU/CPU, and the image side length used to reshape.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    device:     B::Device,
    image_size: usize,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<B, ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>, _device: &B::Device) -> ImageBatch<B> {
        let device     = &self.device;
        let batch_size = items.len();
        let size       = self.image_size;

        let mut pixels  = Vec::with_capacity(batch_size * size * size * CHANNELS);
        let mut targets = Vec::with_capacity(batch_size);
        for item in items {
            pixels.extend_from_slice(&item.pixels);
            targets.push(item.label as i64);
        }

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), device)
            .reshape([batch_size, size, size, CHANNELS]);
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), device);

        ImageBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_batch_shapes() {
        let device = <TestBackend as Backend>::Device::default();
        let items: Vec<ImageItem> = (0..3)
            .map(|i| ImageItem { pixels: vec![0.5; 4 * 4 * 3], label: i })
            .collect();

        let batch = ImageBatcher::<TestBackend>::new(device.clone(), 4).batch(items, &device);
        assert_eq!(batch.images.dims(), [3, 4, 4, 3]);
        assert_eq!(batch.targets.dims(), [3]);

        let labels: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![0, 1, 2]);
    }
}
