//! Image preprocessing for ONNX model inference.
//!
//! Both pretrained models expect:
//! - A fixed square input size (224×224 for the defaults)
//! - RGB channel order
//! - Per-channel normalization: (pixel/255 - mean) / std
//! - NCHW tensor layout [batch, channels, height, width]
//!
//! The normalization constants differ per model, so they are passed in by
//! the caller.

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP per-channel normalization mean.
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP per-channel normalization std.
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// ViT caption encoder normalization mean (all channels).
pub const VIT_MEAN: [f32; 3] = [0.5, 0.5, 0.5];

/// ViT caption encoder normalization std (all channels).
pub const VIT_STD: [f32; 3] = [0.5, 0.5, 0.5];

/// Preprocess an image for model inference.
///
/// Resizes to `image_size × image_size`, converts to RGB, normalizes with
/// the given per-channel mean/std, and returns an NCHW tensor suitable for
/// ONNX Runtime.
pub fn preprocess(
    image: &DynamicImage,
    image_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
) -> Array4<f32> {
    let resized = image.resize_exact(
        image_size,
        image_size,
        image::imageops::FilterType::Lanczos3,
    );
    let rgb = resized.to_rgb8();

    let size = image_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));

    // Access raw RGB bytes and the tensor slice directly to avoid per-pixel
    // bounds-checking overhead from get_pixel() and 4D ndarray indexing.
    let raw = rgb.as_raw();
    let tensor_data = tensor.as_slice_mut().unwrap();
    for (i, pixel) in raw.chunks_exact(3).enumerate() {
        let y = i / size;
        let x = i % size;
        for (c, &val) in pixel.iter().enumerate() {
            // NCHW layout: offset = c * size * size + y * size + x
            let idx = c * size * size + y * size + x;
            tensor_data[idx] = (val as f32 / 255.0 - mean[c]) / std[c];
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_preprocess_shape() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let tensor = preprocess(&img, 224, VIT_MEAN, VIT_STD);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_vit_normalization_range() {
        // White image (255, 255, 255) -> (255/255 - 0.5) / 0.5 = 1.0
        let img =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, image::Rgb([255, 255, 255])));
        let tensor = preprocess(&img, 224, VIT_MEAN, VIT_STD);
        let max_val = tensor.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!((max_val - 1.0).abs() < 0.01);

        // Black image (0, 0, 0) -> (0/255 - 0.5) / 0.5 = -1.0
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, image::Rgb([0, 0, 0])));
        let tensor = preprocess(&img, 224, VIT_MEAN, VIT_STD);
        let min_val = tensor.iter().cloned().fold(f32::INFINITY, f32::min);
        assert!((min_val - (-1.0)).abs() < 0.01);
    }

    #[test]
    fn test_clip_normalization_uses_per_channel_constants() {
        // Black image: each channel becomes -mean/std, which differs per channel.
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, image::Rgb([0, 0, 0])));
        let tensor = preprocess(&img, 224, CLIP_MEAN, CLIP_STD);
        let r = tensor[[0, 0, 0, 0]];
        let g = tensor[[0, 1, 0, 0]];
        assert!((r - (-CLIP_MEAN[0] / CLIP_STD[0])).abs() < 1e-5);
        assert!((r - g).abs() > 1e-4);
    }
}
