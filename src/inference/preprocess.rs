//! Image Preprocessing
//!
//! Turns raw bytes or a base64 payload into the normalized `[1, 3, S, S]`
//! tensor the classifiers expect: decode, force RGB, resize with linear
//! interpolation, scale to [0, 1], then apply ImageNet mean/std.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use burn::prelude::*;
use image::{imageops::FilterType, ImageReader};

use crate::utils::error::{MushroomError, Result};
use crate::{IMAGENET_MEAN, IMAGENET_STD};

/// Decode a base64 payload, stripping an optional `data:image/...;base64,` prefix
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let encoded = if payload.starts_with("data:image") {
        match payload.find(',') {
            Some(idx) => &payload[idx + 1..],
            None => {
                return Err(MushroomError::InvalidImage(
                    "data URL is missing the payload separator".to_string(),
                ))
            }
        }
    } else {
        payload
    };

    BASE64
        .decode(encoded.trim())
        .map_err(|e| MushroomError::InvalidImage(format!("malformed base64: {e}")))
}

/// Preprocess raw image bytes into a normalized batch-of-one tensor
pub fn preprocess_bytes<B: Backend>(
    bytes: &[u8],
    image_size: usize,
    device: &B::Device,
) -> Result<Tensor<B, 4>> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MushroomError::InvalidImage(e.to_string()))?
        .decode()
        .map_err(|e| MushroomError::InvalidImage(format!("undecodable image: {e}")))?;

    let rgb = img
        .resize_exact(image_size as u32, image_size as u32, FilterType::Triangle)
        .to_rgb8();

    let size = image_size;
    let mut data = vec![0.0f32; 3 * size * size];
    for (i, pixel) in rgb.pixels().enumerate() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * size * size + i] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    let tensor = Tensor::<B, 1>::from_data(
        TensorData::new(data, Shape::new([3 * size * size])).convert::<B::FloatElem>(),
        device,
    );
    Ok(tensor.reshape([1, 3, size, size]))
}

/// Preprocess a base64 payload into a normalized batch-of-one tensor
pub fn preprocess_base64<B: Backend>(
    payload: &str,
    image_size: usize,
    device: &B::Device,
) -> Result<Tensor<B, 4>> {
    let bytes = decode_base64(payload)?;
    preprocess_bytes(&bytes, image_size, device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use image::{Rgb, RgbImage};

    fn png_bytes(color: [u8; 3], size: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(size, size, Rgb(color));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        bytes
    }

    #[test]
    fn test_preprocess_shape() {
        let device = Default::default();
        let tensor =
            preprocess_bytes::<DefaultBackend>(&png_bytes([100, 150, 200], 10), 32, &device)
                .unwrap();
        assert_eq!(tensor.dims(), [1, 3, 32, 32]);
    }

    #[test]
    fn test_preprocess_normalizes_channels() {
        let device = Default::default();
        let tensor =
            preprocess_bytes::<DefaultBackend>(&png_bytes([128, 128, 128], 8), 8, &device)
                .unwrap();
        let values: Vec<f32> = tensor.into_data().to_vec().unwrap();

        for c in 0..3 {
            let expected = (128.0 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            let actual = values[c * 64];
            assert!(
                (actual - expected).abs() < 1e-4,
                "channel {c}: {actual} vs {expected}"
            );
        }
    }

    #[test]
    fn test_undecodable_bytes_rejected() {
        let device = Default::default();
        let result =
            preprocess_bytes::<DefaultBackend>(b"definitely not an image", 32, &device);
        assert!(matches!(result, Err(MushroomError::InvalidImage(_))));
    }

    #[test]
    fn test_decode_base64_plain() {
        let bytes = png_bytes([10, 20, 30], 4);
        let encoded = BASE64.encode(&bytes);
        assert_eq!(decode_base64(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_decode_base64_data_url() {
        let bytes = png_bytes([10, 20, 30], 4);
        let encoded = format!("data:image/png;base64,{}", BASE64.encode(&bytes));
        assert_eq!(decode_base64(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_decode_base64_malformed() {
        let result = decode_base64("this is !!! not base64");
        assert!(matches!(result, Err(MushroomError::InvalidImage(_))));
    }

    #[test]
    fn test_decode_data_url_without_comma() {
        let result = decode_base64("data:image/png;base64");
        assert!(matches!(result, Err(MushroomError::InvalidImage(_))));
    }
}
