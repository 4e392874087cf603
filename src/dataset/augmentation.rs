//! Training-time Data Augmentation
//!
//! Seeded random horizontal flips, small rotations, and color jitter applied
//! to training images before tensor conversion. Validation and test images
//! never pass through here.

use image::{imageops, Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Augmentation parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Probability of a horizontal flip
    pub flip_probability: f64,
    /// Maximum rotation in degrees, sampled uniformly from [-max, max]
    pub max_rotation_degrees: f32,
    /// Brightness jitter: factor sampled from [1 - j, 1 + j]
    pub brightness_jitter: f32,
    /// Contrast jitter: factor sampled from [1 - j, 1 + j]
    pub contrast_jitter: f32,
    /// Saturation jitter: factor sampled from [1 - j, 1 + j]
    pub saturation_jitter: f32,
    /// Hue jitter: shift sampled from [-j, j] as a fraction of the color wheel
    pub hue_jitter: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            flip_probability: 0.5,
            max_rotation_degrees: 10.0,
            brightness_jitter: 0.2,
            contrast_jitter: 0.2,
            saturation_jitter: 0.2,
            hue_jitter: 0.1,
        }
    }
}

impl AugmentationConfig {
    /// A configuration that leaves images untouched
    pub fn none() -> Self {
        Self {
            flip_probability: 0.0,
            max_rotation_degrees: 0.0,
            brightness_jitter: 0.0,
            contrast_jitter: 0.0,
            saturation_jitter: 0.0,
            hue_jitter: 0.0,
        }
    }
}

/// Stateful augmenter with a seeded RNG
#[derive(Debug)]
pub struct Augmenter {
    config: AugmentationConfig,
    rng: ChaCha8Rng,
}

impl Augmenter {
    pub fn new(config: AugmentationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Apply the configured random transforms to one image
    pub fn apply(&mut self, image: &RgbImage) -> RgbImage {
        let mut out = image.clone();

        if self.config.flip_probability > 0.0 && self.rng.gen_bool(self.config.flip_probability) {
            out = imageops::flip_horizontal(&out);
        }

        if self.config.max_rotation_degrees > 0.0 {
            let max = self.config.max_rotation_degrees;
            let angle = self.rng.gen_range(-max..=max);
            out = rotate(&out, angle.to_radians());
        }

        if self.config.brightness_jitter > 0.0 {
            let factor = self.jitter_factor(self.config.brightness_jitter);
            out = adjust(&out, |v, _| v * factor);
        }

        if self.config.contrast_jitter > 0.0 {
            let factor = self.jitter_factor(self.config.contrast_jitter);
            out = adjust(&out, |v, _| (v - 128.0) * factor + 128.0);
        }

        if self.config.saturation_jitter > 0.0 {
            let factor = self.jitter_factor(self.config.saturation_jitter);
            out = adjust_saturation(&out, factor);
        }

        if self.config.hue_jitter > 0.0 {
            let max = self.config.hue_jitter;
            let shift = self.rng.gen_range(-max..=max);
            out = adjust_hue(&out, shift);
        }

        out
    }

    fn jitter_factor(&mut self, jitter: f32) -> f32 {
        self.rng.gen_range(1.0 - jitter..=1.0 + jitter)
    }
}

/// Rotate around the image center with bilinear sampling, clamping to edges
fn rotate(image: &RgbImage, radians: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (sin, cos) = radians.sin_cos();

    let mut out = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            // Inverse mapping back into the source image
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let sx = cos * dx + sin * dy + cx;
            let sy = -sin * dx + cos * dy + cy;
            out.put_pixel(x, y, bilinear_sample(image, sx, sy));
        }
    }
    out
}

fn bilinear_sample(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = image.dimensions();
    let clamp_x = |v: i64| v.clamp(0, width as i64 - 1) as u32;
    let clamp_y = |v: i64| v.clamp(0, height as i64 - 1) as u32;

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = image.get_pixel(clamp_x(x0), clamp_y(y0));
    let p10 = image.get_pixel(clamp_x(x0 + 1), clamp_y(y0));
    let p01 = image.get_pixel(clamp_x(x0), clamp_y(y0 + 1));
    let p11 = image.get_pixel(clamp_x(x0 + 1), clamp_y(y0 + 1));

    let mut result = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        result[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(result)
}

fn adjust(image: &RgbImage, f: impl Fn(f32, usize) -> f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in 0..3 {
            pixel[c] = f(pixel[c] as f32, c).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn adjust_saturation(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let gray =
            0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
        for c in 0..3 {
            let v = gray + (pixel[c] as f32 - gray) * factor;
            pixel[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Rotate every pixel's hue by `shift` (a fraction of the color wheel)
fn adjust_hue(image: &RgbImage, shift: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        let rotated = (h + shift * 360.0).rem_euclid(360.0);
        let (r, g, b) = hsv_to_rgb(rotated, s, v);
        pixel.0 = [r, g, b];
    }
    out
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };

    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((g + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((b + m) * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(size: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8])
        })
    }

    #[test]
    fn test_none_config_is_identity() {
        let image = gradient_image(16);
        let mut augmenter = Augmenter::new(AugmentationConfig::none(), 42);
        assert_eq!(augmenter.apply(&image), image);
    }

    #[test]
    fn test_flip_always() {
        let image = gradient_image(16);
        let config = AugmentationConfig {
            flip_probability: 1.0,
            ..AugmentationConfig::none()
        };
        let mut augmenter = Augmenter::new(config, 42);

        let flipped = augmenter.apply(&image);
        assert_eq!(flipped, imageops::flip_horizontal(&image));
    }

    #[test]
    fn test_rotation_preserves_dimensions() {
        let image = gradient_image(32);
        let rotated = rotate(&image, 10.0_f32.to_radians());
        assert_eq!(rotated.dimensions(), image.dimensions());
    }

    #[test]
    fn test_zero_rotation_is_near_identity() {
        let image = gradient_image(16);
        let rotated = rotate(&image, 0.0);
        assert_eq!(rotated, image);
    }

    #[test]
    fn test_seed_reproducibility() {
        let image = gradient_image(16);
        let config = AugmentationConfig::default();

        let a = Augmenter::new(config, 7).apply(&image);
        let b = Augmenter::new(config, 7).apply(&image);
        assert_eq!(a, b);
    }

    #[test]
    fn test_half_wheel_hue_shift_turns_red_cyan() {
        let red = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let shifted = adjust_hue(&red, 0.5);

        let pixel = shifted.get_pixel(0, 0);
        assert_eq!(pixel.0, [0, 255, 255]);
    }

    #[test]
    fn test_zero_hue_shift_is_identity() {
        let image = gradient_image(8);
        assert_eq!(adjust_hue(&image, 0.0), image);
    }

    #[test]
    fn test_brightness_clamps() {
        let bright = RgbImage::from_pixel(4, 4, Rgb([250, 250, 250]));
        let adjusted = adjust(&bright, |v, _| v * 1.5);
        assert!(adjusted.pixels().all(|p| p.0 == [255, 255, 255]));
    }
}
