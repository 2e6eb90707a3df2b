//! Pixel-buffer helpers shared by the model wrappers.

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};

/// Grayscale conversion with BT.601 luma weights.
pub fn rgb_to_luma(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .map(|px| {
            let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
            y.round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

/// Wrap a packed RGB24 buffer, or `None` if its length does not match.
pub fn rgb_image(rgb: &[u8], width: u32, height: u32) -> Option<RgbImage> {
    RgbImage::from_raw(width, height, rgb.get(..(width * height * 3) as usize)?.to_vec())
}

pub fn gray_image(gray: &[u8], width: u32, height: u32) -> Option<GrayImage> {
    GrayImage::from_raw(width, height, gray.get(..(width * height) as usize)?.to_vec())
}

/// Scale + padding used to fit a frame into a square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    pub fn fit(width: u32, height: u32, size: u32) -> Self {
        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let new_w = (width as f32 * scale).round();
        let new_h = (height as f32 * scale).round();
        Self {
            scale,
            pad_x: ((size as f32 - new_w) / 2.0).floor(),
            pad_y: ((size as f32 - new_h) / 2.0).floor(),
        }
    }

    /// Map a point in model-input pixels back to source-frame pixels.
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Resize `img` into a black `size × size` canvas, preserving aspect ratio.
pub fn letterbox(img: &RgbImage, size: u32) -> (RgbImage, Letterbox) {
    let lb = Letterbox::fit(img.width(), img.height(), size);
    let new_w = ((img.width() as f32 * lb.scale).round() as u32).clamp(1, size);
    let new_h = ((img.height() as f32 * lb.scale).round() as u32).clamp(1, size);

    let resized = imageops::resize(img, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([0, 0, 0]));
    imageops::overlay(&mut canvas, &resized, lb.pad_x as i64, lb.pad_y as i64);

    (canvas, lb)
}

/// Index of the largest value; `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_luma() {
        let rgb = [255, 255, 255, 0, 0, 0, 255, 0, 0];
        assert_eq!(rgb_to_luma(&rgb), vec![255, 0, 76]);
    }

    #[test]
    fn test_rgb_image_length_check() {
        assert!(rgb_image(&[0u8; 12], 2, 2).is_some());
        assert!(rgb_image(&[0u8; 11], 2, 2).is_none());
    }

    #[test]
    fn test_letterbox_landscape() {
        let lb = Letterbox::fit(640, 480, 256);
        assert!((lb.scale - 0.4).abs() < 1e-6);
        assert_eq!(lb.pad_x, 0.0);
        assert_eq!(lb.pad_y, 32.0);

        // Centre of the canvas maps back to the centre of the frame.
        let (x, y) = lb.unmap(128.0, 128.0);
        assert!((x - 320.0).abs() < 1e-3);
        assert!((y - 240.0).abs() < 1e-3);
    }

    #[test]
    fn test_letterbox_canvas_size() {
        let img = RgbImage::from_pixel(100, 50, Rgb([200, 10, 10]));
        let (canvas, lb) = letterbox(&img, 64);
        assert_eq!(canvas.dimensions(), (64, 64));
        assert_eq!(lb.pad_y, 16.0);
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(32, 32), &Rgb([200, 10, 10]));
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
