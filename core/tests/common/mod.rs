#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use image::{DynamicImage, GrayAlphaImage, GrayImage, LumaA, Rgb, RgbImage, Rgba, RgbaImage};
use image_reducer_core::{FileResult, ProgressSink, ResultsLog};

/// Opaque RGB gradient.
pub fn rgb_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 90])
    })
}

/// RGBA image: left column fully transparent, right column fully opaque,
/// the rest half transparent.
pub fn rgba_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if x == 0 {
            0
        } else if x == width - 1 {
            255
        } else {
            128
        };
        Rgba([200, (y * 10) as u8, 40, alpha])
    })
}

/// Busy multi-color image with partial transparency, so palette
/// quantization has real work to do.
pub fn noisy_rgba_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let h = x.wrapping_mul(2654435761) ^ y.wrapping_mul(40503);
        Rgba([
            (x * 255 / width.max(1)) as u8 ^ (h >> 24) as u8 & 0x1f,
            (y * 255 / height.max(1)) as u8,
            ((x + y) * 3) as u8 ^ (h >> 16) as u8 & 0x0f,
            if (x / 16 + y / 16) % 3 == 0 { 160 } else { 255 },
        ])
    })
}

pub fn write_png(path: &Path, image: &DynamicImage) {
    image.save_with_format(path, image::ImageFormat::Png).unwrap();
}

pub fn write_jpeg(path: &Path, image: &RgbImage) {
    DynamicImage::ImageRgb8(image.clone())
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

pub fn write_corrupt(path: &Path) {
    fs::write(path, b"this is not an image, only some text").unwrap();
}

/// Images in every color mode the normalizer distinguishes.
pub fn all_modes() -> Vec<(&'static str, DynamicImage)> {
    vec![
        ("rgb", DynamicImage::ImageRgb8(rgb_image(13, 7))),
        ("rgba", DynamicImage::ImageRgba8(rgba_image(11, 5))),
        (
            "gray_alpha",
            DynamicImage::ImageLumaA8(GrayAlphaImage::from_fn(6, 9, |x, _| {
                LumaA([120, if x % 2 == 0 { 0 } else { 255 }])
            })),
        ),
        (
            "gray",
            DynamicImage::ImageLuma8(GrayImage::from_fn(8, 3, |x, y| image::Luma([(x * y) as u8]))),
        ),
        (
            "rgb16",
            DynamicImage::ImageRgb16(image::ImageBuffer::from_pixel(5, 4, Rgb([40000u16, 100, 65535]))),
        ),
    ]
}

/// Sink that keeps everything it is told.
#[derive(Default)]
pub struct Recorder {
    pub processing: RefCell<Vec<String>>,
    pub progress: RefCell<Vec<(usize, usize)>>,
    pub records: RefCell<Vec<FileResult>>,
}

impl ProgressSink for Recorder {
    fn processing(&self, filename: &str) {
        self.processing.borrow_mut().push(filename.to_string());
    }

    fn progress(&self, current: usize, total: usize) {
        self.progress.borrow_mut().push((current, total));
    }
}

impl ResultsLog for Recorder {
    fn record(&self, result: &FileResult) {
        self.records.borrow_mut().push(result.clone());
    }
}
