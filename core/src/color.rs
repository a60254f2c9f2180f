use std::fs;
use std::path::Path;

use image::{ColorType, DynamicImage, GenericImageView, Rgb, RgbImage, RgbaImage};

use crate::error::TranscodeError;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
/// Offset of the color type byte inside a PNG stream (signature, IHDR length
/// and tag, width, height, bit depth).
const PNG_IHDR_COLOR_TYPE: usize = 25;
const PNG_COLOR_TYPE_PALETTE: u8 = 3;

/// Color mode of a decoded image, as far as normalization cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Palette image. The decoder has already expanded the palette.
    Indexed,
    GrayAlpha,
    Rgba,
    Rgb,
    Other,
}

impl ColorMode {
    fn from_color_type(color: ColorType) -> Self {
        match color {
            ColorType::La8 | ColorType::La16 => ColorMode::GrayAlpha,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::Rgba,
            ColorType::Rgb8 => ColorMode::Rgb,
            _ => ColorMode::Other,
        }
    }
}

/// Is this a PNG whose IHDR declares an indexed color type?
fn is_indexed_png(data: &[u8]) -> bool {
    data.len() > PNG_IHDR_COLOR_TYPE
        && data.starts_with(PNG_SIGNATURE)
        && &data[12..16] == b"IHDR"
        && data[PNG_IHDR_COLOR_TYPE] == PNG_COLOR_TYPE_PALETTE
}

/// A decoded image held for the duration of one transcode.
pub struct ImageHandle {
    image: DynamicImage,
    mode: ColorMode,
}

impl ImageHandle {
    /// Read and decode the file at `path`. The container is sniffed from the
    /// content, not the extension.
    pub fn open(path: &Path) -> Result<Self, TranscodeError> {
        let data = fs::read(path).map_err(|e| TranscodeError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(&data).map_err(|e| TranscodeError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory(data)?;
        let mode = if is_indexed_png(data) {
            ColorMode::Indexed
        } else {
            ColorMode::from_color_type(image.color())
        };
        Ok(Self { image, mode })
    }

    pub fn from_image(image: DynamicImage) -> Self {
        let mode = ColorMode::from_color_type(image.color());
        Self { image, mode }
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Normalize to opaque 8-bit RGB. Anything carrying alpha is composited
    /// onto white.
    pub fn into_rgb(self) -> RgbImage {
        match self.mode {
            ColorMode::Rgb => self.image.into_rgb8(),
            ColorMode::Indexed | ColorMode::GrayAlpha | ColorMode::Rgba => {
                flatten_on_white(&self.image.to_rgba8())
            }
            ColorMode::Other if self.image.color().has_alpha() => {
                flatten_on_white(&self.image.to_rgba8())
            }
            ColorMode::Other => self.image.into_rgb8(),
        }
    }
}

/// Composite `rgba` over an opaque white canvas of the same size, using the
/// alpha channel as the mask.
pub fn flatten_on_white(rgba: &RgbaImage) -> RgbImage {
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([blend(r, a), blend(g, a), blend(b, a)])
    })
}

#[inline]
fn blend(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}
