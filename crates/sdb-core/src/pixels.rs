use std::path::Path;
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// Fixed square resolution the engine renders at
pub const OUTPUT_SIZE: u32 = 512;

/// 3-channel 8-bit image in the engine's native BGR order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgrImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl BgrImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(Error::Engine(format!(
                "BGR buffer for {}x{} must hold {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn from_rgb(rgb: &RgbImage) -> Self {
        let data = rgb
            .pixels()
            .flat_map(|p| [p[2], p[1], p[0]])
            .collect();
        Self { width: rgb.width(), height: rgb.height(), data }
    }

    /// Reorder channels for display and encoding
    pub fn to_rgb(&self) -> Result<RgbImage> {
        let data = self
            .data
            .chunks_exact(3)
            .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]])
            .collect();
        RgbImage::from_raw(self.width, self.height, data).ok_or_else(|| {
            Error::Engine(format!(
                "BGR buffer of {} bytes does not fit {}x{}",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }
}

/// Single-channel mask; non-zero pixels are regenerated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl From<GrayImage> for MaskImage {
    fn from(gray: GrayImage) -> Self {
        Self {
            width: gray.width(),
            height: gray.height(),
            data: gray.into_raw(),
        }
    }
}

/// Decode any supported image file into BGR
pub fn decode_bgr(path: &Path) -> Result<BgrImage> {
    let img = image::open(path).map_err(|e| Error::input(path, e))?;
    Ok(BgrImage::from_rgb(&img.to_rgb8()))
}

/// Decode any supported image file as a single luma channel
pub fn decode_mask(path: &Path) -> Result<MaskImage> {
    let img = image::open(path).map_err(|e| Error::input(path, e))?;
    Ok(MaskImage::from(img.to_luma8()))
}
