//! # Image Loading and Decoding
//!
//! Photos and signatures arrive inside the JSON payload as base64 or
//! `data:image/...;base64,` URIs. Whether a payload holds a JPEG, a PNG or
//! nothing usable is decided once, while the input is deserialized, and
//! recorded as an [`ImageAsset`]. Decoding for the PDF happens at draw time.
//!
//! JPEG images pass through without re-encoding (DCTDecode). PNG images are
//! decoded to RGB pixels with a separate alpha channel for SMask
//! transparency.

use std::io::Cursor;

use base64::Engine;
use serde::{Deserialize, Deserializer};

use crate::error::RenderError;

/// An image payload sniffed from its magic bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageAsset {
    Jpeg(Vec<u8>),
    Png(Vec<u8>),
    #[default]
    None,
}

impl ImageAsset {
    /// Interpret a payload string. Anything that isn't a decodable JPEG or
    /// PNG payload becomes [`ImageAsset::None`].
    pub fn from_source(src: &str) -> Self {
        let src = src.trim();
        if src.is_empty() {
            return ImageAsset::None;
        }
        match read_source_bytes(src) {
            Ok(bytes) => Self::from_bytes(bytes),
            Err(e) => {
                log::warn!("ignoring image payload: {}", e);
                ImageAsset::None
            }
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        if is_jpeg(&bytes) {
            ImageAsset::Jpeg(bytes)
        } else if is_png(&bytes) {
            ImageAsset::Png(bytes)
        } else {
            log::warn!("ignoring image payload: unsupported format (expected JPEG or PNG)");
            ImageAsset::None
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ImageAsset::None)
    }

    /// Decode for embedding. `ImageAsset::None` yields `Ok(None)`.
    pub fn decode(&self) -> Result<Option<LoadedImage>, RenderError> {
        match self {
            ImageAsset::Jpeg(data) => decode_jpeg(data).map(Some),
            ImageAsset::Png(data) => decode_png(data).map(Some),
            ImageAsset::None => Ok(None),
        }
    }

    /// Decode, logging and dropping the image on failure. A broken photo
    /// never fails the document.
    pub fn load_or_skip(&self, what: &str) -> Option<LoadedImage> {
        match self.decode() {
            Ok(image) => image,
            Err(e) => {
                log::warn!("omitting {}: {}", what, e);
                None
            }
        }
    }
}

impl<'de> Deserialize<'de> for ImageAsset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let src = Option::<String>::deserialize(deserializer)?;
        Ok(src.as_deref().map(ImageAsset::from_source).unwrap_or_default())
    }
}

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
    DeviceCMYK,
}

impl JpegColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            JpegColorSpace::DeviceRGB => "/DeviceRGB",
            JpegColorSpace::DeviceGray => "/DeviceGray",
            JpegColorSpace::DeviceCMYK => "/DeviceCMYK",
        }
    }
}

/// Resolve a payload string to raw bytes. Accepts data URIs and bare base64.
fn read_source_bytes(src: &str) -> Result<Vec<u8>, RenderError> {
    let b64 = if src.starts_with("data:") {
        let comma = src
            .find(',')
            .ok_or_else(|| RenderError::Image("invalid data URI: missing comma".to_string()))?;
        if !src[..comma].ends_with(";base64") {
            return Err(RenderError::Image(
                "data URI is not base64-encoded".to_string(),
            ));
        }
        &src[comma + 1..]
    } else {
        src
    };

    // Payloads copied from browsers sometimes carry line breaks.
    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| RenderError::Image(format!("base64 decode error: {}", e)))
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 8 && data[..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
}

/// JPEG: read dimensions and color space without decoding pixels.
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, RenderError> {
    let (width, height) = image::io::Reader::with_format(Cursor::new(data), image::ImageFormat::Jpeg)
        .into_dimensions()
        .map_err(|e| RenderError::Image(format!("failed to read JPEG dimensions: {}", e)))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: detect_jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Scan JPEG markers for the SOF segment and read its component count.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // skip SOI
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            return match data[i + 9] {
                1 => JpegColorSpace::DeviceGray,
                4 => JpegColorSpace::DeviceCMYK,
                _ => JpegColorSpace::DeviceRGB,
            };
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    JpegColorSpace::DeviceRGB
}

/// PNG: decode to RGBA, split into RGB + alpha.
fn decode_png(data: &[u8]) -> Result<LoadedImage, RenderError> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| RenderError::Image(format!("failed to decode PNG: {}", e)))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
        has_transparency |= pixel[3] != 255;
    }

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: has_transparency.then_some(alpha),
        },
        width_px: width,
        height_px: height,
    })
}
