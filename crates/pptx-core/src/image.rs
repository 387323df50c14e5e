//! Picture sources and aspect-fit placement

use crate::shape::Frame;
use crate::{PptxError, Result};
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;

impl From<image::ImageError> for PptxError {
    fn from(err: image::ImageError) -> Self {
        PptxError::ImageError(err.to_string())
    }
}

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// Extension used for the media part
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }
}

/// Detect image format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(ImageFormat::Jpeg);
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(ImageFormat::Png);
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Ok(ImageFormat::Gif);
    }
    if data.starts_with(b"BM") {
        return Ok(ImageFormat::Bmp);
    }

    Err(PptxError::ImageError("Unknown image format".to_string()))
}

/// An image file read into memory
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub format: ImageFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageSource {
    /// Read an image file and its pixel dimensions
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PptxError::ImageError(format!(
                "Image file not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = detect_format(&data)?;
        let (width, height) = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()?
            .into_dimensions()?;
        if width == 0 || height == 0 {
            return Err(PptxError::ImageError("Image has zero size".to_string()));
        }

        Ok(Self {
            format,
            width,
            height,
            data,
        })
    }
}

/// Fit an image inside a frame, preserving aspect ratio, centred
///
/// Wider images span the frame width, taller images the frame height.
/// Offsets and extents are truncated to whole EMU.
pub fn fit_centered(frame: Frame, image_width: u32, image_height: u32) -> Frame {
    let (fw, fh) = (frame.cx as f64, frame.cy as f64);
    if fw <= 0.0 || fh <= 0.0 || image_width == 0 || image_height == 0 {
        return frame;
    }

    let frame_ratio = fw / fh;
    let image_ratio = image_width as f64 / image_height as f64;

    let (w, h) = if image_ratio >= frame_ratio {
        (fw, fw / image_ratio)
    } else {
        (fh * image_ratio, fh)
    };

    Frame {
        x: (frame.x as f64 + (fw - w) / 2.0) as i64,
        y: (frame.y as f64 + (fh - h) / 2.0) as i64,
        cx: w as i64,
        cy: h as i64,
    }
}
