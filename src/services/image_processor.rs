// src/services/image_processor.rs
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, GenericImageView, ImageFormat as ImgFormat};
use log::debug;

use crate::capture::{ImageCapture, MAX_PHOTO_BYTES};
use crate::errors::QuanBuyError;

/// Longest edge sent to the model.
pub const MAX_MODEL_EDGE: u32 = 2048;

/// An image ready to be inlined into a model request.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub content_type: String,
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

pub struct ImageProcessor {
    max_edge: u32,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self {
            max_edge: MAX_MODEL_EDGE,
        }
    }

    /// Decodes a client-supplied base64 payload, validates it and shrinks it if needed.
    pub fn prepare_base64(&self, payload: &str) -> Result<PreparedImage, QuanBuyError> {
        // tolerate a data-URI preview being sent instead of the bare payload
        let payload = match payload.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => payload,
        };
        let data = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| QuanBuyError::Validation(format!("Image is not valid base64: {}", e)))?;
        self.prepare(&data)
    }

    pub fn prepare(&self, data: &[u8]) -> Result<PreparedImage, QuanBuyError> {
        let content_type = ImageCapture::sniff_content_type(data);
        ImageCapture::validate(content_type, data.len())?;

        let img = image::load_from_memory(data)
            .map_err(|e| QuanBuyError::ImageProcessing(format!("Invalid image format: {}", e)))?;
        let (width, height) = img.dimensions();

        if width <= self.max_edge && height <= self.max_edge {
            return Ok(PreparedImage {
                content_type: content_type.to_string(),
                base64: general_purpose::STANDARD.encode(data),
                width,
                height,
            });
        }

        let resized = self.resize(&img)?;
        let (width, height) = (resized.width, resized.height);
        debug!("Resized image to {}x{}", width, height);
        Ok(resized)
    }

    fn resize(&self, img: &DynamicImage) -> Result<PreparedImage, QuanBuyError> {
        let (width, height) = img.dimensions();
        let ratio = (self.max_edge as f32 / width.max(height) as f32).min(1.0);
        let new_width = ((width as f32 * ratio) as u32).max(1);
        let new_height = ((height as f32 * ratio) as u32).max(1);

        // JPEG has no alpha channel
        let resized = DynamicImage::ImageRgb8(
            img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
                .to_rgb8(),
        );

        let mut output = Vec::new();
        resized
            .write_to(&mut std::io::Cursor::new(&mut output), ImgFormat::Jpeg)
            .map_err(|e| {
                QuanBuyError::ImageProcessing(format!("Failed to encode resized image: {}", e))
            })?;

        if output.len() > MAX_PHOTO_BYTES {
            return Err(QuanBuyError::ImageProcessing(
                "Resized image is still too large".to_string(),
            ));
        }

        Ok(PreparedImage {
            content_type: "image/jpeg".to_string(),
            base64: general_purpose::STANDARD.encode(&output),
            width: resized.width(),
            height: resized.height(),
        })
    }
}
