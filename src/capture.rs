// src/capture.rs
//! Input capture: photos, free-text prompts and the store selection.

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use image::ImageFormat;
use log::debug;
use reqwest::Url;

use crate::errors::QuanBuyError;
use crate::models::StoreRef;

/// Uploads above this size are rejected before any encoding happens.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// A validated photo ready to be attached to a search.
///
/// Never mutated after construction; a new upload replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    raw: Bytes,
    content_type: String,
    base64: String,
    preview: String,
}

impl Photo {
    /// Validates type and size, then encodes off the async executor.
    pub async fn load(content_type: &str, data: impl Into<Bytes>) -> Result<Self, QuanBuyError> {
        let raw: Bytes = data.into();
        ImageCapture::validate(content_type, raw.len())?;

        let content_type = content_type.to_string();
        tokio::task::spawn_blocking(move || {
            let base64 = general_purpose::STANDARD.encode(&raw);
            let preview = format!("data:{content_type};base64,{base64}");
            Photo {
                raw,
                content_type,
                base64,
                preview,
            }
        })
        .await
        .map_err(|e| QuanBuyError::ImageProcessing(format!("Failed to encode photo: {}", e)))
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// `data:` URI suitable for an inline preview.
    pub fn preview(&self) -> &str {
        &self.preview
    }
}

pub struct ImageCapture;

impl ImageCapture {
    pub fn validate(content_type: &str, size: usize) -> Result<(), QuanBuyError> {
        if !content_type.starts_with("image/") {
            return Err(QuanBuyError::Validation(format!(
                "Please upload an image file (got {})",
                content_type
            )));
        }
        if size > MAX_PHOTO_BYTES {
            return Err(QuanBuyError::Validation(format!(
                "Image is too large: {:.1} MB. Maximum is {} MB",
                size as f64 / (1024.0 * 1024.0),
                MAX_PHOTO_BYTES / 1024 / 1024
            )));
        }
        Ok(())
    }

    /// Derives a MIME type from the file's magic bytes.
    pub fn sniff_content_type(data: &[u8]) -> &'static str {
        match image::guess_format(data) {
            Ok(ImageFormat::Png) => "image/png",
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::Gif) => "image/gif",
            Ok(ImageFormat::WebP) => "image/webp",
            Ok(ImageFormat::Bmp) => "image/bmp",
            Ok(ImageFormat::Tiff) => "image/tiff",
            Ok(ImageFormat::Ico) => "image/x-icon",
            Ok(ImageFormat::Avif) => "image/avif",
            _ => "application/octet-stream",
        }
    }
}

/// Preset stores plus stores added by dropping a link.
#[derive(Debug, Clone, Default)]
pub struct StoreSelection {
    stores: Vec<(StoreRef, bool)>,
}

impl StoreSelection {
    /// All presets start selected.
    pub fn with_presets(presets: impl IntoIterator<Item = StoreRef>) -> Self {
        Self {
            stores: presets.into_iter().map(|s| (s, true)).collect(),
        }
    }

    /// Flips the selection of the named store. Returns the new state, or `None` if unknown.
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let entry = self.stores.iter_mut().find(|(s, _)| s.name == name)?;
        entry.1 = !entry.1;
        Some(entry.1)
    }

    /// Adds a custom store from a dropped URL, keyed by hostname.
    ///
    /// Malformed URLs and hostnames already present are ignored.
    pub fn add_dropped_url(&mut self, text: &str) -> Option<&StoreRef> {
        let url = match Url::parse(text.trim()) {
            Ok(url) => url,
            Err(e) => {
                debug!("Ignoring dropped text {:?}: {}", text, e);
                return None;
            }
        };
        let Some(host) = url.host_str() else {
            debug!("Ignoring dropped URL without a host: {}", url);
            return None;
        };
        let store = StoreRef::new(host, url.origin().ascii_serialization());
        if !self.add(store) {
            return None;
        }
        self.stores.last().map(|(s, _)| s)
    }

    /// Appends a selected store unless its name or hostname is already present.
    pub fn add(&mut self, store: StoreRef) -> bool {
        let host = hostname_of(&store.url);
        let duplicate = self.stores.iter().any(|(s, _)| {
            s.name == store.name || (host.is_some() && hostname_of(&s.url) == host)
        });
        if duplicate {
            return false;
        }
        self.stores.push((store, true));
        true
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.stores.iter().any(|(s, on)| *on && s.name == name)
    }

    pub fn all(&self) -> impl Iterator<Item = &StoreRef> {
        self.stores.iter().map(|(s, _)| s)
    }

    /// Selected stores in insertion order.
    pub fn selected(&self) -> Vec<StoreRef> {
        self.stores
            .iter()
            .filter(|(_, on)| *on)
            .map(|(s, _)| s.clone())
            .collect()
    }
}

fn hostname_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
}

/// Free-text prompt with speech-to-text support.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptInput {
    text: String,
    interim: String,
}

impl PromptInput {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Transcript currently being recognized; not part of the prompt.
    pub fn interim(&self) -> &str {
        &self.interim
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Final segments are appended with a separating space; interim ones are only shown.
    pub fn apply_transcript(&mut self, segment: &str, is_final: bool) {
        if !is_final {
            self.interim = segment.to_string();
            return;
        }
        self.interim.clear();
        let segment = segment.trim();
        if segment.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(segment);
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.interim.clear();
    }
}
