//! Lazily fetched artwork.
//!
//! Artwork is best effort: a failed download never raises, it just leaves the
//! image empty.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use image::ImageFormat;
use once_cell::sync::OnceCell;
use reqwest::header::HeaderMap;
use url::Url;

use crate::endpoint::{redact, Endpoint};
use crate::error::Result;
use crate::fetch::Fetch;

struct ImageData {
    bytes: Bytes,
    format: Option<ImageFormat>,
}

/// A possibly remote image, downloaded at most once.
pub struct ImageRef {
    reference: String,
    url: Url,
    headers: Arc<HeaderMap>,
    fetcher: Arc<dyn Fetch>,
    data: OnceCell<Option<ImageData>>,
}

impl ImageRef {
    /// Resolve `reference` (an artwork attribute value) against the owning
    /// node's endpoint.
    ///
    /// Absolute URLs on another host are used as-is. Anything else is joined
    /// against the owner's host with only the token kept from its query.
    pub fn resolve(
        owner: &Endpoint,
        reference: &str,
        headers: Arc<HeaderMap>,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<Self> {
        let url = match Url::parse(reference) {
            Ok(absolute) if !same_origin(&absolute, owner.url()) => absolute,
            _ => owner.resource(reference)?,
        };

        Ok(Self {
            reference: reference.to_string(),
            url,
            headers,
            fetcher,
            data: OnceCell::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The attribute value this image was built from.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Image bytes, or `None` if the download did not succeed.
    pub fn data(&self) -> Option<&[u8]> {
        self.loaded().map(|image| image.bytes.as_ref())
    }

    /// Format sniffed from the downloaded bytes.
    pub fn format(&self) -> Option<ImageFormat> {
        self.loaded().and_then(|image| image.format)
    }

    /// A `data:` URI embedding the image, or `None` without data.
    pub fn base64_encoded(&self) -> Option<String> {
        let image = self.loaded()?;
        if image.bytes.is_empty() {
            return None;
        }
        let mime = image
            .format
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");
        Some(format!("data:{};base64,{}", mime, STANDARD.encode(&image.bytes)))
    }

    fn loaded(&self) -> Option<&ImageData> {
        self.data.get_or_init(|| self.download()).as_ref()
    }

    fn download(&self) -> Option<ImageData> {
        match self.fetcher.fetch(&self.url, &self.headers) {
            Ok(response) if response.status == 200 => {
                let format = image::guess_format(&response.body).ok();
                tracing::debug!(
                    "Fetched image {} ({} bytes, {:?})",
                    redact(&self.url),
                    response.body.len(),
                    format
                );
                Some(ImageData {
                    bytes: response.body,
                    format,
                })
            }
            Ok(response) => {
                tracing::debug!(
                    "Image {} unavailable: HTTP {}",
                    redact(&self.url),
                    response.status
                );
                None
            }
            Err(e) => {
                tracing::warn!("Failed to fetch image {}: {}", redact(&self.url), e);
                None
            }
        }
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImageRef").field(&self.reference).finish()
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}
