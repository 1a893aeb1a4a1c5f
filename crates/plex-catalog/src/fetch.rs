//! HTTP transport used by nodes and images.
//!
//! [`Fetch`] is the seam between the catalog and the network. The production
//! implementation is [`HttpFetcher`], a blocking reqwest client; tests swap in
//! an in-memory double.

use std::time::Duration;

use bytes::Bytes;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::{Error, Result};

/// Default timeout for catalog requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest timeout the transport honours; longer values are clamped.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Header identifying this client to the server.
pub const DEVICE_HEADER: &str = "X-Plex-Device-Name";

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one blocking GET.
///
/// Implementations report transport failures as errors and every HTTP status,
/// including 4xx and 5xx, as a [`FetchResponse`].
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<FetchResponse>;
}

/// Blocking reqwest client with a request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(bounded_timeout(timeout))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self { client }
    }
}

fn bounded_timeout(timeout: Duration) -> Duration {
    if timeout > MAX_TIMEOUT {
        tracing::warn!("Timeout of {:?} clamped to {:?}", timeout, MAX_TIMEOUT);
    }
    timeout.min(MAX_TIMEOUT)
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?;
        Ok(FetchResponse { status, body })
    }
}

/// Headers sent when the caller supplies none: the device header carrying
/// the crate version.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = format!("plex-export {}", env!("CARGO_PKG_VERSION"));
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(HeaderName::from_static("x-plex-device-name"), value);
    }
    headers
}

/// Build a header map from name/value pairs.
pub fn header_map<I, K, V>(pairs: I) -> Result<HeaderMap>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("{}: {}", name.as_ref(), e)))?;
        let value = HeaderValue::from_str(value.as_ref())
            .map_err(|e| Error::InvalidHeader(format!("{}: {}", name, e)))?;
        headers.append(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_identify_device() {
        let headers = default_headers();
        let value = headers.get(DEVICE_HEADER).unwrap().to_str().unwrap();
        assert!(value.starts_with("plex-export "));
        assert!(value.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_header_map() {
        let headers = header_map([("X-Plex-Product", "exporter"), ("Accept", "text/xml")]).unwrap();
        assert_eq!(headers.get("x-plex-product").unwrap(), "exporter");
        assert_eq!(headers.get("accept").unwrap(), "text/xml");
    }

    #[test]
    fn test_header_map_rejects_bad_names() {
        let err = header_map([("bad header", "x")]).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_timeout_is_bounded() {
        assert_eq!(bounded_timeout(Duration::from_secs(5)), Duration::from_secs(5));
        assert_eq!(bounded_timeout(Duration::from_secs(u64::MAX)), MAX_TIMEOUT);
        assert_eq!(bounded_timeout(Duration::MAX), MAX_TIMEOUT);
    }

    #[test]
    fn test_response_success_range() {
        let ok = FetchResponse {
            status: 204,
            body: Bytes::new(),
        };
        let missing = FetchResponse {
            status: 404,
            body: Bytes::new(),
        };
        assert!(ok.is_success());
        assert!(!missing.is_success());
    }
}
