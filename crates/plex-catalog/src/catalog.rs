//! Entry point: owns the registry, the transport and the default headers,
//! and hands out root nodes.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::fetch::{default_headers, Fetch, HttpFetcher, DEFAULT_TIMEOUT};
use crate::node::Node;
use crate::registry::TypeRegistry;

/// State shared by every node of one catalog.
pub(crate) struct Shared {
    pub registry: Arc<TypeRegistry>,
    pub fetcher: Arc<dyn Fetch>,
}

/// A configured view onto one or more servers.
///
/// ```rust,ignore
/// use plex_catalog::Catalog;
///
/// let catalog = Catalog::new();
/// let root = catalog.root("http://localhost:32400/?X-Plex-Token=abc")?;
/// let library = root.get("library")?;
/// ```
#[derive(Clone)]
pub struct Catalog {
    shared: Arc<Shared>,
    headers: Arc<HeaderMap>,
}

impl Catalog {
    /// Standard registry, HTTP transport with the default timeout, default headers.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Create the (unloaded) root node for a server URL. No request is made.
    pub fn root(&self, url: &str) -> Result<Node> {
        let endpoint = Endpoint::parse(url)?;
        tracing::debug!("Opening catalog root at {}", endpoint);
        Ok(Node::root(endpoint, self.shared.clone(), self.headers.clone()))
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.shared.registry
    }

    /// Headers sent by root nodes of this catalog.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Catalog`].
pub struct CatalogBuilder {
    registry: Option<Arc<TypeRegistry>>,
    fetcher: Option<Arc<dyn Fetch>>,
    headers: Option<HeaderMap>,
    timeout: Duration,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self {
            registry: None,
            fetcher: None,
            headers: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CatalogBuilder {
    /// Use a custom dispatch table instead of [`TypeRegistry::standard`].
    pub fn registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use a custom transport. The timeout setting is then ignored.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the default device header with these headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Catalog {
        let timeout = self.timeout;
        let shared = Shared {
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(TypeRegistry::standard())),
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Arc::new(HttpFetcher::new(timeout))),
        };
        Catalog {
            shared: Arc::new(shared),
            headers: Arc::new(self.headers.unwrap_or_else(default_headers)),
        }
    }
}
