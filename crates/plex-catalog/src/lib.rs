//! plex-catalog - lazily loaded object graph over a Plex Media Server catalog.
//!
//! A [`Catalog`] hands out a root [`Node`] for a server URL. Nodes fetch their
//! XML on first access, turn each child element into a child node whose
//! [`NodeKind`] is picked by the [`TypeRegistry`], and answer keyed lookups
//! over children and attributes.
//!
//! ```rust,ignore
//! use plex_catalog::Catalog;
//!
//! let root = Catalog::new().root("http://localhost:32400/?X-Plex-Token=abc")?;
//! println!("{:?}", root.attr("friendlyName")?);
//! for child in root.iter()? {
//!     println!("{} {:?}", child.kind().name(), child.identities());
//! }
//! ```

pub mod catalog;
pub mod endpoint;
pub mod error;
pub mod fetch;
pub mod image;
pub mod kind;
pub mod node;
pub mod registry;
pub mod xml;

#[cfg(test)]
mod testing;

pub use catalog::{Catalog, CatalogBuilder};
pub use endpoint::{Endpoint, TOKEN_PARAM};
pub use error::{Error, Result};
pub use fetch::{
    default_headers, header_map, Fetch, FetchResponse, HttpFetcher, DEFAULT_TIMEOUT, MAX_TIMEOUT,
};
pub use image::ImageRef;
pub use kind::{Capabilities, Identity, ImageSlot, LoadStrategy, LookupOrder, NodeKind};
pub use node::{Node, Value};
pub use registry::{Claim, RegistryBuilder, Table, TypeRegistry};
pub use xml::Element;
