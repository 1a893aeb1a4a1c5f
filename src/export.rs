//! The values an export template is rendered with.

use plex_catalog::{Error as CatalogError, Node};
use serde::Serialize;

/// Version reported to templates.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Unable to access plex at {url}")]
    Unreachable {
        url: String,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Entry points into the graph handed to a template.
#[derive(Debug)]
pub struct ExportContext<'a> {
    /// The server root.
    pub server: &'a Node,
    pub library: &'a Node,
    /// The servers-listing entry describing the server being exported.
    pub current_server: Option<&'a Node>,
    pub version: &'static str,
}

impl<'a> ExportContext<'a> {
    /// Load the root and resolve the well-known entry points.
    pub fn prepare(root: &'a Node) -> Result<Self, ExportError> {
        root.load().map_err(|source| ExportError::Unreachable {
            url: root.endpoint().redacted(),
            source,
        })?;

        let library = root
            .get("library")?
            .first_node()
            .ok_or_else(|| CatalogError::missing_attribute("library"))?;

        let current_server = match (root.lookup("servers")?, root.attr("machineIdentifier")?) {
            (Some(servers), Some(machine_id)) => match servers.first_node() {
                Some(servers) => servers.from_machine_id(machine_id)?,
                None => None,
            },
            _ => None,
        };
        if current_server.is_none() {
            tracing::debug!("Server listing has no entry for this server");
        }

        Ok(Self {
            server: root,
            library,
            current_server,
            version: VERSION,
        })
    }

    pub fn summary(&self) -> Result<ServerSummary, ExportError> {
        let current_server = match self.current_server {
            Some(server) => server.value()?.map(str::to_string),
            None => None,
        };
        Ok(ServerSummary {
            name: self.server.attr("friendlyName")?.map(str::to_string),
            version: self.server.attr("version")?.map(str::to_string),
            machine_identifier: self.server.attr("machineIdentifier")?.map(str::to_string),
            library_entries: self.library.len()?,
            current_server,
            exporter_version: self.version.to_string(),
        })
    }
}

/// Printable facts about the exported server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSummary {
    pub name: Option<String>,
    pub version: Option<String>,
    pub machine_identifier: Option<String>,
    pub library_entries: usize,
    pub current_server: Option<String>,
    pub exporter_version: String,
}
