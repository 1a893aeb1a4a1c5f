//! Node kinds and their capabilities.
//!
//! Instead of a class per element type, each node carries a [`NodeKind`]. The
//! kind describes how the node loads, how keyed lookup behaves, which
//! attributes identify it inside its parent, which artwork it exposes and how
//! it treats its own children. Kinds also declare the registry claims that
//! route elements to them.

use crate::registry::{Claim, Table};
use crate::xml::Element;

/// Where a node's contents come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// GET the node's endpoint; container children become node children.
    Fetch,
    /// GET the node's endpoint; the container's first child is the node itself.
    SelfLoading,
    /// Contents come from the element the parent already parsed.
    Embedded,
}

/// Order in which `get` consults children and attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOrder {
    /// Children by identity, then attributes. One match yields a single node.
    ChildrenFirst,
    /// Attributes, then every child by identity, always as a collection.
    AttributesFirst,
    /// Children by ordinal or server name, then attributes.
    Servers,
}

/// How a node is indexed inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Values of these attributes, skipping values containing `/` or `?`.
    Attributes(&'static [&'static str]),
    /// The element's tag name.
    Tag,
}

/// Artwork attributes a node can expose as [`ImageRef`](crate::ImageRef)s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Thumb,
    Art,
}

impl ImageSlot {
    pub fn attr(self) -> &'static str {
        match self {
            ImageSlot::Thumb => "thumb",
            ImageSlot::Art => "art",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ImageSlot::Thumb => 0,
            ImageSlot::Art => 1,
        }
    }
}

/// Everything a node needs to know about its own behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub load: LoadStrategy,
    pub lookup: LookupOrder,
    pub identity: Identity,
    /// Namespace used to dispatch this node's children.
    pub table: Table,
    /// Kind given to children no claim matches.
    pub default_child: NodeKind,
    pub images: &'static [ImageSlot],
    /// Attribute holding the node's canonical scalar.
    pub value_attr: &'static str,
}

const DIRECTORY_IDENTITY: Identity = Identity::Attributes(&["key", "type", "title"]);
const SEASON_IDENTITY: Identity = Identity::Attributes(&["key", "type", "title", "index"]);
const SERVER_IDENTITY: Identity = Identity::Attributes(&["name", "machineIdentifier"]);

/// Every kind of node in the catalog graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The server root.
    Root,
    /// Any fetched listing without a more specific kind.
    Directory,
    MovieDirectory,
    ShowDirectory,
    Season,
    MusicDirectory,
    /// A movie or episode; loads its own detail document.
    Video,
    /// The `servers` listing.
    ServerList,
    /// One entry of the servers listing.
    Server,
    Media,
    Part,
    Stream,
    Genre,
    Role,
    Director,
    Writer,
    Producer,
    Collection,
    /// Any embedded element without a more specific kind.
    Data,
}

impl NodeKind {
    pub const ALL: [NodeKind; 19] = [
        NodeKind::Root,
        NodeKind::Directory,
        NodeKind::MovieDirectory,
        NodeKind::ShowDirectory,
        NodeKind::Season,
        NodeKind::MusicDirectory,
        NodeKind::Video,
        NodeKind::ServerList,
        NodeKind::Server,
        NodeKind::Media,
        NodeKind::Part,
        NodeKind::Stream,
        NodeKind::Genre,
        NodeKind::Role,
        NodeKind::Director,
        NodeKind::Writer,
        NodeKind::Producer,
        NodeKind::Collection,
        NodeKind::Data,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Directory => "Directory",
            NodeKind::MovieDirectory => "MovieDirectory",
            NodeKind::ShowDirectory => "ShowDirectory",
            NodeKind::Season => "Season",
            NodeKind::MusicDirectory => "MusicDirectory",
            NodeKind::Video => "Video",
            NodeKind::ServerList => "ServerList",
            NodeKind::Server => "Server",
            NodeKind::Media => "Media",
            NodeKind::Part => "Part",
            NodeKind::Stream => "Stream",
            NodeKind::Genre => "Genre",
            NodeKind::Role => "Role",
            NodeKind::Director => "Director",
            NodeKind::Writer => "Writer",
            NodeKind::Producer => "Producer",
            NodeKind::Collection => "Collection",
            NodeKind::Data => "Data",
        }
    }

    /// Registrations this kind makes in the standard registry.
    pub fn claims(self) -> &'static [Claim] {
        match self {
            NodeKind::Video => &[Claim::Tag(Table::Directory, "Video")],
            NodeKind::Media => &[
                Claim::Tag(Table::Directory, "Media"),
                Claim::Tag(Table::Data, "Media"),
            ],
            NodeKind::Part => &[Claim::Tag(Table::Data, "Part")],
            NodeKind::Stream => &[Claim::Tag(Table::Data, "Stream")],
            NodeKind::Genre => &[Claim::Tag(Table::Directory, "Genre")],
            NodeKind::Role => &[Claim::Tag(Table::Directory, "Role")],
            NodeKind::Director => &[Claim::Tag(Table::Directory, "Director")],
            NodeKind::Writer => &[Claim::Tag(Table::Directory, "Writer")],
            NodeKind::Producer => &[Claim::Tag(Table::Directory, "Producer")],
            NodeKind::Collection => &[Claim::Tag(Table::Directory, "Collection")],
            NodeKind::MovieDirectory => &[Claim::TagType(Table::Directory, "Directory", "movie")],
            NodeKind::ShowDirectory => &[Claim::TagType(Table::Directory, "Directory", "show")],
            NodeKind::MusicDirectory => &[Claim::TagType(Table::Directory, "Directory", "artist")],
            NodeKind::ServerList => &[Claim::Path("servers")],
            NodeKind::Server => &[Claim::Tag(Table::Directory, "Server")],
            // Seasons are reached through the show normalisation hook.
            NodeKind::Root | NodeKind::Directory | NodeKind::Season | NodeKind::Data => &[],
        }
    }

    pub fn capabilities(self) -> Capabilities {
        let directory = Capabilities {
            load: LoadStrategy::Fetch,
            lookup: LookupOrder::ChildrenFirst,
            identity: DIRECTORY_IDENTITY,
            table: Table::Directory,
            default_child: NodeKind::Directory,
            images: &[],
            value_attr: "title",
        };
        let data = Capabilities {
            load: LoadStrategy::Embedded,
            lookup: LookupOrder::AttributesFirst,
            identity: Identity::Tag,
            table: Table::Data,
            default_child: NodeKind::Data,
            images: &[],
            value_attr: "tag",
        };

        match self {
            NodeKind::Root
            | NodeKind::Directory
            | NodeKind::MovieDirectory
            | NodeKind::ShowDirectory
            | NodeKind::MusicDirectory => directory,
            NodeKind::Season => Capabilities {
                identity: SEASON_IDENTITY,
                ..directory
            },
            NodeKind::Video => Capabilities {
                load: LoadStrategy::SelfLoading,
                lookup: LookupOrder::AttributesFirst,
                images: &[ImageSlot::Thumb, ImageSlot::Art],
                ..directory
            },
            NodeKind::ServerList => Capabilities {
                lookup: LookupOrder::Servers,
                default_child: NodeKind::Server,
                ..directory
            },
            NodeKind::Server => Capabilities {
                identity: SERVER_IDENTITY,
                value_attr: "name",
                ..data
            },
            NodeKind::Role => Capabilities {
                images: &[ImageSlot::Thumb],
                ..data
            },
            NodeKind::Part => Capabilities {
                value_attr: "file",
                ..data
            },
            NodeKind::Media
            | NodeKind::Stream
            | NodeKind::Genre
            | NodeKind::Director
            | NodeKind::Writer
            | NodeKind::Producer
            | NodeKind::Collection
            | NodeKind::Data => data,
        }
    }

    /// Whether nodes of this kind are built from their parent's response.
    pub fn is_embedded(self) -> bool {
        self.capabilities().load == LoadStrategy::Embedded
    }

    /// Hook run on every child element before dispatch.
    ///
    /// `view_group` is the loaded node's `viewGroup` attribute. The hook may
    /// rewrite the element and may force the child's kind, bypassing the
    /// registry.
    pub fn normalize_child(self, view_group: Option<&str>, child: &mut Element) -> Option<NodeKind> {
        match self {
            NodeKind::ShowDirectory | NodeKind::Season if view_group == Some("season") => {
                // "All episodes" entries carry no index.
                if child.attr("index").is_none() {
                    child.set_attr("index", "-1");
                }
                Some(NodeKind::Season)
            }
            _ => None,
        }
    }

    /// Identity keys of a child element of this kind.
    pub fn identities<'a>(self, element: &'a Element) -> Vec<&'a str> {
        match self.capabilities().identity {
            Identity::Tag => vec![element.tag()],
            Identity::Attributes(names) => names
                .iter()
                .filter_map(|name| element.attr(name))
                .filter(|value| !value.is_empty() && !value.contains('/') && !value.contains('?'))
                .collect(),
        }
    }
}
