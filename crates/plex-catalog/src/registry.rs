//! Type registry: which [`NodeKind`] interprets which element.
//!
//! The registry is an immutable table built once, normally by
//! [`TypeRegistry::standard`], which collects the claims every kind declares
//! for itself. It is shared by `Arc` with every node so dispatch never touches
//! global state.
//!
//! Resolution order for an element is fixed:
//!
//! 1. a claim on the child's composed key path,
//! 2. a claim on the element's tag plus its `type` attribute,
//! 3. a claim on the tag alone,
//! 4. the fallback supplied by the enclosing node.

use std::collections::HashMap;

use crate::kind::NodeKind;

/// The two dispatch namespaces. Children of fetched nodes are resolved in the
/// directory table, children of embedded data nodes in the smaller data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Directory,
    Data,
}

/// A single registration a kind makes for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Every element with this tag.
    Tag(Table, &'static str),
    /// Elements with this tag and this `type` attribute.
    TagType(Table, &'static str, &'static str),
    /// The child whose composed path is exactly this (slashes ignored).
    Path(&'static str),
}

#[derive(Debug, Default)]
struct TagTable {
    tags: HashMap<String, NodeKind>,
    typed: HashMap<(String, String), NodeKind>,
}

impl TagTable {
    fn resolve(&self, tag: &str, type_attr: Option<&str>) -> Option<NodeKind> {
        if let Some(type_attr) = type_attr {
            if let Some(kind) = self.typed.get(&(tag.to_string(), type_attr.to_string())) {
                return Some(*kind);
            }
        }
        self.tags.get(tag).copied()
    }
}

/// Immutable mapping from wire tags, types and paths to node kinds.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    directory: TagTable,
    data: TagTable,
    paths: HashMap<String, NodeKind>,
}

impl TypeRegistry {
    /// The registry populated from every kind's own [`NodeKind::claims`].
    pub fn standard() -> Self {
        let mut builder = Self::builder();
        for kind in NodeKind::ALL {
            for claim in kind.claims() {
                builder = builder.claim(*claim, kind);
            }
        }
        builder.build()
    }

    /// Start an empty registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            registry: TypeRegistry::default(),
        }
    }

    /// Pick the kind for an element.
    ///
    /// `path` is the child's composed endpoint path, if it has its own
    /// endpoint. The result depends only on the arguments and the table.
    pub fn resolve(
        &self,
        table: Table,
        tag: &str,
        type_attr: Option<&str>,
        path: Option<&str>,
        fallback: NodeKind,
    ) -> NodeKind {
        if let Some(kind) = path.and_then(|path| self.paths.get(normalize_path(path))) {
            return *kind;
        }
        self.table(table)
            .resolve(tag, type_attr)
            .unwrap_or(fallback)
    }

    /// Tag-only lookup, used for `viewGroup` hints on containers.
    pub fn tag(&self, table: Table, tag: &str) -> Option<NodeKind> {
        self.table(table).tags.get(tag).copied()
    }

    fn table(&self, table: Table) -> &TagTable {
        match table {
            Table::Directory => &self.directory,
            Table::Data => &self.data,
        }
    }
}

/// Collects claims before freezing them into a [`TypeRegistry`].
///
/// A later claim on the same tag, tag/type pair or path replaces the earlier one.
#[derive(Debug)]
pub struct RegistryBuilder {
    registry: TypeRegistry,
}

impl RegistryBuilder {
    pub fn tag(mut self, table: Table, tag: &str, kind: NodeKind) -> Self {
        self.table_mut(table).tags.insert(tag.to_string(), kind);
        self
    }

    pub fn typed(mut self, table: Table, tag: &str, type_attr: &str, kind: NodeKind) -> Self {
        self.table_mut(table)
            .typed
            .insert((tag.to_string(), type_attr.to_string()), kind);
        self
    }

    pub fn path(mut self, path: &str, kind: NodeKind) -> Self {
        self.registry
            .paths
            .insert(normalize_path(path).to_string(), kind);
        self
    }

    pub fn claim(self, claim: Claim, kind: NodeKind) -> Self {
        match claim {
            Claim::Tag(table, tag) => self.tag(table, tag, kind),
            Claim::TagType(table, tag, type_attr) => self.typed(table, tag, type_attr, kind),
            Claim::Path(path) => self.path(path, kind),
        }
    }

    pub fn build(self) -> TypeRegistry {
        self.registry
    }

    fn table_mut(&mut self, table: Table) -> &mut TagTable {
        match table {
            Table::Directory => &mut self.registry.directory,
            Table::Data => &mut self.registry.data,
        }
    }
}

fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}
