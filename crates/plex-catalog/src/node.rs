//! Lazily loaded catalog nodes.
//!
//! A [`Node`] is created cheaply, without I/O, either as a catalog root or by
//! its parent while the parent loads. Its contents (attribute map, ordered
//! children and the lookup index over them) are produced exactly once, on
//! first demand:
//!
//! - fetched kinds GET their endpoint and turn every element under the
//!   response container into a child;
//! - self-loading kinds (videos) GET their endpoint and treat the container's
//!   first element as themselves;
//! - embedded kinds build their contents from the element their parent
//!   already parsed, at construction time.
//!
//! The outcome of the first load, including a failure, is kept for the
//! lifetime of the node.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rayon::prelude::*;
use reqwest::header::HeaderMap;
use url::form_urlencoded;

use crate::catalog::Shared;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::image::ImageRef;
use crate::kind::{ImageSlot, LoadStrategy, LookupOrder, NodeKind};
use crate::xml::{self, Element};

/// Result of a keyed lookup.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// A scalar attribute.
    Text(&'a str),
    /// Exactly one child.
    Node(&'a Node),
    /// Several children sharing the key, in document order.
    Nodes(Vec<&'a Node>),
}

impl<'a> Value<'a> {
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&'a Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The first node of a node or collection value.
    pub fn first_node(&self) -> Option<&'a Node> {
        match self {
            Value::Node(node) => Some(node),
            Value::Nodes(nodes) => nodes.first().copied(),
            Value::Text(_) => None,
        }
    }

    /// All nodes of the value; empty for text.
    pub fn nodes(&self) -> Vec<&'a Node> {
        match self {
            Value::Node(node) => vec![*node],
            Value::Nodes(nodes) => nodes.clone(),
            Value::Text(_) => Vec::new(),
        }
    }
}

struct Contents {
    attributes: BTreeMap<String, String>,
    children: Vec<Node>,
    index: HashMap<String, Vec<usize>>,
}

impl Contents {
    fn matching(&self, key: &str) -> Vec<&Node> {
        self.index
            .get(key)
            .map(|positions| positions.iter().map(|&i| &self.children[i]).collect())
            .unwrap_or_default()
    }

    fn by_identity(&self, key: &str) -> Option<Value<'_>> {
        let mut nodes = self.matching(key);
        match nodes.len() {
            0 => None,
            1 => nodes.pop().map(Value::Node),
            _ => Some(Value::Nodes(nodes)),
        }
    }

    fn all_by_identity(&self, key: &str) -> Option<Value<'_>> {
        let nodes = self.matching(key);
        (!nodes.is_empty()).then_some(Value::Nodes(nodes))
    }

    fn by_ordinal_or_name(&self, key: &str) -> Option<Value<'_>> {
        if let Ok(position) = key.parse::<usize>() {
            return self.children.get(position).map(Value::Node);
        }
        self.children
            .iter()
            .find(|child| child.element_attr("name") == Some(key))
            .map(Value::Node)
    }

    fn attribute(&self, key: &str) -> Option<Value<'_>> {
        self.attributes.get(key).map(|value| Value::Text(value.as_str()))
    }
}

/// One node of the catalog graph.
pub struct Node {
    kind: NodeKind,
    endpoint: Endpoint,
    element: Option<Element>,
    headers: Arc<HeaderMap>,
    header_override: OnceCell<Arc<HeaderMap>>,
    shared: Arc<Shared>,
    contents: OnceCell<Result<Contents>>,
    images: [OnceCell<Option<ImageRef>>; 2],
}

impl Node {
    pub(crate) fn root(endpoint: Endpoint, shared: Arc<Shared>, headers: Arc<HeaderMap>) -> Self {
        Self {
            kind: NodeKind::Root,
            endpoint,
            element: None,
            headers,
            header_override: OnceCell::new(),
            shared,
            contents: OnceCell::new(),
            images: Default::default(),
        }
    }

    fn new(
        kind: NodeKind,
        endpoint: Endpoint,
        element: Element,
        headers: Arc<HeaderMap>,
        shared: Arc<Shared>,
    ) -> Self {
        let node = Self {
            kind,
            endpoint,
            element: Some(element),
            headers,
            header_override: OnceCell::new(),
            shared,
            contents: OnceCell::new(),
            images: Default::default(),
        };
        if kind.is_embedded() {
            let contents = node.embedded_contents();
            // The cell was created just above.
            let _ = node.contents.set(contents);
        }
        node
    }

    /// Replace the headers this node, and children it creates, send.
    ///
    /// Has no effect on a fetch that already happened.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Arc::new(headers);
        self.header_override = OnceCell::new();
        self
    }

    /// Like [`Node::with_headers`] for a node held by reference, such as a
    /// child borrowed from its parent.
    ///
    /// Only an unloaded node accepts headers, and only once. Returns `false`
    /// and keeps the current headers otherwise.
    pub fn set_headers(&self, headers: HeaderMap) -> bool {
        if self.is_loaded() {
            return false;
        }
        self.header_override.set(Arc::new(headers)).is_ok()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn headers(&self) -> &HeaderMap {
        self.shared_headers()
    }

    fn shared_headers(&self) -> &Arc<HeaderMap> {
        self.header_override.get().unwrap_or(&self.headers)
    }

    /// The element this node was created from; `None` for the root.
    pub fn element(&self) -> Option<&Element> {
        self.element.as_ref()
    }

    /// An attribute of the originating element. Never triggers a fetch.
    pub fn element_attr(&self, name: &str) -> Option<&str> {
        self.element.as_ref().and_then(|element| element.attr(name))
    }

    /// Keys under which the parent indexes this node.
    pub fn identities(&self) -> Vec<&str> {
        self.element
            .as_ref()
            .map(|element| self.kind.identities(element))
            .unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.contents.get().is_some()
    }

    /// Fetch and parse this node's contents unless that already happened.
    pub fn load(&self) -> Result<()> {
        self.contents().map(|_| ())
    }

    /// Load this node and `depth` levels below it, siblings in parallel.
    pub fn preload(&self, depth: usize) -> Result<()> {
        self.load()?;
        if depth == 0 {
            return Ok(());
        }
        self.children()?
            .par_iter()
            .try_for_each(|child| child.preload(depth - 1))
    }

    /// Keyed lookup; fails with [`Error::MissingAttribute`] when nothing matches.
    pub fn get(&self, key: &str) -> Result<Value<'_>> {
        self.lookup(key)?
            .ok_or_else(|| Error::missing_attribute(key))
    }

    /// Keyed lookup returning `default` when nothing matches.
    pub fn get_or<'a>(&'a self, key: &str, default: Value<'a>) -> Result<Value<'a>> {
        Ok(self.lookup(key)?.unwrap_or(default))
    }

    /// Keyed lookup over children and attributes.
    ///
    /// Directory-like kinds try children by identity first, then attributes.
    /// Multi-valued kinds try attributes first and then return every matching
    /// child as a collection. The servers listing matches children by
    /// position or by name.
    pub fn lookup(&self, key: &str) -> Result<Option<Value<'_>>> {
        let contents = self.contents()?;
        let value = match self.kind.capabilities().lookup {
            LookupOrder::ChildrenFirst => contents
                .by_identity(key)
                .or_else(|| contents.attribute(key)),
            LookupOrder::AttributesFirst => contents
                .attribute(key)
                .or_else(|| contents.all_by_identity(key)),
            LookupOrder::Servers => contents
                .by_ordinal_or_name(key)
                .or_else(|| contents.attribute(key)),
        };
        Ok(value)
    }

    /// Every child indexed under `key`, possibly none.
    pub fn all(&self, key: &str) -> Result<Vec<&Node>> {
        Ok(self.contents()?.matching(key))
    }

    /// A scalar attribute of the loaded node.
    pub fn attr(&self, name: &str) -> Result<Option<&str>> {
        Ok(self
            .contents()?
            .attributes
            .get(name)
            .map(String::as_str))
    }

    pub fn attributes(&self) -> Result<&BTreeMap<String, String>> {
        Ok(&self.contents()?.attributes)
    }

    /// The canonical scalar of this kind, e.g. a genre's `tag`.
    pub fn value(&self) -> Result<Option<&str>> {
        self.attr(self.kind.capabilities().value_attr)
    }

    pub fn children(&self) -> Result<&[Node]> {
        Ok(&self.contents()?.children)
    }

    pub fn iter(&self) -> Result<std::slice::Iter<'_, Node>> {
        Ok(self.children()?.iter())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.children()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.children()?.is_empty())
    }

    pub fn first(&self) -> Result<Option<&Node>> {
        Ok(self.children()?.first())
    }

    /// Whether this node is a search entry point (`search="1"`).
    pub fn is_searchable(&self) -> bool {
        self.element_attr("search") == Some("1")
    }

    /// Run a free-text search through the first searchable child.
    ///
    /// The result is a new, unloaded node of this node's kind bound to the
    /// searchable child's endpoint with `query` appended. Returns `None` when
    /// no child is searchable.
    pub fn search(&self, query: &str) -> Result<Option<Node>> {
        let Some(target) = self.children()?.iter().find(|child| child.is_searchable()) else {
            return Ok(None);
        };

        let relative = format!(
            "?{}",
            form_urlencoded::Serializer::new(String::new())
                .append_pair("query", query)
                .finish()
        );
        let endpoint = target.endpoint.join(Some(&relative))?;
        tracing::debug!("Searching {} for {:?}", endpoint, query);

        let element = target.element.clone().unwrap_or_default();
        Ok(Some(Node::new(
            self.kind,
            endpoint,
            element,
            target.shared_headers().clone(),
            self.shared.clone(),
        )))
    }

    /// First child whose `machineIdentifier` matches.
    pub fn from_machine_id(&self, machine_id: &str) -> Result<Option<&Node>> {
        Ok(self
            .children()?
            .iter()
            .find(|child| child.element_attr("machineIdentifier") == Some(machine_id)))
    }

    /// Artwork for a slot this kind supports, resolved once per node.
    ///
    /// `None` when the kind has no such artwork or the attribute is absent.
    pub fn image(&self, slot: ImageSlot) -> Result<Option<&ImageRef>> {
        if !self.kind.capabilities().images.contains(&slot) {
            return Ok(None);
        }
        let image = self.images[slot.index()].get_or_try_init(|| self.build_image(slot))?;
        Ok(image.as_ref())
    }

    pub fn thumb(&self) -> Result<Option<&ImageRef>> {
        self.image(ImageSlot::Thumb)
    }

    pub fn art(&self) -> Result<Option<&ImageRef>> {
        self.image(ImageSlot::Art)
    }

    fn build_image(&self, slot: ImageSlot) -> Result<Option<ImageRef>> {
        match self.attr(slot.attr())? {
            Some(reference) if !reference.is_empty() => Ok(Some(ImageRef::resolve(
                &self.endpoint,
                reference,
                self.shared_headers().clone(),
                self.shared.fetcher.clone(),
            )?)),
            _ => Ok(None),
        }
    }

    fn contents(&self) -> Result<&Contents> {
        self.contents
            .get_or_init(|| self.fetch_contents())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn initial_attributes(&self) -> BTreeMap<String, String> {
        self.element
            .iter()
            .flat_map(|element| element.attributes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn embedded_contents(&self) -> Result<Contents> {
        let elements = self
            .element
            .as_ref()
            .map(|element| element.children().to_vec())
            .unwrap_or_default();
        self.build_contents(self.initial_attributes(), elements, None)
    }

    fn fetch_contents(&self) -> Result<Contents> {
        let load = self.kind.capabilities().load;
        if load == LoadStrategy::Embedded {
            return self.embedded_contents();
        }

        let document = self.fetch_document()?;
        let subject = match load {
            LoadStrategy::SelfLoading => first_child_or_self(document),
            _ => document,
        };

        let mut attributes = self.initial_attributes();
        for (k, v) in subject.attributes() {
            attributes.insert(k.to_string(), v.to_string());
        }
        let view_group = attributes.get("viewGroup").cloned();

        let mut elements = Vec::new();
        if load == LoadStrategy::Fetch {
            if let Some(element) = &self.element {
                elements.extend(element.children().iter().cloned());
            }
        }
        elements.extend(subject.into_children());

        self.build_contents(attributes, elements, view_group.as_deref())
    }

    fn fetch_document(&self) -> Result<Element> {
        tracing::debug!("Fetching {} node {}", self.kind.name(), self.endpoint);
        let response = self.shared.fetcher.fetch(self.endpoint.url(), self.headers())?;

        if response.status == 401 {
            let url = self.endpoint.redacted();
            return Err(if self.endpoint.has_token() {
                Error::InvalidToken { url }
            } else {
                Error::TokenRequired { url }
            });
        }
        if !response.is_success() {
            return Err(Error::Status {
                status: response.status,
                url: self.endpoint.redacted(),
            });
        }

        tracing::debug!(
            "Fetched {} ({} bytes, HTTP {})",
            self.endpoint,
            response.body.len(),
            response.status
        );
        xml::parse_document(&response.body)
    }

    fn build_contents(
        &self,
        attributes: BTreeMap<String, String>,
        elements: Vec<Element>,
        view_group: Option<&str>,
    ) -> Result<Contents> {
        let capabilities = self.kind.capabilities();
        let default_child = view_group
            .and_then(|view_group| self.shared.registry.tag(capabilities.table, view_group))
            .unwrap_or(capabilities.default_child);

        let mut children: Vec<Node> = Vec::with_capacity(elements.len());
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();

        for element in elements {
            let child = self.child(element, view_group, default_child)?;
            let position = children.len();
            for identity in child.identities() {
                let positions = index.entry(identity.to_string()).or_default();
                if positions.last() != Some(&position) {
                    positions.push(position);
                }
            }
            children.push(child);
        }

        Ok(Contents {
            attributes,
            children,
            index,
        })
    }

    fn child(
        &self,
        mut element: Element,
        view_group: Option<&str>,
        default_child: NodeKind,
    ) -> Result<Node> {
        let forced = self.kind.normalize_child(view_group, &mut element);
        let joined = self.endpoint.join(element.attr("key"))?;

        let kind = match forced {
            Some(kind) => kind,
            None => {
                let path = element.attr("key").map(|_| joined.url().path());
                self.shared.registry.resolve(
                    self.kind.capabilities().table,
                    element.tag(),
                    element.attr("type"),
                    path,
                    default_child,
                )
            }
        };
        tracing::trace!(
            "Dispatched <{}> under {} to {}",
            element.tag(),
            self.endpoint,
            kind.name()
        );

        let endpoint = if kind.is_embedded() {
            self.endpoint.clone()
        } else {
            joined
        };
        Ok(Node::new(
            kind,
            endpoint,
            element,
            self.shared_headers().clone(),
            self.shared.clone(),
        ))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("kind", &self.kind.name());
        if let Some(title) = self.element_attr("title").or_else(|| self.element_attr("tag")) {
            s.field("title", &title);
        }
        s.field("location", &self.endpoint.location())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

fn first_child_or_self(document: Element) -> Element {
    if document.children().is_empty() {
        return document;
    }
    document
        .into_children()
        .into_iter()
        .next()
        .unwrap_or_default()
}
