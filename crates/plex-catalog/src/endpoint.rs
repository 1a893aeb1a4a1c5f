//! Endpoint composition.
//!
//! Every node is bound to an [`Endpoint`]: the URL its XML is fetched from plus
//! a flag recording whether an authentication token travels with it. Children
//! derive their endpoint from the parent's by joining the element's `key`:
//!
//! - the path is resolved like a relative URL and always ends with `/`, so the
//!   next join is a directory join;
//! - a relative reference with a query appends its parameters after the
//!   parent's; one without a query keeps only the token from the parent.

use std::fmt;

use url::{form_urlencoded, Url};

use crate::error::Result;

/// Query parameter carrying the authentication token.
pub const TOKEN_PARAM: &str = "X-Plex-Token";

/// A composed locator for one node's XML representation.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    has_token: bool,
}

impl Endpoint {
    /// Parse an absolute URL into a root endpoint.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(Self::from_url(Url::parse(raw)?))
    }

    /// Wrap an already parsed URL.
    pub fn from_url(url: Url) -> Self {
        let has_token = carries_token(&url);
        Self { url, has_token }
    }

    /// Compose a child endpoint from an optional relative reference.
    ///
    /// `None` (or an empty reference) yields an identical endpoint.
    pub fn join(&self, relative: Option<&str>) -> Result<Self> {
        let relative = match relative {
            Some(relative) if !relative.is_empty() => relative,
            _ => return Ok(self.clone()),
        };

        let (path, query) = split_reference(relative);
        let mut url = self.url.clone();

        if !path.is_empty() {
            let joined = self.url.join(&path)?;
            url.set_path(&directory_path(joined.path()));
        }

        let pairs = match query.as_deref() {
            Some(query) if !query.is_empty() => {
                let mut pairs = query_pairs(self.url.query().unwrap_or_default());
                pairs.extend(query_pairs(query));
                pairs
            }
            _ => token_pairs(&self.url),
        };
        replace_query(&mut url, &pairs);

        let has_token = self.has_token || carries_token(&url);
        Ok(Self { url, has_token })
    }

    /// Resolve a host-relative resource such as artwork.
    ///
    /// Unlike [`join`](Self::join) no trailing `/` is forced. The query keeps
    /// the token from this endpoint followed by the resource's own parameters.
    pub fn resource(&self, reference: &str) -> Result<Url> {
        let (path, query) = split_reference(reference);
        let mut url = self.url.clone();

        if !path.is_empty() {
            let joined = self.url.join(&path)?;
            url.set_path(joined.path());
        }

        let mut pairs = token_pairs(&self.url);
        if let Some(query) = query {
            pairs.extend(query_pairs(&query));
        }
        replace_query(&mut url, &pairs);

        Ok(url)
    }

    /// The full URL, token included.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Host and path, used to label nodes.
    pub fn location(&self) -> String {
        format!("{}{}", self.url.host_str().unwrap_or_default(), self.url.path())
    }

    /// Whether this endpoint, or any endpoint it was derived from, carries a token.
    pub fn has_token(&self) -> bool {
        self.has_token
    }

    /// The URL with token values masked, safe for logs and error messages.
    pub fn redacted(&self) -> String {
        redact(&self.url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.redacted())
            .field("has_token", &self.has_token)
            .finish()
    }
}

/// Mask token values in any URL.
pub fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == TOKEN_PARAM) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == TOKEN_PARAM {
                (k.into_owned(), "***".to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();
    let mut masked = url.clone();
    replace_query(&mut masked, &pairs);
    masked.to_string()
}

fn carries_token(url: &Url) -> bool {
    url.query_pairs()
        .any(|(k, v)| k == TOKEN_PARAM && !v.is_empty())
}

/// Split a reference into its path and query, ignoring any fragment. An
/// absolute reference contributes only its path and query.
fn split_reference(reference: &str) -> (String, Option<String>) {
    if let Ok(absolute) = Url::parse(reference) {
        return (
            absolute.path().to_string(),
            absolute.query().map(str::to_string),
        );
    }
    let without_fragment = reference.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (without_fragment.to_string(), None),
    }
}

fn directory_path(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Decode a query string into ordered pairs. Blank values are dropped.
fn query_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn token_pairs(url: &Url) -> Vec<(String, String)> {
    query_pairs(url.query().unwrap_or_default())
        .into_iter()
        .filter(|(k, _)| k == TOKEN_PARAM)
        .collect()
}

fn replace_query(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        url.set_query(None);
        return;
    }
    url.query_pairs_mut().clear().extend_pairs(pairs);
}
