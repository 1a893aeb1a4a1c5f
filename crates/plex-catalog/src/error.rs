//! Error types for plex-catalog.
//!
//! Errors carry their messages as strings so a failed load can be stored in a
//! node and replayed to every later caller without refetching.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while fetching or navigating the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The server answered 401 and the endpoint carried no token.
    #[error("authentication token required for {url}")]
    TokenRequired { url: String },

    /// The server answered 401 although the endpoint carried a token.
    #[error("invalid authentication token for {url}")]
    InvalidToken { url: String },

    /// A keyed lookup found neither a child nor an attribute.
    #[error("missing attribute: {key}")]
    MissingAttribute { key: String },

    /// The server answered with a non-success status other than 401.
    #[error("unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body is not a usable XML document.
    #[error("XML error: {0}")]
    Xml(String),

    /// A URL could not be parsed or composed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A custom header name or value was rejected.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl Error {
    /// Create a missing attribute error.
    pub fn missing_attribute(key: impl Into<String>) -> Self {
        Self::MissingAttribute { key: key.into() }
    }

    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// True for the two 401 classifications.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::TokenRequired { .. } | Self::InvalidToken { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest includes the full URL in its message, token included.
        Error::Http(err.without_url().to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}
