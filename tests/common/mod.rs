//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], a wiremock server serving a small media server
//! catalog. The server runs on the harness's own tokio runtime, so tests stay
//! synchronous and can drive the blocking catalog or the binary directly.

#![allow(dead_code)]

use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const TOKEN: &str = "sekrit";

pub const ROOT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="2" friendlyName="Den" machineIdentifier="m-2" version="1.40.0">
  <Directory key="library" title="library" />
  <Directory key="servers" title="servers" />
</MediaContainer>"#;

pub const SERVERS: &str = r#"<MediaContainer size="2">
  <Server name="Attic" host="10.0.0.3" machineIdentifier="m-1" />
  <Server name="Den" host="10.0.0.2" machineIdentifier="m-2" />
</MediaContainer>"#;

pub const LIBRARY: &str = r#"<MediaContainer size="2" title1="Plex Library">
  <Directory key="sections" title="Library Sections" />
  <Directory key="recentlyAdded" title="Recently Added Content" />
</MediaContainer>"#;

pub const SECTIONS: &str = r#"<MediaContainer size="2">
  <Directory key="1" type="movie" title="Movies" />
  <Directory key="2" type="show" title="TV Shows" />
</MediaContainer>"#;

pub const MOVIES: &str = r#"<MediaContainer size="2" viewGroup="secondary">
  <Directory key="all" title="All Movies" />
  <Directory search="1" key="search?type=1" title="Search..." />
</MediaContainer>"#;

pub const ALL_MOVIES: &str = r#"<MediaContainer size="1" viewGroup="movie">
  <Video key="/library/metadata/42" title="Heat" year="1995" thumb="/library/metadata/42/thumb/1" />
</MediaContainer>"#;

pub const HEAT: &str = r#"<MediaContainer size="1">
  <Video key="/library/metadata/42" title="Heat" year="1995" thumb="/library/metadata/42/thumb/1">
    <Genre tag="Crime" />
    <Genre tag="Drama" />
  </Video>
</MediaContainer>"#;

pub const SEARCH: &str = r#"<MediaContainer size="1">
  <Video key="/library/metadata/9" title="Batman" year="1989" />
</MediaContainer>"#;

pub const EMPTY: &str = r#"<MediaContainer size="0" />"#;

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// A mock media server. The server is declared before the runtime so it is
/// dropped first.
pub struct TestHarness {
    pub server: MockServer,
    rt: Runtime,
}

impl TestHarness {
    /// Start an empty mock server.
    pub fn new() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    /// Start a mock server serving the standard catalog, token required.
    pub fn with_catalog() -> Self {
        let harness = Self::new();
        for (at, body) in [
            ("/", ROOT),
            ("/servers/", SERVERS),
            ("/library/", LIBRARY),
            ("/library/sections/", SECTIONS),
            ("/library/recentlyAdded/", EMPTY),
            ("/library/sections/1/", MOVIES),
            ("/library/sections/2/", EMPTY),
            ("/library/sections/1/all/", ALL_MOVIES),
            ("/library/metadata/42/", HEAT),
            ("/library/sections/1/search/", SEARCH),
        ] {
            harness.mount(
                Mock::given(method("GET"))
                    .and(path(at))
                    .and(query_param("X-Plex-Token", TOKEN))
                    .respond_with(ResponseTemplate::new(200).set_body_string(body)),
            );
        }
        harness.mount(
            Mock::given(method("GET"))
                .and(path("/library/metadata/42/thumb/1"))
                .and(query_param("X-Plex-Token", TOKEN))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG)),
        );
        harness.mount(Mock::given(method("GET")).respond_with(ResponseTemplate::new(401)));
        harness
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    /// Server base URL without a token.
    pub fn url(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Server base URL carrying the token.
    pub fn url_with_token(&self) -> String {
        format!("{}/?X-Plex-Token={}", self.server.uri(), TOKEN)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}
