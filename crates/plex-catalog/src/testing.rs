//! In-memory [`Fetch`] double shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use reqwest::header::HeaderMap;
use url::Url;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::fetch::{Fetch, FetchResponse};

/// Serves canned responses by exact URL and records every request.
/// Unknown URLs answer 404.
#[derive(Default)]
pub(crate) struct MockFetcher {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<(String, HeaderMap)>>,
}

enum Route {
    Respond(u16, Bytes),
    Fail(String),
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, body: impl Into<Bytes>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Respond(status, body.into()));
    }

    pub fn xml(&self, url: &str, body: &'static str) {
        self.respond(url, 200, body);
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Fail(message.to_string()));
    }

    /// Number of requests made to exactly this URL.
    pub fn count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }

    pub fn total(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn headers_for(&self, url: &str) -> Option<HeaderMap> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, h)| h.clone())
    }
}

impl Fetch for MockFetcher {
    fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<FetchResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.clone()));
        match self.routes.lock().unwrap().get(url.as_str()) {
            Some(Route::Respond(status, body)) => Ok(FetchResponse {
                status: *status,
                body: body.clone(),
            }),
            Some(Route::Fail(message)) => Err(Error::Http(message.clone())),
            None => Ok(FetchResponse {
                status: 404,
                body: Bytes::new(),
            }),
        }
    }
}

/// A catalog using the standard registry and the given double.
pub(crate) fn catalog(fetcher: &Arc<MockFetcher>) -> Catalog {
    Catalog::builder().fetcher(fetcher.clone()).build()
}
