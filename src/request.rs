//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;

use crate::handler::Outcome;
use crate::method::Method;

/// An incoming HTTP request, as seen by the handler currently running.
///
/// `path()` and `params()` describe the route being tried: inside a router
/// mounted at `/birds`, a request for `/birds/about` has `path() == "/about"`,
/// `base_url() == "/birds"` and `original_path() == "/birds/about"`.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    original_path: String,
    path: String,
    base_url: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Bytes,
    params: HashMap<String, String>,
}

impl Request {
    /// Builds a request for in-process dispatch, e.g. with
    /// [`Router::handle`](crate::Router::handle) in tests.
    ///
    /// `target` is a path with an optional query: `/users/34?verbose=1`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (target, None),
        };
        let path = if path.is_empty() { "/" } else { path };
        Self {
            method,
            original_path: path.to_owned(),
            path: path.to_owned(),
            base_url: String::new(),
            query,
            headers: Vec::new(),
            body: Bytes::new(),
            params: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Points the request at the next candidate route.
    pub(crate) fn enter(&mut self, path: String, base_url: String, params: HashMap<String, String>) {
        self.path = path;
        self.base_url = base_url;
        self.params = params;
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn original_path(&self) -> &str { &self.original_path }
    pub fn base_url(&self) -> &str { &self.base_url }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    /// Wildcards and unnamed regex groups are numbered: `req.param("0")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> { &self.params }

    /// Continue with the next handler.
    pub fn next(self) -> Outcome { Outcome::Next(self) }

    /// Skip the remaining handlers of this route.
    pub fn skip_route(self) -> Outcome { Outcome::SkipRoute(self) }
}
