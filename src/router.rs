//! Ordered request router.
//!
//! A router is a list of layers, tried in registration order:
//!
//! ```text
//! Layer::Route   method + pattern + handler chain
//! Layer::Mount   prefix + child router (the prefix is stripped before the
//!                child sees the path)
//! ```
//!
//! The first layer that matches wins. A route whose handlers pass control
//! on (`Next` after the last handler, or `SkipRoute`) hands the request to the
//! next layer that also matches, so registration order is precedence.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{BoxError, RouteError};
use crate::handler::{Chain, IntoChain, Outcome};
use crate::method::{Method, MethodFilter};
use crate::options::RouterOptions;
use crate::pattern::{Pattern, PatternSource};
use crate::request::Request;
use crate::response::Response;
use crate::route::Route;
use crate::status::Status;

type ErrorHandler = Arc<dyn Fn(BoxError) -> Response + Send + Sync + 'static>;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so definitions chain naturally.
///
/// ```rust
/// use senda::{Request, Response, Router};
///
/// async fn home(_: Request) -> &'static str { "Birds home page" }
/// async fn about(_: Request) -> &'static str { "About birds" }
/// async fn root(_: Request) -> Response { Response::text("Hello World!") }
///
/// let birds = Router::new()
///     .get("/", home)
///     .get("/about", about);
///
/// let app = Router::new()
///     .get("/", root)
///     .mount("/birds", birds);
/// ```
pub struct Router {
    options: RouterOptions,
    layers: Vec<Layer>,
    error_handler: Option<ErrorHandler>,
}

enum Layer {
    Route(Route),
    Mount { prefix: Pattern, router: Arc<Router> },
}

/// A route that matches a `(method, path)` pair.
#[derive(Debug)]
pub struct RouteMatch<'r> {
    pub route: &'r Route,
    pub params: HashMap<String, String>,
    /// The path the route matched: the request path with every mount prefix
    /// on the way stripped.
    pub remaining_path: String,
    /// The stripped mount prefixes, concatenated. Empty at top level.
    pub base_url: String,
}

impl Router {
    pub fn new() -> Self {
        Self::with_options(RouterOptions::new())
    }

    pub fn with_options(options: RouterOptions) -> Self {
        Self { options, layers: Vec::new(), error_handler: None }
    }

    pub fn settings(&self) -> &RouterOptions { &self.options }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Register a handler chain for a method + pattern pair. Returns `self`
    /// for chaining.
    ///
    /// # Panics
    ///
    /// Panics if the pattern does not compile or the chain is empty. Use
    /// [`Router::try_on`] to get the error instead.
    pub fn on(self, method: Method, pattern: impl Into<PatternSource>, chain: impl IntoChain) -> Self {
        self.add(MethodFilter::Only(method), pattern.into(), chain.into_chain())
    }

    /// Register a chain that answers every method.
    pub fn all(self, pattern: impl Into<PatternSource>, chain: impl IntoChain) -> Self {
        self.add(MethodFilter::All, pattern.into(), chain.into_chain())
    }

    pub fn get(self, pattern: impl Into<PatternSource>, chain: impl IntoChain) -> Self {
        self.on(Method::Get, pattern, chain)
    }

    pub fn post(self, pattern: impl Into<PatternSource>, chain: impl IntoChain) -> Self {
        self.on(Method::Post, pattern, chain)
    }

    pub fn put(self, pattern: impl Into<PatternSource>, chain: impl IntoChain) -> Self {
        self.on(Method::Put, pattern, chain)
    }

    pub fn patch(self, pattern: impl Into<PatternSource>, chain: impl IntoChain) -> Self {
        self.on(Method::Patch, pattern, chain)
    }

    pub fn delete(self, pattern: impl Into<PatternSource>, chain: impl IntoChain) -> Self {
        self.on(Method::Delete, pattern, chain)
    }

    pub fn head(self, pattern: impl Into<PatternSource>, chain: impl IntoChain) -> Self {
        self.on(Method::Head, pattern, chain)
    }

    /// Takes over `OPTIONS` for `pattern` from the automatic `Allow` answer.
    pub fn options(self, pattern: impl Into<PatternSource>, chain: impl IntoChain) -> Self {
        self.on(Method::Options, pattern, chain)
    }

    /// Like [`Router::on`], but returns the registration error.
    pub fn try_on(
        self,
        method: impl Into<MethodFilter>,
        pattern: impl Into<PatternSource>,
        chain: impl IntoChain,
    ) -> Result<Self, RouteError> {
        self.try_add(method.into(), pattern.into(), chain.into_chain())
    }

    /// Several methods on one path, compiled once:
    ///
    /// ```rust
    /// # use senda::{Request, Router};
    /// # async fn get_book(_: Request) -> &'static str { "Get a random book" }
    /// # async fn add_book(_: Request) -> &'static str { "Add a book" }
    /// # async fn update_book(_: Request) -> &'static str { "Update the book" }
    /// let app = Router::new().route("/book", |r| {
    ///     r.get(get_book).post(add_book).put(update_book)
    /// });
    /// ```
    ///
    /// # Panics
    ///
    /// Same conditions as [`Router::on`]; see [`Router::try_route`].
    pub fn route(
        self,
        pattern: impl Into<PatternSource>,
        build: impl FnOnce(RouteBuilder) -> RouteBuilder,
    ) -> Self {
        self.try_route(pattern, build).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_route(
        mut self,
        pattern: impl Into<PatternSource>,
        build: impl FnOnce(RouteBuilder) -> RouteBuilder,
    ) -> Result<Self, RouteError> {
        let source = pattern.into();
        let path = source_text(&source);
        let pattern = Pattern::new(source, &self.options)
            .map_err(|source| RouteError::Pattern { path: path.clone(), source })?;
        let pattern = Arc::new(pattern);

        let builder = build(RouteBuilder { entries: Vec::new() });
        if builder.entries.is_empty() {
            return Err(RouteError::EmptyChain { path });
        }
        for (method, chain) in builder.entries {
            self = self.push(method, Arc::clone(&pattern), chain)?;
        }
        Ok(self)
    }

    /// Delegates every path under `prefix` to `router`, with the prefix
    /// stripped. `router` may be an `Arc<Router>` shared with other parents.
    ///
    /// # Panics
    ///
    /// Panics if the prefix does not compile. See [`Router::try_mount`].
    pub fn mount(self, prefix: impl Into<PatternSource>, router: impl Into<Arc<Router>>) -> Self {
        self.try_mount(prefix, router).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_mount(
        mut self,
        prefix: impl Into<PatternSource>,
        router: impl Into<Arc<Router>>,
    ) -> Result<Self, RouteError> {
        let source = prefix.into();
        let path = source_text(&source);
        let prefix = Pattern::prefix(source, &self.options)
            .map_err(|source| RouteError::Pattern { path, source })?;
        self.layers.push(Layer::Mount { prefix, router: router.into() });
        Ok(self)
    }

    /// Replaces the default error handler (log, then `500`).
    ///
    /// Errors are answered by the router whose [`handle`](Router::handle) was
    /// called. Handlers in mounted routers fail into it too.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(BoxError) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    fn add(self, method: MethodFilter, source: PatternSource, chain: Chain) -> Self {
        self.try_add(method, source, chain).unwrap_or_else(|e| panic!("{e}"))
    }

    fn try_add(self, method: MethodFilter, source: PatternSource, chain: Chain) -> Result<Self, RouteError> {
        let path = source_text(&source);
        let pattern = Pattern::new(source, &self.options)
            .map_err(|source| RouteError::Pattern { path, source })?;
        self.push(method, Arc::new(pattern), chain)
    }

    fn push(mut self, method: MethodFilter, pattern: Arc<Pattern>, chain: Chain) -> Result<Self, RouteError> {
        if chain.is_empty() {
            return Err(RouteError::EmptyChain { path: pattern.as_str().to_owned() });
        }
        self.layers.push(Layer::Route(Route::new(method, pattern, chain)));
        Ok(self)
    }

    // ── Matching ──────────────────────────────────────────────────────────────

    /// The route that gets the first chance at `(method, path)`.
    pub fn resolve(&self, method: Method, path: &str) -> Option<RouteMatch<'_>> {
        self.candidates(Some(method), path).next()
    }

    /// Every route matching `(method, path)`, in precedence order, descending
    /// into mounted routers.
    pub fn resolve_all(&self, method: Method, path: &str) -> Vec<RouteMatch<'_>> {
        self.candidates(Some(method), path).collect()
    }

    /// Methods with at least one route whose pattern matches `path`.
    /// `all` routes are not listed; a `GET` route also lists `HEAD`.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut found = Vec::new();
        for m in self.candidates(None, path) {
            if let MethodFilter::Only(method) = m.route.method() {
                found.push(method);
                if method == Method::Get {
                    found.push(Method::Head);
                }
            }
        }
        Method::ALL.into_iter().filter(|m| found.contains(m)).collect()
    }

    /// Matching routes in precedence order, found one at a time.
    /// `method == None` matches routes of every method.
    fn candidates(&self, method: Option<Method>, path: &str) -> Candidates<'_> {
        Candidates {
            method,
            stack: vec![Frame {
                router: self,
                next: 0,
                path: path.to_owned(),
                base_url: String::new(),
                inherited: HashMap::new(),
            }],
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Runs `req` through every matching route in order until one responds.
    ///
    /// No route responding is a `404`, except `OPTIONS` on a path that has
    /// routes, which answers with the `Allow` list.
    pub async fn handle(&self, mut req: Request) -> Response {
        let method = req.method();
        let path = req.original_path().to_owned();

        // matched lazily: later candidates are only tried if this one passes
        for candidate in self.candidates(Some(method), &path) {
            debug!(%method, path = %path, route = candidate.route.pattern().as_str(), "trying route");
            req.enter(candidate.remaining_path, candidate.base_url, candidate.params);
            match candidate.route.run(req).await {
                Outcome::Respond(res) => return res,
                Outcome::Next(r) | Outcome::SkipRoute(r) => req = r,
                Outcome::Fail(err) => return self.fail(method, &path, err),
            }
        }

        self.unhandled(method, &path)
    }

    fn fail(&self, method: Method, path: &str, err: BoxError) -> Response {
        match &self.error_handler {
            Some(handler) => handler(err),
            None => {
                error!(%method, path = %path, error = %err, "handler failed");
                Response::status(Status::InternalServerError)
            }
        }
    }

    fn unhandled(&self, method: Method, path: &str) -> Response {
        if method == Method::Options {
            let allowed = self.allowed_methods(path);
            if !allowed.is_empty() {
                let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
                return Response::builder().header("allow", &allow).text(allow.clone());
            }
        }
        debug!(%method, path = %path, "no route matched");
        Response::builder()
            .status(Status::NotFound)
            .text(format!("Cannot {method} {path}"))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Methods registered together by [`Router::route`].
pub struct RouteBuilder {
    entries: Vec<(MethodFilter, Chain)>,
}

impl RouteBuilder {
    pub fn on(mut self, method: Method, chain: impl IntoChain) -> Self {
        self.entries.push((MethodFilter::Only(method), chain.into_chain()));
        self
    }

    pub fn all(mut self, chain: impl IntoChain) -> Self {
        self.entries.push((MethodFilter::All, chain.into_chain()));
        self
    }

    pub fn get(self, chain: impl IntoChain) -> Self { self.on(Method::Get, chain) }
    pub fn post(self, chain: impl IntoChain) -> Self { self.on(Method::Post, chain) }
    pub fn put(self, chain: impl IntoChain) -> Self { self.on(Method::Put, chain) }
    pub fn patch(self, chain: impl IntoChain) -> Self { self.on(Method::Patch, chain) }
    pub fn delete(self, chain: impl IntoChain) -> Self { self.on(Method::Delete, chain) }
}

/// Depth-first walk over a router's layers, resumable between candidates
/// so that dispatch only matches as far as it has to.
struct Candidates<'r> {
    method: Option<Method>,
    stack: Vec<Frame<'r>>,
}

/// One router being walked: its next layer, and the path as it sees it.
struct Frame<'r> {
    router: &'r Router,
    next: usize,
    path: String,
    base_url: String,
    inherited: HashMap<String, String>,
}

impl<'r> Iterator for Candidates<'r> {
    type Item = RouteMatch<'r>;

    fn next(&mut self) -> Option<RouteMatch<'r>> {
        while let Some(frame) = self.stack.last_mut() {
            let router = frame.router;
            let Some(layer) = router.layers.get(frame.next) else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;

            match layer {
                Layer::Route(route) => {
                    if self.method.is_some_and(|m| !route.permits(m)) {
                        continue;
                    }
                    let Some(captured) = route.pattern().capture(&frame.path) else {
                        continue;
                    };
                    let params = if router.options.merge_params {
                        merge(&frame.inherited, captured.params)
                    } else {
                        captured.params
                    };
                    return Some(RouteMatch {
                        route,
                        params,
                        remaining_path: frame.path.clone(),
                        base_url: frame.base_url.clone(),
                    });
                }
                Layer::Mount { prefix, router: child } => {
                    let Some(captured) = prefix.capture(&frame.path) else {
                        continue;
                    };
                    let (stripped, rest) = frame.path.split_at(captured.len);
                    let path = match rest {
                        "" => "/".to_owned(),
                        r if r.starts_with('/') => r.to_owned(),
                        r => format!("/{r}"),
                    };
                    let base_url = format!("{}{stripped}", frame.base_url);
                    let inherited = if router.options.merge_params {
                        merge(&frame.inherited, captured.params)
                    } else {
                        captured.params
                    };
                    self.stack.push(Frame { router: child, next: 0, path, base_url, inherited });
                }
            }
        }
        None
    }
}

fn source_text(source: &PatternSource) -> String {
    match source {
        PatternSource::Path(p) => p.clone(),
        PatternSource::Regex(r) => r.as_str().to_owned(),
    }
}

/// `own` wins over `inherited` on name clashes.
fn merge(inherited: &HashMap<String, String>, own: HashMap<String, String>) -> HashMap<String, String> {
    let mut merged = inherited.clone();
    merged.extend(own);
    merged
}
