//! Handlers, outcomes, and handler chains.
//!
//! # Control flow
//!
//! A handler receives the [`Request`] by value and returns an [`Outcome`]
//! saying what happens next:
//!
//! ```text
//! Outcome::Respond(res)      → send `res`, stop
//! Outcome::Next(req)         → run the next handler of this route
//! Outcome::SkipRoute(req)    → drop the rest of this route, try the next matching route
//! Outcome::Fail(err)         → hand `err` to the router's error handler
//! ```
//!
//! Handing the request back inside `Next` is what lets the chain continue;
//! a handler that has given its request away cannot also continue, and a
//! handler that returns nothing does not compile.
//!
//! # How async handlers are stored
//!
//! Routes hold handlers of *different* types in one `Vec`, so each handler is
//! erased behind `dyn ErasedHandler`:
//!
//! ```text
//! async fn cb0(req: Request) -> Outcome { … }    ← user writes this
//!        ↓ router.get("/", cb0)
//! cb0.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(cb0))                       ← stored as BoxedHandler
//!        ↓
//! handler.call(req)  at request time             ← one vtable dispatch
//!        ↓
//! Box::pin(async { cb0(req).await.into_outcome() })
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::BoxError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What a handler decided.
pub enum Outcome {
    /// Terminal: this response is sent.
    Respond(Response),
    /// Continue with the next handler of the same route. After the last
    /// handler, continue with the next matching route.
    Next(Request),
    /// Abandon the rest of this route's chain and continue with the next
    /// matching route.
    SkipRoute(Request),
    /// Abandon the request and pass the error to the router's error handler.
    Fail(BoxError),
}

/// Conversion into an [`Outcome`]. Anything that is a response is a
/// terminal outcome.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome { self }
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Outcome { Outcome::Respond(self) }
}

impl IntoOutcome for Status {
    fn into_outcome(self) -> Outcome { Outcome::Respond(self.into_response()) }
}

impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Outcome { Outcome::Respond(self.into_response()) }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Outcome { Outcome::Respond(self.into_response()) }
}

/// `Err` fails the request, so handlers can use `?`.
impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(v) => v.into_outcome(),
            Err(e) => Outcome::Fail(e.into()),
        }
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler:
///
/// ```text
/// async fn name(req: Request) -> impl IntoOutcome
/// ```
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An ordered sequence of handlers registered under one route.
///
/// ```rust
/// use senda::{Chain, Outcome, Request, Response, Router, chain};
///
/// async fn cb0(req: Request) -> Outcome { req.next() }
/// async fn cb1(req: Request) -> Outcome { req.next() }
/// async fn cb2(_: Request) -> Response { Response::text("Hello from C!") }
///
/// let app = Router::new()
///     .get("/example/c", chain![cb0, cb1, cb2])
///     .get("/example/d", Chain::new().then(chain![cb0, cb1]).then(cb2));
/// ```
#[derive(Clone, Default)]
pub struct Chain {
    handlers: Vec<BoxedHandler>,
}

impl Chain {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Appends a handler, or every handler of another chain.
    pub fn then(mut self, next: impl IntoChain) -> Self {
        self.handlers.extend(next.into_chain().handlers);
        self
    }

    pub fn len(&self) -> usize { self.handlers.len() }

    pub fn is_empty(&self) -> bool { self.handlers.is_empty() }

    pub(crate) fn handlers(&self) -> &[BoxedHandler] { &self.handlers }
}

/// A single handler or a [`Chain`].
pub trait IntoChain {
    fn into_chain(self) -> Chain;
}

impl IntoChain for Chain {
    fn into_chain(self) -> Chain { self }
}

impl<H: Handler> IntoChain for H {
    fn into_chain(self) -> Chain {
        Chain { handlers: vec![self.into_boxed_handler()] }
    }
}

/// Builds a [`Chain`] from handlers and chains, in order.
#[macro_export]
macro_rules! chain {
    ($($handler:expr),+ $(,)?) => {
        $crate::Chain::new()$(.then($handler))+
    };
}
