//! # senda
//!
//! An ordered HTTP router in the Express style: routes are tried in the
//! order they were registered, each route runs a chain of handlers, and
//! routers mount under path prefixes.
//!
//! ## Route paths
//!
//! - **Strings** — `/about`, `/random.text`. Exact match.
//! - **Patterns** — `/ab?cd`, `/ab+cd`, `/ab*cd`, `/ab(cd)?e`,
//!   `/users/:userId/books/:bookId`, `/flights/:from-:to`,
//!   `/user/:userId(\d+)`. See [`pattern`](crate::pattern) for the syntax.
//! - **Regular expressions** — any [`regex::Regex`], matched anywhere in the
//!   path unless it anchors itself.
//!
//! Patterns are compiled when the route is registered. A bad pattern is a
//! [`PatternError`] at startup, never a surprise at request time.
//!
//! ## Handler chains
//!
//! A handler returns what happens next — respond, continue with the next
//! handler, skip the rest of the route, or fail:
//!
//! ```rust
//! use senda::{Outcome, Request, Response, Router, chain};
//!
//! async fn check(req: Request) -> Outcome {
//!     if req.param("id") == Some("0") {
//!         return req.skip_route();
//!     }
//!     req.next()
//! }
//!
//! async fn regular(req: Request) -> Response {
//!     Response::text(format!("user {}", req.param("id").unwrap_or_default()))
//! }
//!
//! async fn special(_: Request) -> &'static str { "special" }
//!
//! let app = Router::new()
//!     .get("/user/:id", chain![check, regular])
//!     .get("/user/:id", special);
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use senda::{Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .get("/", |_req: Request| async { "Hello World!" })
//!         .get("/users/:userId/books/:bookId", show_book);
//!
//!     Server::bind("0.0.0.0:3000").unwrap().serve(app).await.unwrap();
//! }
//!
//! async fn show_book(req: Request) -> Result<Response, serde_json::Error> {
//!     Ok(Response::json(serde_json::to_vec(req.params())?))
//! }
//! ```

mod error;
mod handler;
mod method;
mod options;
mod request;
mod response;
mod route;
mod router;
mod server;
mod status;

pub mod pattern;

pub use error::{BoxError, Error, PatternError, RouteError};
pub use handler::{Chain, Handler, IntoChain, IntoOutcome, Outcome};
pub use method::{Method, MethodFilter, UnknownMethod};
pub use options::RouterOptions;
pub use pattern::{Pattern, PatternSource};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use route::Route;
pub use router::{RouteBuilder, RouteMatch, Router};
pub use server::Server;
pub use status::Status;
