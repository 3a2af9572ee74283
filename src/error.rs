//! Error types.
//!
//! Three kinds of failure exist and they never mix:
//!
//! - [`PatternError`] — a route path that cannot be compiled. Raised at
//!   registration time, before the server accepts a single connection.
//! - [`RouteError`] — a registration that is structurally wrong (bad pattern,
//!   empty handler chain).
//! - [`Error`] — infrastructure: binding a port, accepting a connection.
//!
//! "No route matched" is not an error. It is `None` from
//! [`Router::resolve`](crate::Router::resolve) and a `404` from
//! [`Router::handle`](crate::Router::handle).

use thiserror::Error;

/// Boxed error produced by a handler through [`Outcome::Fail`](crate::Outcome::Fail).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A route path that could not be compiled. Positions are byte offsets into
/// the path source.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("path `{0}` must start with `/`")]
    MissingLeadingSlash(String),

    #[error("parameter at {pos} has no name")]
    MissingName { pos: usize },

    #[error("parameter `{0}` appears more than once")]
    DuplicateParam(String),

    /// `:a:b` or `:a*` — nothing tells the matcher where `a` stops.
    #[error("parameter `{first}` is followed by `{second}` with no delimiter between them")]
    AmbiguousParams { first: String, second: String },

    #[error("unclosed `{open}` at {pos}")]
    Unclosed { open: char, pos: usize },

    #[error("unexpected `)` at {pos}")]
    UnexpectedClose { pos: usize },

    #[error("modifier `{modifier}` at {pos} has nothing to apply to")]
    DanglingModifier { modifier: char, pos: usize },

    #[error("trailing `\\` at {pos}")]
    TrailingEscape { pos: usize },

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

/// A route registration that was rejected.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route `{path}`: {source}")]
    Pattern {
        path: String,
        #[source]
        source: PatternError,
    },

    #[error("route `{path}` has no handlers")]
    EmptyChain { path: String },
}

/// The error type returned by the server's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: parsing the bind address, binding to a port.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}
