//! HTTP method as a typed enum, and the filter a route applies to it.
//!
//! Unknown method strings are rejected at the server level with
//! `405 Method Not Allowed` before they ever reach the router.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    // RFC 9110 ─────────────────────────────────────────────────────────────────
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
    // WebDAV RFC 4918 / 3253 / 5323 ───────────────────────────────────────────
    Copy,
    Lock,
    Mkcol,
    Move,
    Report,
    Search,
    Unlock,
    // Cache invalidation ───────────────────────────────────────────────────────
    Purge, // nginx / Varnish
}

impl Method {
    /// Every method, in the order `Allow` headers list them.
    pub const ALL: [Method; 17] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
        Self::Connect,
        Self::Trace,
        Self::Copy,
        Self::Lock,
        Self::Mkcol,
        Self::Move,
        Self::Purge,
        Self::Report,
        Self::Search,
        Self::Unlock,
    ];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Copy    => "COPY",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Lock    => "LOCK",
            Self::Mkcol   => "MKCOL",
            Self::Move    => "MOVE",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Purge   => "PURGE",
            Self::Put     => "PUT",
            Self::Report  => "REPORT",
            Self::Search  => "SEARCH",
            Self::Trace   => "TRACE",
            Self::Unlock  => "UNLOCK",
        }
    }
}

/// A method string that is not one of [`Method`]'s variants.
#[derive(Debug, Error)]
#[error("unknown HTTP method `{0}`")]
pub struct UnknownMethod(pub String);

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_owned()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which request methods a route answers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MethodFilter {
    /// Every method (`Router::all`).
    All,
    /// One method. `Only(Get)` also answers `HEAD`.
    Only(Method),
}

impl MethodFilter {
    pub fn permits(self, method: Method) -> bool {
        match self {
            Self::All => true,
            Self::Only(m) => m == method || (m == Method::Get && method == Method::Head),
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(m: Method) -> Self {
        Self::Only(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("PURGE".parse::<Method>().unwrap(), Method::Purge);
        assert!("get".parse::<Method>().is_err());
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn every_method_round_trips_through_its_name() {
        for m in Method::ALL {
            assert_eq!(m.as_str().parse::<Method>().unwrap(), m);
        }
    }

    #[test]
    fn get_filter_answers_head() {
        assert!(MethodFilter::Only(Method::Get).permits(Method::Head));
        assert!(!MethodFilter::Only(Method::Head).permits(Method::Get));
        assert!(!MethodFilter::Only(Method::Post).permits(Method::Get));
        assert!(MethodFilter::All.permits(Method::Search));
    }
}
