//! HTTP status codes as a typed enum.
//!
//! ```rust
//! use senda::{Response, Status};
//!
//! Response::status(Status::NoContent);
//!
//! // return Status directly from a handler
//! async fn delete_book(_req: senda::Request) -> Status {
//!     Status::NoContent
//! }
//! ```

/// The status codes a router answers with or a handler commonly needs.
/// Anything else goes through [`Response::builder`](crate::Response::builder)
/// with a raw code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,
    Created,
    Accepted,
    NoContent,
    MovedPermanently,
    Found,
    SeeOther,
    NotModified,
    TemporaryRedirect,
    PermanentRedirect,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    Gone,
    UnprocessableContent,
    TooManyRequests,
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
}

impl Status {
    pub fn code(self) -> u16 {
        self.info().0
    }

    /// Canonical reason phrase, e.g. `"Not Found"`.
    pub fn reason(self) -> &'static str {
        self.info().1
    }

    fn info(self) -> (u16, &'static str) {
        match self {
            Self::Ok                   => (200, "OK"),
            Self::Created              => (201, "Created"),
            Self::Accepted             => (202, "Accepted"),
            Self::NoContent            => (204, "No Content"),
            Self::MovedPermanently     => (301, "Moved Permanently"),
            Self::Found                => (302, "Found"),
            Self::SeeOther             => (303, "See Other"),
            Self::NotModified          => (304, "Not Modified"),
            Self::TemporaryRedirect    => (307, "Temporary Redirect"),
            Self::PermanentRedirect    => (308, "Permanent Redirect"),
            Self::BadRequest           => (400, "Bad Request"),
            Self::Unauthorized         => (401, "Unauthorized"),
            Self::Forbidden            => (403, "Forbidden"),
            Self::NotFound             => (404, "Not Found"),
            Self::MethodNotAllowed     => (405, "Method Not Allowed"),
            Self::Conflict             => (409, "Conflict"),
            Self::Gone                 => (410, "Gone"),
            Self::UnprocessableContent => (422, "Unprocessable Content"),
            Self::TooManyRequests      => (429, "Too Many Requests"),
            Self::InternalServerError  => (500, "Internal Server Error"),
            Self::NotImplemented       => (501, "Not Implemented"),
            Self::BadGateway           => (502, "Bad Gateway"),
            Self::ServiceUnavailable   => (503, "Service Unavailable"),
            Self::GatewayTimeout       => (504, "Gateway Timeout"),
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 { s.code() }
}
