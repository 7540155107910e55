//! The host boundary: what rules may read from and write to a request.
//!
//! The hosting filter machinery owns the real request, response and chain.
//! It exposes them to the rule tree through [`HttpExchange`], created per
//! request and discarded afterwards.

use http::{HeaderName, HeaderValue, Method, StatusCode};
use std::fmt;
use std::io;
use std::str::FromStr;

/// How the current request entered processing.
///
/// Serializes upper-case; parsing (including deserialization) is
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")
)]
pub enum DispatcherType {
    /// A request straight from the client.
    Request,
    /// Server-side forward to another resource.
    Forward,
    /// Server-side inclusion of another resource's output.
    ///
    /// Status and headers are owned by the including resource and cannot be
    /// altered.
    Include,
    /// Re-dispatch of an asynchronous request.
    Async,
    /// Dispatch to an error page.
    Error,
}

impl DispatcherType {
    /// Every dispatcher type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Request,
        Self::Forward,
        Self::Include,
        Self::Async,
        Self::Error,
    ];

    /// Upper-case name (`"REQUEST"`, `"INCLUDE"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "REQUEST",
            Self::Forward => "FORWARD",
            Self::Include => "INCLUDE",
            Self::Async => "ASYNC",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for DispatcherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no [`DispatcherType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dispatcher type \"{0}\" (expected one of REQUEST, FORWARD, INCLUDE, ASYNC, ERROR)")]
pub struct UnknownDispatcherType(pub String);

impl FromStr for DispatcherType {
    type Err = UnknownDispatcherType;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDispatcherType(s.to_owned()))
    }
}

impl TryFrom<String> for DispatcherType {
    type Error = UnknownDispatcherType;

    fn try_from(s: String) -> Result<Self, UnknownDispatcherType> {
        s.parse()
    }
}

/// Response-emission capability handed to actions.
///
/// Mirrors what a servlet-style container offers. All mutators act on the
/// buffered, uncommitted response; the I/O-bearing ones may fail once the
/// response is committed or the connection is gone.
pub trait HttpResponse {
    /// Clear buffered status, headers and body.
    ///
    /// # Errors
    ///
    /// Fails if the response is already committed.
    fn reset(&mut self) -> io::Result<()>;

    /// Set the status code.
    fn set_status(&mut self, status: StatusCode);

    /// Set a header, replacing any previous value.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Set the `Content-Length`.
    fn set_content_length(&mut self, length: u64);

    /// Close the body stream, committing the response.
    ///
    /// # Errors
    ///
    /// Transport failure while flushing.
    fn close_body(&mut self) -> io::Result<()>;

    /// Send an error response with an optional message, committing it.
    ///
    /// # Errors
    ///
    /// Fails if the response is already committed or cannot be written.
    fn send_error(&mut self, status: StatusCode, message: Option<&str>) -> io::Result<()>;
}

/// Per-request view of the host: request attributes, response, and chain.
pub trait HttpExchange {
    /// The request method.
    fn method(&self) -> &Method;

    /// How the request entered processing.
    fn dispatcher_type(&self) -> DispatcherType;

    /// The authentication scheme, or `None` for unauthenticated requests.
    fn auth_type(&self) -> Option<&str>;

    /// The response under construction.
    fn response(&mut self) -> &mut dyn HttpResponse;

    /// Hand the request to the next stage of the host chain.
    ///
    /// # Errors
    ///
    /// Propagates transport failures from downstream.
    fn proceed(&mut self) -> io::Result<()>;
}
