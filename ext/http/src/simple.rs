//! Simple in-memory `SimpleExchange` for testing and basic use cases.
//!
//! Records everything actions do to the response so tests (and the CLI) can
//! inspect it afterwards. Failures can be injected to exercise transport
//! error paths.

use crate::{DispatcherType, HttpExchange, HttpResponse};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use std::io;

/// What actions did to the response.
#[derive(Debug, Clone, Default)]
pub struct RecordedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    content_length: Option<u64>,
    body_closed: bool,
    error_message: Option<String>,
    committed: bool,
    fail_close: bool,
}

impl RecordedResponse {
    /// The status set, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// A header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All headers set.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `Content-Length` set, if any.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Whether the body was closed.
    #[must_use]
    pub fn body_closed(&self) -> bool {
        self.body_closed
    }

    /// Message passed to `send_error`, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether the response has been committed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    fn ensure_uncommitted(&self) -> io::Result<()> {
        if self.committed {
            return Err(io::Error::other("response already committed"));
        }
        Ok(())
    }
}

impl HttpResponse for RecordedResponse {
    fn reset(&mut self) -> io::Result<()> {
        self.ensure_uncommitted()?;
        self.status = None;
        self.headers.clear();
        self.content_length = None;
        self.error_message = None;
        Ok(())
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn set_content_length(&mut self, length: u64) {
        self.content_length = Some(length);
    }

    fn close_body(&mut self) -> io::Result<()> {
        if self.fail_close {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"));
        }
        self.body_closed = true;
        self.committed = true;
        Ok(())
    }

    fn send_error(&mut self, status: StatusCode, message: Option<&str>) -> io::Result<()> {
        self.ensure_uncommitted()?;
        self.status = Some(status);
        self.error_message = message.map(str::to_owned);
        self.committed = true;
        Ok(())
    }
}

/// In-memory [`HttpExchange`].
#[derive(Debug, Clone)]
pub struct SimpleExchange {
    method: Method,
    dispatcher_type: DispatcherType,
    auth_type: Option<String>,
    response: RecordedResponse,
    proceeded: usize,
    fail_chain: bool,
}

impl Default for SimpleExchange {
    fn default() -> Self {
        Self {
            method: Method::GET,
            dispatcher_type: DispatcherType::Request,
            auth_type: None,
            response: RecordedResponse::default(),
            proceeded: 0,
            fail_chain: false,
        }
    }
}

impl SimpleExchange {
    /// Create a builder for `SimpleExchange`.
    #[must_use]
    pub fn builder() -> SimpleExchangeBuilder {
        SimpleExchangeBuilder::default()
    }

    /// A plain `GET` request.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// What actions did to the response.
    #[must_use]
    pub fn recorded(&self) -> &RecordedResponse {
        &self.response
    }

    /// How many times the chain was continued.
    #[must_use]
    pub fn proceeded(&self) -> usize {
        self.proceeded
    }
}

impl HttpExchange for SimpleExchange {
    fn method(&self) -> &Method {
        &self.method
    }

    fn dispatcher_type(&self) -> DispatcherType {
        self.dispatcher_type
    }

    fn auth_type(&self) -> Option<&str> {
        self.auth_type.as_deref()
    }

    fn response(&mut self) -> &mut dyn HttpResponse {
        &mut self.response
    }

    fn proceed(&mut self) -> io::Result<()> {
        if self.fail_chain {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "downstream failed"));
        }
        self.proceeded += 1;
        Ok(())
    }
}

/// Builder for `SimpleExchange`.
#[derive(Debug, Default)]
pub struct SimpleExchangeBuilder {
    exchange: SimpleExchange,
}

impl SimpleExchangeBuilder {
    /// Set the method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.exchange.method = method;
        self
    }

    /// Set the dispatcher type.
    #[must_use]
    pub fn dispatcher_type(mut self, dispatcher_type: DispatcherType) -> Self {
        self.exchange.dispatcher_type = dispatcher_type;
        self
    }

    /// Set the authentication scheme.
    #[must_use]
    pub fn auth_type(mut self, scheme: impl Into<String>) -> Self {
        self.exchange.auth_type = Some(scheme.into());
        self
    }

    /// Make `close_body` fail with a transport error.
    #[must_use]
    pub fn fail_close(mut self) -> Self {
        self.exchange.response.fail_close = true;
        self
    }

    /// Make `proceed` fail with a transport error.
    #[must_use]
    pub fn fail_chain(mut self) -> Self {
        self.exchange.fail_chain = true;
        self
    }

    /// Build the `SimpleExchange`.
    #[must_use]
    pub fn build(self) -> SimpleExchange {
        self.exchange
    }
}
