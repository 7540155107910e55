//! HTTP method negotiation
//!
//! [`constrain`] restricts a routing scope to a set of methods and answers
//! everything else itself: `OPTIONS` gets `200` with an `Allow` header,
//! anything not allowed gets `405` with the same header.
//!
//! # `Allow` construction
//!
//! The header lists the caller's methods in first-seen order with duplicates
//! removed, then `HEAD` if `GET` is present and `HEAD` is not, then `OPTIONS`
//! if missing:
//!
//! | allowed | `Allow` |
//! |---------|---------|
//! | `GET` | `GET, HEAD, OPTIONS` |
//! | `GET, POST` | `GET, POST, HEAD, OPTIONS` |
//! | `POST, OPTIONS` | `POST, OPTIONS` |

use crate::{DispatcherType, HttpExchange};
use http::header::ALLOW;
use http::{HeaderValue, Method, StatusCode};
use portcullis::{Action, ActionResult, EvalError, FirewallContext, Rule};
use std::fmt;

/// Method-negotiation action. Build with [`constrain`].
#[derive(Clone)]
pub struct Constrain {
    allowed: Vec<Method>,
    allow: String,
    allow_header: Option<HeaderValue>,
}

/// Restrict the scope to `methods`.
///
/// `GET` implies `HEAD`; `OPTIONS` is always answered.
pub fn constrain(methods: impl IntoIterator<Item = Method>) -> Constrain {
    let mut allowed: Vec<Method> = Vec::new();
    for method in methods {
        if !allowed.contains(&method) {
            allowed.push(method);
        }
    }

    let mut advertised = allowed.clone();
    if advertised.contains(&Method::GET) && !advertised.contains(&Method::HEAD) {
        advertised.push(Method::HEAD);
    }
    if !advertised.contains(&Method::OPTIONS) {
        advertised.push(Method::OPTIONS);
    }
    let allow = advertised
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let allow_header = HeaderValue::from_str(&allow).ok();

    Constrain {
        allowed,
        allow,
        allow_header,
    }
}

impl Constrain {
    /// The deduplicated caller-supplied methods.
    #[must_use]
    pub fn allowed(&self) -> &[Method] {
        &self.allowed
    }

    /// The `Allow` header value sent with `OPTIONS` and `405` responses.
    #[must_use]
    pub fn allow(&self) -> &str {
        &self.allow
    }

    /// Whether `method` passes, with `GET` implying `HEAD`.
    #[must_use]
    pub fn permits(&self, method: &Method) -> bool {
        self.allowed.contains(method)
            || (*method == Method::HEAD && self.allowed.contains(&Method::GET))
    }
}

impl<X: HttpExchange> Action<X> for Constrain {
    fn perform(&self, _cx: &dyn FirewallContext<X>, req: &mut X) -> Result<ActionResult, EvalError> {
        // Status and headers of an included resource belong to the includer.
        if req.dispatcher_type() == DispatcherType::Include {
            return Ok(ActionResult::Continue);
        }

        let method = req.method().clone();
        if self.permits(&method) {
            return Ok(ActionResult::Continue);
        }

        let allow = self.allow_header.clone().ok_or_else(|| {
            EvalError::defect(format!("Allow value {:?} is not a valid header", self.allow))
        })?;
        let status = if method == Method::OPTIONS {
            StatusCode::OK
        } else {
            tracing::debug!(%method, allow = %self.allow, "method not allowed");
            StatusCode::METHOD_NOT_ALLOWED
        };

        let response = req.response();
        response.reset()?;
        response.set_status(status);
        response.set_header(ALLOW, allow);
        response.set_content_length(0);
        response.close_body()?;
        Ok(ActionResult::Terminate)
    }
}

impl fmt::Debug for Constrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constrain").field(&self.allow).finish()
    }
}

impl<X: HttpExchange + 'static> From<Constrain> for Rule<X> {
    fn from(action: Constrain) -> Self {
        Rule::action(action)
    }
}
