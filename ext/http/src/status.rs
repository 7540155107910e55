//! Status-response actions
//!
//! Every standard status code maps to one shared terminating action that asks
//! the host to send that status. Codes outside the table are built on demand.
//!
//! ```ignore
//! let deny: Rule<Exchange> = status::send(StatusCode::FORBIDDEN);
//! let teapot = status::code::<Exchange>(418)?;
//! let gone = status::with_message(StatusCode::GONE, "moved to /v2");
//! ```

use crate::HttpExchange;
use http::StatusCode;
use portcullis::{Action, ActionResult, ConfigError, EvalError, FirewallContext, Rule};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Terminating action that sends one status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendStatus {
    status: StatusCode,
    message: Option<String>,
}

impl SendStatus {
    /// Send `status` with no message.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            message: None,
        }
    }

    /// Send `status` with `message` as the error description.
    #[must_use]
    pub fn with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    /// The status this action sends.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The message this action sends, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl<X: HttpExchange> Action<X> for SendStatus {
    fn perform(&self, _cx: &dyn FirewallContext<X>, req: &mut X) -> Result<ActionResult, EvalError> {
        req.response()
            .send_error(self.status, self.message.as_deref())?;
        Ok(ActionResult::Terminate)
    }
}

impl<X: HttpExchange + 'static> From<SendStatus> for Rule<X> {
    fn from(action: SendStatus) -> Self {
        Rule::action(action)
    }
}

/// Codes with a shared, pre-built action.
///
/// The standard 1xx-5xx set up to 505, plus 451.
const STANDARD_CODES: &[u16] = &[
    100, 101, //
    200, 201, 202, 203, 204, 205, 206, //
    300, 301, 302, 303, 304, 305, 307, //
    400, 401, 402, 403, 404, 405, 406, 407, 408, 409, 410, 411, 412, 413, 414, 415, 416, 417,
    451, //
    500, 501, 502, 503, 504, 505,
];

static TABLE: LazyLock<HashMap<u16, Arc<SendStatus>>> = LazyLock::new(|| {
    STANDARD_CODES
        .iter()
        .filter_map(|&code| StatusCode::from_u16(code).ok())
        .map(|status| (status.as_u16(), Arc::new(SendStatus::new(status))))
        .collect()
});

/// The codes backed by a shared action, ascending.
#[must_use]
pub fn standard_codes() -> &'static [u16] {
    STANDARD_CODES
}

/// Returns `true` if `code` has a shared action.
#[must_use]
pub fn is_standard(code: u16) -> bool {
    TABLE.contains_key(&code)
}

/// Rule that sends `status` and terminates.
///
/// Table codes reuse the shared action; any other code gets a fresh one.
pub fn send<X: HttpExchange + 'static>(status: StatusCode) -> Rule<X> {
    match TABLE.get(&status.as_u16()) {
        Some(shared) => {
            let action: Arc<dyn Action<X>> = shared.clone();
            Rule::Action(action)
        }
        None => Rule::action(SendStatus::new(status)),
    }
}

/// Rule that sends the numeric `code` and terminates.
///
/// # Errors
///
/// [`ConfigError::InvalidStatus`] if `code` is outside `100..=999`.
pub fn code<X: HttpExchange + 'static>(code: u16) -> Result<Rule<X>, ConfigError> {
    StatusCode::from_u16(code)
        .map(send::<X>)
        .map_err(|_| ConfigError::InvalidStatus { code })
}

/// Rule that sends `status` with a message and terminates.
pub fn with_message<X: HttpExchange + 'static>(status: StatusCode, message: impl Into<String>) -> Rule<X> {
    Rule::action(SendStatus::with_message(status, message))
}
