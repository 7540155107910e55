//! Delegation to the host chain.

use crate::HttpExchange;
use portcullis::{Action, ActionResult, EvalError, FirewallContext, Rule};

/// Hands the request to the next stage, then terminates the rule tree.
///
/// Whatever runs downstream owns the response, so no later rule may touch it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Proceed;

/// Build a [`Proceed`] action.
#[must_use]
pub fn proceed() -> Proceed {
    Proceed
}

impl<X: HttpExchange> Action<X> for Proceed {
    fn perform(&self, _cx: &dyn FirewallContext<X>, req: &mut X) -> Result<ActionResult, EvalError> {
        req.proceed()?;
        Ok(ActionResult::Terminate)
    }
}

impl<X: HttpExchange + 'static> From<Proceed> for Rule<X> {
    fn from(action: Proceed) -> Self {
        Rule::action(action)
    }
}
