//! `FirewallContext` — per-request dispatch capability
//!
//! Combinators never call their children directly. They hand each child to
//! the context, which lets the host add cross-cutting behavior (tracing,
//! recording, metrics) without touching combinator logic.

use crate::{Action, ActionResult, EvalError, Matcher, MatcherResult};

/// Dispatches a single matcher or action and returns its typed result.
///
/// Created per request and discarded afterwards. Implementations call
/// `matcher.evaluate(self, req)` / `action.perform(self, req)` so that the
/// same context is threaded through the entire tree.
pub trait FirewallContext<Req> {
    /// Invoke one matcher.
    ///
    /// # Errors
    ///
    /// Propagates the matcher's [`EvalError`].
    fn call_matcher(
        &self,
        matcher: &dyn Matcher<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError>;

    /// Invoke one action.
    ///
    /// # Errors
    ///
    /// Propagates the action's [`EvalError`].
    fn call_action(
        &self,
        action: &dyn Action<Req>,
        req: &mut Req,
    ) -> Result<ActionResult, EvalError>;
}

/// Plain dispatch with no interposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectContext;

impl<Req> FirewallContext<Req> for DirectContext {
    fn call_matcher(
        &self,
        matcher: &dyn Matcher<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        matcher.evaluate(self, req)
    }

    fn call_action(
        &self,
        action: &dyn Action<Req>,
        req: &mut Req,
    ) -> Result<ActionResult, EvalError> {
        action.perform(self, req)
    }
}

/// Dispatch wrapped in `tracing` spans.
///
/// Every node gets a `trace`-level span carrying its debug label. Results are
/// logged at `trace`, terminations at `debug`, failures at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingContext;

impl<Req> FirewallContext<Req> for TracingContext {
    fn call_matcher(
        &self,
        matcher: &dyn Matcher<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        let span = tracing::trace_span!("matcher", node = ?matcher);
        let _guard = span.enter();

        let result = matcher.evaluate(self, req);
        match &result {
            Ok(MatcherResult::Terminate) => tracing::debug!("matcher terminated the request"),
            Ok(verdict) => tracing::trace!(%verdict, "matcher evaluated"),
            Err(error) => tracing::error!(%error, "matcher failed"),
        }
        result
    }

    fn call_action(
        &self,
        action: &dyn Action<Req>,
        req: &mut Req,
    ) -> Result<ActionResult, EvalError> {
        let span = tracing::trace_span!("action", node = ?action);
        let _guard = span.enter();

        let result = action.perform(self, req);
        match &result {
            Ok(ActionResult::Terminate) => tracing::debug!("action terminated the request"),
            Ok(outcome) => tracing::trace!(%outcome, "action performed"),
            Err(error) => tracing::error!(%error, "action failed"),
        }
        result
    }
}
