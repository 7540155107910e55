//! `Matcher`, `Action`, and the dual-capability `Rule`.
//!
//! A rule element is a matcher, an action, or both. Every combinator walks
//! rule sequences through [`Rule::evaluate`] so the dual nature is handled in
//! exactly one place.

use crate::{
    ActionResult, ConfigError, EvalError, FirewallContext, MatcherResult, MAX_DEPTH,
};
use std::fmt::Debug;
use std::sync::Arc;

/// A predicate over a request producing a three-valued [`MatcherResult`].
///
/// Implementations close over configuration only. All per-request state
/// lives in `Req`, which is why matchers receive it mutably: composite
/// matchers may run nested actions that write the response.
///
/// Children are never invoked directly. Go through `cx` so the host can
/// interpose tracing or recording uniformly.
///
/// # Thread Safety
///
/// Rule trees are shared across concurrent requests, so implementations
/// must be `Send + Sync`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Matcher<{Req}>`",
    label = "this type cannot be evaluated against `{Req}`",
    note = "Matcher<Req> evaluates a predicate against a specific request type"
)]
pub trait Matcher<Req>: Send + Sync + Debug {
    /// Evaluate this matcher against the request.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when a nested action hits a transport failure or a
    /// leaf detects a defect. Errors abort the whole evaluation.
    fn evaluate(
        &self,
        cx: &dyn FirewallContext<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError>;

    /// Nesting depth of this matcher. Leaves are 1.
    fn depth(&self) -> usize {
        1
    }
}

/// A side-effecting step producing a two-valued [`ActionResult`].
///
/// Returning [`ActionResult::Terminate`] means the action fully handled the
/// request (wrote a response, forwarded, delegated to the chain). Actions are
/// never retried.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Action<{Req}>`",
    label = "this type cannot act on `{Req}`",
    note = "Action<Req> performs a side effect against a specific request type"
)]
pub trait Action<Req>: Send + Sync + Debug {
    /// Perform this action.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Transport`] if the host fails to emit the response.
    fn perform(
        &self,
        cx: &dyn FirewallContext<Req>,
        req: &mut Req,
    ) -> Result<ActionResult, EvalError>;

    /// Nesting depth of this action. Leaves are 1.
    fn depth(&self) -> usize {
        1
    }
}

/// One element of a rule sequence.
///
/// The variants are the three legal capability combinations. There is no
/// "neither" case, so an element without any capability cannot be built.
///
/// # INV: matcher before action
///
/// For [`Rule::Both`], the matcher runs first and the action runs only when
/// the matcher answered `Match`, in a single evaluation step.
pub enum Rule<Req> {
    /// A pure predicate.
    Matcher(Arc<dyn Matcher<Req>>),
    /// A pure side effect.
    Action(Arc<dyn Action<Req>>),
    /// A guarded side effect.
    Both {
        /// Evaluated first.
        matcher: Arc<dyn Matcher<Req>>,
        /// Performed only when `matcher` answered `Match`.
        action: Arc<dyn Action<Req>>,
    },
}

impl<Req> Rule<Req> {
    /// Wrap a matcher.
    pub fn matcher<M: Matcher<Req> + 'static>(matcher: M) -> Self {
        Self::Matcher(Arc::new(matcher))
    }

    /// Wrap an action.
    pub fn action<A: Action<Req> + 'static>(action: A) -> Self {
        Self::Action(Arc::new(action))
    }

    /// Wrap a value that is both a matcher and an action.
    ///
    /// Both capabilities share one allocation.
    pub fn both<T>(element: T) -> Self
    where
        T: Matcher<Req> + Action<Req> + 'static,
    {
        let shared = Arc::new(element);
        Self::Both {
            matcher: shared.clone(),
            action: shared,
        }
    }

    /// The matcher capability, if any.
    #[must_use]
    pub fn as_matcher(&self) -> Option<&dyn Matcher<Req>> {
        match self {
            Self::Matcher(m) | Self::Both { matcher: m, .. } => Some(m.as_ref()),
            Self::Action(_) => None,
        }
    }

    /// The action capability, if any.
    #[must_use]
    pub fn as_action(&self) -> Option<&dyn Action<Req>> {
        match self {
            Self::Action(a) | Self::Both { action: a, .. } => Some(a.as_ref()),
            Self::Matcher(_) => None,
        }
    }

    /// Shared handle to the matcher capability, if any.
    #[must_use]
    pub fn matcher_arc(&self) -> Option<Arc<dyn Matcher<Req>>> {
        match self {
            Self::Matcher(m) | Self::Both { matcher: m, .. } => Some(Arc::clone(m)),
            Self::Action(_) => None,
        }
    }

    /// Returns `true` if this element has a matcher capability.
    #[must_use]
    pub fn is_matcher(&self) -> bool {
        self.as_matcher().is_some()
    }

    /// Returns `true` if this element has an action capability.
    #[must_use]
    pub fn is_action(&self) -> bool {
        self.as_action().is_some()
    }

    /// Evaluate this element as one step of a sequence.
    ///
    /// - matcher only: the matcher's verdict
    /// - action only: `Continue` becomes `Match`, `Terminate` stays
    /// - both: matcher first, then the action only on `Match`
    ///
    /// # Errors
    ///
    /// Propagates any [`EvalError`] from the underlying capabilities.
    pub fn evaluate(
        &self,
        cx: &dyn FirewallContext<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        match self {
            Self::Matcher(m) => cx.call_matcher(m.as_ref(), req),
            Self::Action(a) => cx.call_action(a.as_ref(), req).map(MatcherResult::from),
            Self::Both { matcher, action } => match cx.call_matcher(matcher.as_ref(), req)? {
                MatcherResult::Match => cx
                    .call_action(action.as_ref(), req)
                    .map(MatcherResult::from),
                other => Ok(other),
            },
        }
    }

    /// Nesting depth of this element.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Matcher(m) => m.depth(),
            Self::Action(a) => a.depth(),
            Self::Both { matcher, action } => matcher.depth().max(action.depth()),
        }
    }

    /// Validate this rule tree against safety constraints.
    ///
    /// Call this at load time. Evaluation recurses, so the depth bound is
    /// what keeps a hostile config from exhausting the stack.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DepthExceeded`] if nesting exceeds [`MAX_DEPTH`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let depth = self.depth();
        if depth > MAX_DEPTH {
            return Err(ConfigError::DepthExceeded {
                depth,
                max: MAX_DEPTH,
            });
        }
        Ok(())
    }
}

impl<Req> Clone for Rule<Req> {
    fn clone(&self) -> Self {
        match self {
            Self::Matcher(m) => Self::Matcher(Arc::clone(m)),
            Self::Action(a) => Self::Action(Arc::clone(a)),
            Self::Both { matcher, action } => Self::Both {
                matcher: Arc::clone(matcher),
                action: Arc::clone(action),
            },
        }
    }
}

impl<Req> Debug for Rule<Req> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matcher(m) => f.debug_tuple("Matcher").field(m).finish(),
            Self::Action(a) => f.debug_tuple("Action").field(a).finish(),
            Self::Both { matcher, .. } => f.debug_tuple("Both").field(matcher).finish(),
        }
    }
}
