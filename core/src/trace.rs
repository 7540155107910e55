//! Evaluation trace types for debugging rule trees.
//!
//! [`RecordingContext`] is a [`FirewallContext`] that records every dispatch
//! it performs. Because combinators invoke all children through the context,
//! the recording captures the full decision path without any change to
//! combinator code.
//!
//! # Example
//!
//! ```ignore
//! let trace = evaluate_with_trace(&rule, &mut exchange)?;
//! println!("Result: {}", trace.result);
//! for step in &trace.steps {
//!     println!("{:indent$}{:?} -> {}", "", step.node, step.outcome, indent = step.depth * 2);
//! }
//! ```

use crate::{Action, ActionResult, EvalError, FirewallContext, Matcher, MatcherResult, Rule};
use std::cell::{Cell, RefCell};
use std::fmt;

/// Which capability a step dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A matcher evaluation.
    Matcher,
    /// An action performance.
    Action,
}

/// What a step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still running (only observable while evaluation is in progress).
    Pending,
    /// A matcher answered.
    Matcher(MatcherResult),
    /// An action answered.
    Action(ActionResult),
    /// The node raised an error (rendered message).
    Failed(String),
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Matcher(r) => write!(f, "{r}"),
            Self::Action(r) => write!(f, "{r}"),
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// One dispatch recorded in pre-order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalStep {
    /// Nesting level (0 for the root).
    pub depth: usize,
    /// Matcher or action.
    pub kind: NodeKind,
    /// Debug rendering of the node.
    pub node: String,
    /// Result of the dispatch.
    pub outcome: StepOutcome,
}

/// Trace of a full evaluation.
///
/// # INV: `result` == `evaluate()` result
///
/// Recording never changes evaluation order or short-circuiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalTrace {
    /// The terminal verdict.
    pub result: MatcherResult,
    /// Every dispatch, in the order it started.
    pub steps: Vec<EvalStep>,
}

/// A [`FirewallContext`] that records each dispatch.
///
/// Per-request only: it uses interior mutability and is not `Sync`.
#[derive(Debug, Default)]
pub struct RecordingContext {
    steps: RefCell<Vec<EvalStep>>,
    depth: Cell<usize>,
}

impl RecordingContext {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the steps recorded so far.
    #[must_use]
    pub fn steps(&self) -> Vec<EvalStep> {
        self.steps.borrow().clone()
    }

    /// Consume the recorder and return its steps.
    #[must_use]
    pub fn into_steps(self) -> Vec<EvalStep> {
        self.steps.into_inner()
    }

    fn open(&self, kind: NodeKind, node: String) -> usize {
        let mut steps = self.steps.borrow_mut();
        steps.push(EvalStep {
            depth: self.depth.get(),
            kind,
            node,
            outcome: StepOutcome::Pending,
        });
        self.depth.set(self.depth.get() + 1);
        steps.len() - 1
    }

    fn close(&self, index: usize, outcome: StepOutcome) {
        self.depth.set(self.depth.get().saturating_sub(1));
        if let Some(step) = self.steps.borrow_mut().get_mut(index) {
            step.outcome = outcome;
        }
    }
}

impl<Req> FirewallContext<Req> for RecordingContext {
    fn call_matcher(
        &self,
        matcher: &dyn Matcher<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        let index = self.open(NodeKind::Matcher, format!("{matcher:?}"));
        let result = matcher.evaluate(self, req);
        self.close(
            index,
            match &result {
                Ok(r) => StepOutcome::Matcher(*r),
                Err(e) => StepOutcome::Failed(e.to_string()),
            },
        );
        result
    }

    fn call_action(
        &self,
        action: &dyn Action<Req>,
        req: &mut Req,
    ) -> Result<ActionResult, EvalError> {
        let index = self.open(NodeKind::Action, format!("{action:?}"));
        let result = action.perform(self, req);
        self.close(
            index,
            match &result {
                Ok(r) => StepOutcome::Action(*r),
                Err(e) => StepOutcome::Failed(e.to_string()),
            },
        );
        result
    }
}

/// Evaluate `root` with a fresh [`RecordingContext`].
///
/// # Errors
///
/// Propagates the evaluation's [`EvalError`]; the partial trace is dropped.
pub fn evaluate_with_trace<Req>(root: &Rule<Req>, req: &mut Req) -> Result<EvalTrace, EvalError> {
    let cx = RecordingContext::new();
    let result = root.evaluate(&cx, req)?;
    Ok(EvalTrace {
        result,
        steps: cx.into_steps(),
    })
}
