//! portcullis - rule evaluation algebra for firewall-style filter chains
//!
//! A composable tree of matchers (predicates) and actions (side effects) is
//! evaluated once per inbound request, deciding whether processing continues,
//! short-circuits with a response, or falls through to further rules.
//!
//! # Architecture
//!
//! - [`MatcherResult`] / [`ActionResult`] — Outcome vocabulary (`Terminate` is absorbing)
//! - [`Matcher<Req>`] / [`Action<Req>`] — The two capabilities a rule element can have
//! - [`Rule<Req>`] — Tagged union: matcher, action, or both
//! - [`FirewallContext<Req>`] — Per-request dispatch; combinators call children only through it
//! - [`and`], [`or`], [`not`], [`all`], [`none`] — Combinators with `otherwise` fallbacks
//! - [`AttributeMatcher`] — Generic `is` / `is_in` over one [`RequestAttribute`]
//!
//! # Key Design Insights
//!
//! 1. **Context-mediated dispatch**: tracing, recording or metrics are a
//!    different [`FirewallContext`], never a change to combinator logic.
//!
//! 2. **Stateless rules**: rule trees close over configuration only and are
//!    `Send + Sync`; all mutable state lives in the per-request `Req`.
//!
//! 3. **`None` attribute → no match**: an absent request attribute is not an
//!    error, it just matches no configured value.
//!
//! # Example
//!
//! ```
//! use portcullis::prelude::*;
//!
//! #[derive(Debug)]
//! struct Request { role: Option<String>, denied: bool }
//!
//! #[derive(Debug)]
//! struct Role;
//!
//! impl RequestAttribute<Request> for Role {
//!     type Value = String;
//!     fn name(&self) -> &'static str { "role" }
//!     fn read(&self, req: &Request) -> Option<String> { req.role.clone() }
//! }
//!
//! #[derive(Debug)]
//! struct Deny;
//!
//! impl Action<Request> for Deny {
//!     fn perform(
//!         &self,
//!         _cx: &dyn FirewallContext<Request>,
//!         req: &mut Request,
//!     ) -> Result<ActionResult, EvalError> {
//!         req.denied = true;
//!         Ok(ActionResult::Terminate)
//!     }
//! }
//!
//! let admin: Rule<Request> = AttributeMatcher::is(Role, "admin".to_string()).into();
//! let root: Rule<Request> = and(vec![admin])
//!     .otherwise(vec![Rule::action(Deny)])
//!     .into();
//!
//! let mut guest = Request { role: Some("guest".into()), denied: false };
//! let verdict = evaluate(&root, &DirectContext, &mut guest).unwrap();
//! assert_eq!(verdict, MatcherResult::Terminate);
//! assert!(guest.denied);
//! ```
//!
//! # Extensions
//!
//! - [`portcullis-http`](https://docs.rs/portcullis-http) — HTTP method negotiation, status actions
//! - [`portcullis-test`](https://docs.rs/portcullis-test) — Probe domain for conformance (internal)

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod attribute;
mod combinator;
mod context;
mod result;
mod rule;
mod trace;

#[cfg(feature = "registry")]
mod config;
#[cfg(feature = "registry")]
mod registry;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use attribute::{AttributeMatcher, RequestAttribute};
pub use combinator::{all, and, none, not, or, run_sequence, All, And, Never, Not, Or};
pub use context::{DirectContext, FirewallContext, TracingContext};
pub use result::{ActionResult, MatcherResult};
pub use rule::{Action, Matcher, Rule};

// Trace types
pub use trace::{evaluate_with_trace, EvalStep, EvalTrace, NodeKind, RecordingContext, StepOutcome};

// Registry (feature-gated)
#[cfg(feature = "registry")]
pub use config::{RuleConfig, TypedConfig, UnitConfig};
#[cfg(feature = "registry")]
pub use registry::{IntoRule, Registry, RegistryBuilder};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use portcullis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Combinators
        all,
        and,
        evaluate,
        none,
        not,
        or,
        // Core types
        Action,
        ActionResult,
        AttributeMatcher,
        // Errors
        ConfigError,
        DirectContext,
        EvalError,
        FirewallContext,
        Matcher,
        MatcherResult,
        RecordingContext,
        RequestAttribute,
        Rule,
        TracingContext,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum allowed nesting depth of a rule tree.
///
/// Evaluation recurses once per level. Validate at load time via
/// [`Rule::validate`].
pub const MAX_DEPTH: usize = 32;

/// Maximum number of rules in one sequence (`rules`, `otherwise`, `then`).
///
/// Width-based counterpart to [`MAX_DEPTH`], enforced by the registry.
pub const MAX_RULES_PER_SEQUENCE: usize = 256;

// ═══════════════════════════════════════════════════════════════════════════════
// Entry point
// ═══════════════════════════════════════════════════════════════════════════════

/// Evaluate a rule tree for one request.
///
/// The root is evaluated as a single sequence element, so an action root
/// reports `Match` on `Continue`. The host decides what `Match` / `NoMatch`
/// mean at the root; `Terminate` always means the response has been sent.
///
/// # Errors
///
/// Returns the first [`EvalError`] raised anywhere in the tree.
pub fn evaluate<Req>(
    root: &Rule<Req>,
    cx: &dyn FirewallContext<Req>,
    req: &mut Req,
) -> Result<MatcherResult, EvalError> {
    let verdict = root
        .evaluate(cx, req)
        .inspect_err(|error| tracing::error!(%error, "rule evaluation aborted"))?;
    tracing::debug!(%verdict, "rule tree evaluated");
    Ok(verdict)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from rule construction, loading and validation.
///
/// These are caught at load time, not evaluation time. Fix the
/// configuration and rebuild the rule tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Rule nesting exceeds [`MAX_DEPTH`].
    #[error(
        "rule nesting depth is {depth}, but maximum allowed is {max} \
         — reduce nesting or flatten your rule tree"
    )]
    DepthExceeded {
        /// Actual depth of the rule tree.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },
    /// Too many rules in a single sequence.
    #[error("rule sequence has {count} rules, but maximum allowed is {max}")]
    TooManyRules {
        /// Actual count of rules.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// Configuration deserialization or construction failed.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// The underlying error message.
        message: String,
    },
    /// A type URL was not found in the registry.
    #[error("unknown rule type URL \"{type_url}\"{}", describe_available(.available))]
    UnknownTypeUrl {
        /// The unregistered type URL.
        type_url: String,
        /// Type URLs that ARE registered (for self-correcting error messages).
        available: Vec<String>,
    },
    /// A status code outside the range HTTP can express.
    #[error("invalid status code {code}")]
    InvalidStatus {
        /// The rejected code.
        code: u16,
    },
    /// A method token that is not a valid HTTP method.
    #[error("invalid HTTP method \"{method}\"")]
    InvalidMethod {
        /// The rejected token.
        method: String,
    },
    /// A rule without a matcher capability where a matcher is required.
    #[error("{context} requires a matcher, but the rule is action-only or dual")]
    NotAMatcher {
        /// Where the matcher was required (e.g. `"not"`).
        context: &'static str,
    },
}

fn describe_available(available: &[String]) -> String {
    if available.is_empty() {
        " — no rule types are registered".to_string()
    } else {
        let mut sorted = available.to_vec();
        sorted.sort_unstable();
        format!(" — registered: {}", sorted.join(", "))
    }
}

/// Errors raised while evaluating a rule tree.
///
/// Either kind aborts evaluation and surfaces to the host. Nothing is
/// retried: terminating actions are one-shot side effects.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// The host failed to emit a response or continue the chain.
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),
    /// A leaf violated an engine invariant (a programming error).
    #[error("rule defect: {0}")]
    Defect(String),
}

impl EvalError {
    /// Build a [`EvalError::Defect`].
    pub fn defect(message: impl Into<String>) -> Self {
        Self::Defect(message.into())
    }
}
