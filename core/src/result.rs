//! Outcome vocabulary shared by matchers and actions.
//!
//! Matchers answer with a three-valued [`MatcherResult`], actions with a
//! two-valued [`ActionResult`]. Both carry `Terminate`, which is the only
//! cancellation signal in the engine.

use std::fmt;

/// Result of evaluating a [`Matcher`](crate::Matcher).
///
/// # INV: Terminate is absorbing
///
/// Once any node answers `Terminate`, every enclosing combinator returns
/// `Terminate` immediately. No sibling and no `otherwise` branch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MatcherResult {
    /// The predicate holds.
    Match,
    /// The predicate does not hold.
    NoMatch,
    /// A nested action already finished the request.
    Terminate,
}

impl MatcherResult {
    /// Build `Match` or `NoMatch` from a boolean.
    #[must_use]
    pub fn from_bool(matched: bool) -> Self {
        if matched {
            Self::Match
        } else {
            Self::NoMatch
        }
    }

    /// Returns `true` for `Match`.
    #[must_use]
    pub fn is_match(self) -> bool {
        self == Self::Match
    }

    /// Returns `true` for `Terminate`.
    #[must_use]
    pub fn is_terminate(self) -> bool {
        self == Self::Terminate
    }

    /// Swap `Match` and `NoMatch`, leaving `Terminate` untouched.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Match => Self::NoMatch,
            Self::NoMatch => Self::Match,
            Self::Terminate => Self::Terminate,
        }
    }
}

impl fmt::Display for MatcherResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Match => "match",
            Self::NoMatch => "no_match",
            Self::Terminate => "terminate",
        })
    }
}

/// Result of performing an [`Action`](crate::Action).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActionResult {
    /// Processing proceeds to the next rule.
    Continue,
    /// The action fully handled the request.
    Terminate,
}

impl ActionResult {
    /// Returns `true` for `Terminate`.
    #[must_use]
    pub fn is_terminate(self) -> bool {
        self == Self::Terminate
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Continue => "continue",
            Self::Terminate => "terminate",
        })
    }
}

/// An action inside a sequence: `Continue` keeps the sequence matching.
impl From<ActionResult> for MatcherResult {
    fn from(result: ActionResult) -> Self {
        match result {
            ActionResult::Continue => Self::Match,
            ActionResult::Terminate => Self::Terminate,
        }
    }
}
