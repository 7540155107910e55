//! Combinators — `and`, `or`, `not`, `all`, `none`
//!
//! Each combinator is itself a [`Matcher`], built from a sequence of [`Rule`]s.
//! Sequences are evaluated in caller order; `Terminate` from any child is
//! returned immediately by every enclosing combinator.
//!
//! # Example
//!
//! ```ignore
//! let rule: Rule<Exchange> = or(vec![
//!     method::is(Method::GET).into(),
//!     method::is(Method::HEAD).into(),
//! ])
//! .otherwise(vec![status::send(StatusCode::FORBIDDEN)])
//! .into();
//! ```

use crate::{EvalError, FirewallContext, Matcher, MatcherResult, Rule};
use std::fmt::Debug;
use std::sync::Arc;

/// Run a rule sequence and return its own terminal verdict.
///
/// Iterates in order: `Terminate` and `NoMatch` stop the sequence and are
/// returned as-is; a completed sequence is `Match`. Actions that `Continue`
/// count as matching. An empty sequence is `Match`.
///
/// # Errors
///
/// Propagates the first [`EvalError`] raised by a child.
pub fn run_sequence<Req>(
    rules: &[Rule<Req>],
    cx: &dyn FirewallContext<Req>,
    req: &mut Req,
) -> Result<MatcherResult, EvalError> {
    for rule in rules {
        match rule.evaluate(cx, req)? {
            MatcherResult::Match => {}
            verdict => return Ok(verdict),
        }
    }
    Ok(MatcherResult::Match)
}

fn sequence_depth<Req>(rules: &[Rule<Req>]) -> usize {
    rules.iter().map(Rule::depth).max().unwrap_or(0)
}

fn otherwise_depth<Req>(otherwise: Option<&Vec<Rule<Req>>>) -> usize {
    otherwise.map_or(0, |rules| sequence_depth(rules))
}

// ═══════════════════════════════════════════════════════════════════════════════
// and
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches iff every matcher in the sequence matches.
///
/// Actions interleaved among the matchers run in order for as long as matching
/// continues. The first `NoMatch` stops the sequence; if an `otherwise`
/// sequence is set it runs next and its verdict is returned.
///
/// An empty `and` is vacuously `Match` and never runs `otherwise`.
pub struct And<Req> {
    rules: Vec<Rule<Req>>,
    otherwise: Option<Vec<Rule<Req>>>,
}

impl<Req> And<Req> {
    /// Create an `and` over the given sequence.
    pub fn new(rules: impl IntoIterator<Item = Rule<Req>>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            otherwise: None,
        }
    }

    /// Set the sequence to run when a matcher answers `NoMatch`.
    #[must_use]
    pub fn otherwise(mut self, rules: impl IntoIterator<Item = Rule<Req>>) -> Self {
        self.otherwise = Some(rules.into_iter().collect());
        self
    }

    /// The primary sequence.
    #[must_use]
    pub fn rules(&self) -> &[Rule<Req>] {
        &self.rules
    }
}

impl<Req> Matcher<Req> for And<Req> {
    fn evaluate(
        &self,
        cx: &dyn FirewallContext<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        match run_sequence(&self.rules, cx, req)? {
            MatcherResult::NoMatch => match &self.otherwise {
                Some(otherwise) => run_sequence(otherwise, cx, req),
                None => Ok(MatcherResult::NoMatch),
            },
            verdict => Ok(verdict),
        }
    }

    fn depth(&self) -> usize {
        1 + sequence_depth(&self.rules).max(otherwise_depth(self.otherwise.as_ref()))
    }
}

impl<Req> Debug for And<Req> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("And")
            .field("rules", &self.rules.len())
            .field("otherwise", &self.otherwise.as_ref().map(Vec::len))
            .finish()
    }
}

/// Build an [`And`] over `rules`.
pub fn and<Req>(rules: impl IntoIterator<Item = Rule<Req>>) -> And<Req> {
    And::new(rules)
}

// ═══════════════════════════════════════════════════════════════════════════════
// or
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches iff any matcher in the sequence matches.
///
/// Matchers are evaluated until the first `Match`. From that element onward
/// (including the matched element itself) only action capabilities run;
/// later matcher capabilities are never evaluated. Action-only elements
/// before the first match are skipped.
///
/// Without a match, `otherwise` runs if set. An empty `or` is `NoMatch`.
pub struct Or<Req> {
    rules: Vec<Rule<Req>>,
    otherwise: Option<Vec<Rule<Req>>>,
}

impl<Req> Or<Req> {
    /// Create an `or` over the given sequence.
    pub fn new(rules: impl IntoIterator<Item = Rule<Req>>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            otherwise: None,
        }
    }

    /// Set the sequence to run when nothing matched.
    #[must_use]
    pub fn otherwise(mut self, rules: impl IntoIterator<Item = Rule<Req>>) -> Self {
        self.otherwise = Some(rules.into_iter().collect());
        self
    }

    /// The primary sequence.
    #[must_use]
    pub fn rules(&self) -> &[Rule<Req>] {
        &self.rules
    }
}

impl<Req> Matcher<Req> for Or<Req> {
    fn evaluate(
        &self,
        cx: &dyn FirewallContext<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        let mut matched = false;

        for rule in &self.rules {
            if !matched {
                let Some(matcher) = rule.as_matcher() else {
                    continue;
                };
                match cx.call_matcher(matcher, req)? {
                    MatcherResult::Terminate => return Ok(MatcherResult::Terminate),
                    MatcherResult::Match => matched = true,
                    MatcherResult::NoMatch => continue,
                }
            }

            if let Some(action) = rule.as_action() {
                if cx.call_action(action, req)?.is_terminate() {
                    return Ok(MatcherResult::Terminate);
                }
            }
        }

        if matched {
            return Ok(MatcherResult::Match);
        }
        match &self.otherwise {
            Some(otherwise) => run_sequence(otherwise, cx, req),
            None => Ok(MatcherResult::NoMatch),
        }
    }

    fn depth(&self) -> usize {
        1 + sequence_depth(&self.rules).max(otherwise_depth(self.otherwise.as_ref()))
    }
}

impl<Req> Debug for Or<Req> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Or")
            .field("rules", &self.rules.len())
            .field("otherwise", &self.otherwise.as_ref().map(Vec::len))
            .finish()
    }
}

/// Build an [`Or`] over `rules`.
pub fn or<Req>(rules: impl IntoIterator<Item = Rule<Req>>) -> Or<Req> {
    Or::new(rules)
}

// ═══════════════════════════════════════════════════════════════════════════════
// not
// ═══════════════════════════════════════════════════════════════════════════════

/// Negates exactly one matcher.
///
/// `Match` and `NoMatch` swap; `Terminate` passes through. Only a pure
/// predicate can be negated, so `Not` never takes a rule list.
pub struct Not<Req> {
    inner: Arc<dyn Matcher<Req>>,
}

impl<Req> Not<Req> {
    /// Negate a shared matcher.
    #[must_use]
    pub fn from_shared(inner: Arc<dyn Matcher<Req>>) -> Self {
        Self { inner }
    }
}

impl<Req> Matcher<Req> for Not<Req> {
    fn evaluate(
        &self,
        cx: &dyn FirewallContext<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        cx.call_matcher(self.inner.as_ref(), req)
            .map(MatcherResult::negate)
    }

    fn depth(&self) -> usize {
        1 + self.inner.depth()
    }
}

impl<Req> Debug for Not<Req> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Not").field(&self.inner).finish()
    }
}

/// Negate `matcher`.
pub fn not<Req, M>(matcher: M) -> Not<Req>
where
    M: Matcher<Req> + 'static,
{
    Not::from_shared(Arc::new(matcher))
}

// ═══════════════════════════════════════════════════════════════════════════════
// all / none
// ═══════════════════════════════════════════════════════════════════════════════

/// Always matches.
///
/// With rules attached via [`then`](Self::then), they run as a sequence and
/// only a `Terminate` is reported; a `NoMatch` inside them does not change
/// the result. Used to splice always-run side effects into a branch.
pub struct All<Req> {
    rules: Vec<Rule<Req>>,
}

impl<Req> All<Req> {
    /// Attach rules that run whenever this matcher is evaluated.
    #[must_use]
    pub fn then(mut self, rules: impl IntoIterator<Item = Rule<Req>>) -> Self {
        self.rules = rules.into_iter().collect();
        self
    }
}

impl<Req> Matcher<Req> for All<Req> {
    fn evaluate(
        &self,
        cx: &dyn FirewallContext<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        match run_sequence(&self.rules, cx, req)? {
            MatcherResult::Terminate => Ok(MatcherResult::Terminate),
            _ => Ok(MatcherResult::Match),
        }
    }

    fn depth(&self) -> usize {
        1 + sequence_depth(&self.rules)
    }
}

impl<Req> Debug for All<Req> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("All").field("rules", &self.rules.len()).finish()
    }
}

/// The matcher that always matches.
#[must_use]
pub fn all<Req>() -> All<Req> {
    All { rules: Vec::new() }
}

/// Never matches.
///
/// [`then`](Self::then) accepts and discards a rule list, so a conditional
/// branch can be switched off without deleting it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Never {
    /// Discard `rules`; the result still never matches.
    #[must_use]
    pub fn then<Req>(self, rules: impl IntoIterator<Item = Rule<Req>>) -> Self {
        drop(rules);
        self
    }
}

impl<Req> Matcher<Req> for Never {
    fn evaluate(
        &self,
        _cx: &dyn FirewallContext<Req>,
        _req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        Ok(MatcherResult::NoMatch)
    }
}

/// The matcher that never matches.
#[must_use]
pub fn none() -> Never {
    Never
}

// ═══════════════════════════════════════════════════════════════════════════════
// Into Rule
// ═══════════════════════════════════════════════════════════════════════════════

impl<Req: 'static> From<And<Req>> for Rule<Req> {
    fn from(matcher: And<Req>) -> Self {
        Rule::matcher(matcher)
    }
}

impl<Req: 'static> From<Or<Req>> for Rule<Req> {
    fn from(matcher: Or<Req>) -> Self {
        Rule::matcher(matcher)
    }
}

impl<Req: 'static> From<Not<Req>> for Rule<Req> {
    fn from(matcher: Not<Req>) -> Self {
        Rule::matcher(matcher)
    }
}

impl<Req: 'static> From<All<Req>> for Rule<Req> {
    fn from(matcher: All<Req>) -> Self {
        Rule::matcher(matcher)
    }
}

impl<Req: 'static> From<Never> for Rule<Req> {
    fn from(matcher: Never) -> Self {
        Rule::matcher(matcher)
    }
}
