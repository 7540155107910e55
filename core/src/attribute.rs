//! Request-attribute matchers
//!
//! One generic component covers every "compare one request attribute against
//! one value or a set of values" matcher. Domains supply a
//! [`RequestAttribute`] (method, dispatcher type, auth type, ...) and get
//! `is` / `is_in` with optional nested `then` / `otherwise` sequences for free.

use crate::{run_sequence, EvalError, FirewallContext, Matcher, MatcherResult, Rule};
use std::fmt::Debug;

/// Reads one attribute of a request.
///
/// # INV: None matches nothing
///
/// An absent attribute (e.g. no auth type on an unauthenticated request) is
/// not an error. It is simply not a member of any configured value set.
pub trait RequestAttribute<Req>: Send + Sync + Debug {
    /// The attribute's value type.
    type Value: PartialEq + Debug + Send + Sync;

    /// Short name used in debug output (e.g. `"method"`).
    fn name(&self) -> &'static str;

    /// Read the attribute, or `None` if the request does not carry it.
    fn read(&self, req: &Req) -> Option<Self::Value>;
}

/// Matches when a request attribute is one of a set of values.
///
/// Built with [`is`](Self::is) or [`is_in`](Self::is_in). Without nested
/// sequences the result is a bare `Match` / `NoMatch`. With
/// [`then`](Self::then) or [`otherwise`](Self::otherwise), the selected
/// sequence runs and its terminal verdict is returned instead.
///
/// An empty value set behaves like [`none`](crate::none): it answers
/// `NoMatch` and runs neither nested sequence.
pub struct AttributeMatcher<Req, A: RequestAttribute<Req>> {
    attribute: A,
    values: Vec<A::Value>,
    then: Option<Vec<Rule<Req>>>,
    otherwise: Option<Vec<Rule<Req>>>,
}

impl<Req, A: RequestAttribute<Req>> AttributeMatcher<Req, A> {
    /// Match when the attribute equals `value`.
    pub fn is(attribute: A, value: A::Value) -> Self {
        Self {
            attribute,
            values: vec![value],
            then: None,
            otherwise: None,
        }
    }

    /// Match when the attribute is any of `values`.
    ///
    /// Duplicates are dropped; first-seen order is kept.
    pub fn is_in(attribute: A, values: impl IntoIterator<Item = A::Value>) -> Self {
        let mut unique: Vec<A::Value> = Vec::new();
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self {
            attribute,
            values: unique,
            then: None,
            otherwise: None,
        }
    }

    /// Sequence to run when the attribute matches.
    #[must_use]
    pub fn then(mut self, rules: impl IntoIterator<Item = Rule<Req>>) -> Self {
        self.then = Some(rules.into_iter().collect());
        self
    }

    /// Sequence to run when the attribute does not match.
    #[must_use]
    pub fn otherwise(mut self, rules: impl IntoIterator<Item = Rule<Req>>) -> Self {
        self.otherwise = Some(rules.into_iter().collect());
        self
    }

    /// The configured value set.
    #[must_use]
    pub fn values(&self) -> &[A::Value] {
        &self.values
    }

    fn contains(&self, req: &Req) -> bool {
        self.attribute
            .read(req)
            .is_some_and(|actual| self.values.contains(&actual))
    }
}

impl<Req, A: RequestAttribute<Req>> Matcher<Req> for AttributeMatcher<Req, A> {
    fn evaluate(
        &self,
        cx: &dyn FirewallContext<Req>,
        req: &mut Req,
    ) -> Result<MatcherResult, EvalError> {
        if self.values.is_empty() {
            return Ok(MatcherResult::NoMatch);
        }

        let (branch, bare) = if self.contains(req) {
            (self.then.as_deref(), MatcherResult::Match)
        } else {
            (self.otherwise.as_deref(), MatcherResult::NoMatch)
        };

        match branch {
            Some(rules) => run_sequence(rules, cx, req),
            None => Ok(bare),
        }
    }

    fn depth(&self) -> usize {
        let nested = self
            .then
            .iter()
            .chain(self.otherwise.iter())
            .flat_map(|rules| rules.iter().map(Rule::depth))
            .max();
        nested.map_or(1, |depth| 1 + depth)
    }
}

impl<Req, A: RequestAttribute<Req>> Debug for AttributeMatcher<Req, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeMatcher")
            .field("attribute", &self.attribute.name())
            .field("values", &self.values)
            .field("then", &self.then.as_ref().map(Vec::len))
            .field("otherwise", &self.otherwise.as_ref().map(Vec::len))
            .finish()
    }
}

impl<Req: 'static, A: RequestAttribute<Req> + 'static> From<AttributeMatcher<Req, A>>
    for Rule<Req>
{
    fn from(matcher: AttributeMatcher<Req, A>) -> Self {
        Rule::matcher(matcher)
    }
}
