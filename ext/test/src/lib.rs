//! portcullis-test: Probe domain for conformance testing
//!
//! Provides a key-value request and probe rules that record every capability
//! invocation, so fixtures can assert both the verdict and the exact order in
//! which matchers and actions ran.
//!
//! # Example
//!
//! ```
//! use portcullis_test::prelude::*;
//!
//! let root: Rule<TestContext> = and(vec![
//!     probe::matcher("a", MatcherResult::Match),
//!     probe::action("b", ActionResult::Continue),
//!     probe::matcher("c", MatcherResult::NoMatch),
//!     probe::action("d", ActionResult::Continue),
//! ])
//! .into();
//!
//! let mut cx = TestContext::new();
//! let verdict = evaluate(&root, &DirectContext, &mut cx).unwrap();
//!
//! assert_eq!(verdict, MatcherResult::NoMatch);
//! assert_eq!(cx.calls(), ["m:a", "a:b", "m:c"]);
//! ```

use portcullis::prelude::*;
use std::collections::HashMap;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// Test request: a string-to-string map plus a call log.
///
/// Probes append `"m:<label>"` when their matcher runs and `"a:<label>"`
/// when their action runs.
#[derive(Debug, Clone, Default)]
pub struct TestContext {
    values: HashMap<String, String>,
    calls: Vec<String>,
}

impl TestContext {
    /// Create an empty test context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key-value pair (builder pattern).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Every probe invocation so far, in order.
    #[must_use]
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    fn record(&mut self, kind: char, label: &str) {
        self.calls.push(format!("{kind}:{label}"));
    }
}

/// Reads one key of the [`TestContext`]. Missing keys are absent.
#[derive(Debug, Clone)]
pub struct KeyAttribute {
    key: String,
}

impl KeyAttribute {
    /// Read `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl RequestAttribute<TestContext> for KeyAttribute {
    type Value = String;

    fn name(&self) -> &'static str {
        "key"
    }

    fn read(&self, req: &TestContext) -> Option<String> {
        req.get(&self.key).map(str::to_owned)
    }
}

/// Matcher that records itself and answers a fixed result.
#[derive(Debug, Clone)]
pub struct ProbeMatcher {
    label: String,
    result: MatcherResult,
}

impl Matcher<TestContext> for ProbeMatcher {
    fn evaluate(
        &self,
        _cx: &dyn FirewallContext<TestContext>,
        req: &mut TestContext,
    ) -> Result<MatcherResult, EvalError> {
        req.record('m', &self.label);
        Ok(self.result)
    }
}

/// Action that records itself and answers a fixed result.
#[derive(Debug, Clone)]
pub struct ProbeAction {
    label: String,
    result: ActionResult,
}

impl Action<TestContext> for ProbeAction {
    fn perform(
        &self,
        _cx: &dyn FirewallContext<TestContext>,
        req: &mut TestContext,
    ) -> Result<ActionResult, EvalError> {
        req.record('a', &self.label);
        Ok(self.result)
    }
}

/// Element with both capabilities, recording each under the same label.
#[derive(Debug, Clone)]
pub struct ProbeBoth {
    matcher: ProbeMatcher,
    action: ProbeAction,
}

impl Matcher<TestContext> for ProbeBoth {
    fn evaluate(
        &self,
        cx: &dyn FirewallContext<TestContext>,
        req: &mut TestContext,
    ) -> Result<MatcherResult, EvalError> {
        self.matcher.evaluate(cx, req)
    }
}

impl Action<TestContext> for ProbeBoth {
    fn perform(
        &self,
        cx: &dyn FirewallContext<TestContext>,
        req: &mut TestContext,
    ) -> Result<ActionResult, EvalError> {
        self.action.perform(cx, req)
    }
}

/// Probe constructors.
pub mod probe {
    use super::{ProbeAction, ProbeBoth, ProbeMatcher, TestContext};
    use portcullis::{ActionResult, MatcherResult, Rule};

    /// Matcher-only probe.
    pub fn matcher(label: impl Into<String>, result: MatcherResult) -> Rule<TestContext> {
        Rule::matcher(ProbeMatcher {
            label: label.into(),
            result,
        })
    }

    /// Action-only probe.
    pub fn action(label: impl Into<String>, result: ActionResult) -> Rule<TestContext> {
        Rule::action(ProbeAction {
            label: label.into(),
            result,
        })
    }

    /// Dual probe: matcher first, action only after `Match`.
    pub fn both(
        label: impl Into<String>,
        matcher: MatcherResult,
        action: ActionResult,
    ) -> Rule<TestContext> {
        let label = label.into();
        Rule::both(ProbeBoth {
            matcher: ProbeMatcher {
                label: label.clone(),
                result: matcher,
            },
            action: ProbeAction {
                label,
                result: action,
            },
        })
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{probe, KeyAttribute, TestContext};
    pub use portcullis::prelude::*;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry support (feature = "registry")
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "registry")]
mod registry {
    use super::{probe, KeyAttribute, TestContext};
    use portcullis::{
        ActionResult, AttributeMatcher, ConfigError, IntoRule, MatcherResult, Registry, Rule,
        RuleConfig,
    };
    use serde::Deserialize;

    /// Config for `portcullis.test.v1.Matcher`.
    #[derive(Debug, Deserialize)]
    pub struct MatcherProbeConfig {
        pub label: String,
        pub result: MatcherResult,
    }

    /// Config for `portcullis.test.v1.Action`.
    #[derive(Debug, Deserialize)]
    pub struct ActionProbeConfig {
        pub label: String,
        pub result: ActionResult,
    }

    /// Config for `portcullis.test.v1.Both`.
    #[derive(Debug, Deserialize)]
    pub struct BothProbeConfig {
        pub label: String,
        pub matcher: MatcherResult,
        pub action: ActionResult,
    }

    /// Config for `portcullis.test.v1.Key`.
    #[derive(Debug, Deserialize)]
    pub struct KeyConfig {
        pub key: String,
        pub values: Vec<String>,
        #[serde(default)]
        pub then: Option<Vec<RuleConfig>>,
        #[serde(default)]
        pub otherwise: Option<Vec<RuleConfig>>,
    }

    pub struct MatcherProbe;
    pub struct ActionProbe;
    pub struct BothProbe;
    pub struct Key;

    impl IntoRule<TestContext> for MatcherProbe {
        type Config = MatcherProbeConfig;
        fn from_config(c: Self::Config, _: &Registry<TestContext>) -> Result<Rule<TestContext>, ConfigError> {
            Ok(probe::matcher(c.label, c.result))
        }
    }

    impl IntoRule<TestContext> for ActionProbe {
        type Config = ActionProbeConfig;
        fn from_config(c: Self::Config, _: &Registry<TestContext>) -> Result<Rule<TestContext>, ConfigError> {
            Ok(probe::action(c.label, c.result))
        }
    }

    impl IntoRule<TestContext> for BothProbe {
        type Config = BothProbeConfig;
        fn from_config(c: Self::Config, _: &Registry<TestContext>) -> Result<Rule<TestContext>, ConfigError> {
            Ok(probe::both(c.label, c.matcher, c.action))
        }
    }

    impl IntoRule<TestContext> for Key {
        type Config = KeyConfig;
        fn from_config(c: Self::Config, registry: &Registry<TestContext>) -> Result<Rule<TestContext>, ConfigError> {
            let mut matcher = AttributeMatcher::is_in(KeyAttribute::new(c.key), c.values);
            if let Some(then) = c.then {
                matcher = matcher.then(registry.load_sequence(then)?);
            }
            if let Some(otherwise) = c.otherwise {
                matcher = matcher.otherwise(registry.load_sequence(otherwise)?);
            }
            Ok(matcher.into())
        }
    }
}

#[cfg(feature = "registry")]
pub use registry::{ActionProbeConfig, BothProbeConfig, KeyConfig, MatcherProbeConfig};

/// Register all portcullis-test types with the given builder.
///
/// - `portcullis.test.v1.Matcher` → [`probe::matcher`]
/// - `portcullis.test.v1.Action` → [`probe::action`]
/// - `portcullis.test.v1.Both` → [`probe::both`]
/// - `portcullis.test.v1.Key` → [`KeyAttribute`] matcher with `then` / `otherwise`
#[cfg(feature = "registry")]
#[must_use]
pub fn register(
    builder: portcullis::RegistryBuilder<TestContext>,
) -> portcullis::RegistryBuilder<TestContext> {
    builder
        .rule::<registry::MatcherProbe>("portcullis.test.v1.Matcher")
        .rule::<registry::ActionProbe>("portcullis.test.v1.Action")
        .rule::<registry::BothProbe>("portcullis.test.v1.Both")
        .rule::<registry::Key>("portcullis.test.v1.Key")
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_context_builder() {
        let cx = TestContext::new().with("foo", "bar").with("baz", "qux");
        assert_eq!(cx.get("foo"), Some("bar"));
        assert_eq!(cx.get("baz"), Some("qux"));
        assert_eq!(cx.get("missing"), None);
    }

    #[test]
    fn key_attribute_reads_values() {
        let rule: Rule<TestContext> =
            AttributeMatcher::is(KeyAttribute::new("role"), "admin".to_string()).into();
        let mut admin = TestContext::new().with("role", "admin");
        let mut anon = TestContext::new();
        assert_eq!(evaluate(&rule, &DirectContext, &mut admin).unwrap(), MatcherResult::Match);
        assert_eq!(evaluate(&rule, &DirectContext, &mut anon).unwrap(), MatcherResult::NoMatch);
    }

    #[test]
    fn both_probe_logs_matcher_then_action() {
        let rule = probe::both("x", MatcherResult::Match, ActionResult::Continue);
        let mut cx = TestContext::new();
        assert_eq!(evaluate(&rule, &DirectContext, &mut cx).unwrap(), MatcherResult::Match);
        assert_eq!(cx.calls(), ["m:x", "a:x"]);
    }

    #[test]
    fn or_skips_later_matchers_but_runs_their_actions() {
        let rule: Rule<TestContext> = or(vec![
            probe::matcher("a", MatcherResult::Match),
            probe::both("b", MatcherResult::NoMatch, ActionResult::Continue),
            probe::matcher("c", MatcherResult::Match),
            probe::action("d", ActionResult::Continue),
        ])
        .into();
        let mut cx = TestContext::new();
        assert_eq!(evaluate(&rule, &DirectContext, &mut cx).unwrap(), MatcherResult::Match);
        assert_eq!(cx.calls(), ["m:a", "a:b", "a:d"]);
    }

    #[cfg(feature = "registry")]
    #[test]
    fn registry_loads_probes() {
        let registry = crate::register(portcullis::RegistryBuilder::new()).build();
        let config: portcullis::RuleConfig = serde_json::from_value(serde_json::json!({
            "type": "or",
            "rules": [
                { "type": "typed", "type_url": "portcullis.test.v1.Matcher",
                  "config": { "label": "a", "result": "no_match" } }
            ],
            "otherwise": [
                { "type": "typed", "type_url": "portcullis.test.v1.Action",
                  "config": { "label": "deny", "result": "terminate" } }
            ]
        }))
        .unwrap();
        let rule = registry.load(config).unwrap();
        let mut cx = TestContext::new();
        assert_eq!(evaluate(&rule, &DirectContext, &mut cx).unwrap(), MatcherResult::Terminate);
        assert_eq!(cx.calls(), ["m:a", "a:deny"]);
    }
}
