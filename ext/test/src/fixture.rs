//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the portcullis engine through
//! the registry config path: YAML → `RuleConfig` → `Registry::load()` →
//! evaluate.
//!
//! ```yaml
//! name: and stops at first no_match
//! rule:
//!   type: and
//!   rules:
//!     - { type: typed, type_url: portcullis.test.v1.Matcher, config: { label: a, result: no_match } }
//!     - { type: typed, type_url: portcullis.test.v1.Matcher, config: { label: b, result: match } }
//! cases:
//!   - name: b never runs
//!     expect: no_match
//!     calls: ["m:a"]
//! ```

use crate::TestContext;
use portcullis::prelude::*;
use portcullis::{evaluate_with_trace, Registry, RegistryBuilder, RuleConfig};
use serde::Deserialize;
use std::collections::HashMap;

/// A complete test fixture.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule: RuleConfig,
    #[serde(default)]
    pub cases: Vec<TestCase>,
    /// When set, loading must fail with an error whose message contains this text.
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Test case.
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub context: HashMap<String, String>,
    pub expect: MatcherResult,
    /// Exact probe invocation order, if asserted.
    #[serde(default)]
    pub calls: Option<Vec<String>>,
}

impl TestCase {
    /// Build a `TestContext` from this case's context map.
    pub fn build_context(&self) -> TestContext {
        let mut cx = TestContext::new();
        for (k, v) in &self.context {
            cx = cx.with(k.clone(), v.clone());
        }
        cx
    }
}

/// Result of running a single test case.
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: MatcherResult,
    pub actual: MatcherResult,
    pub expected_calls: Option<Vec<String>>,
    pub actual_calls: Vec<String>,
}

/// Registry with every probe type.
pub fn registry() -> Registry<TestContext> {
    crate::register(RegistryBuilder::new()).build()
}

impl Fixture {
    /// Parse multiple fixtures from a YAML file with `---` separators.
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Load the rule tree.
    ///
    /// # Errors
    ///
    /// Whatever the registry rejects.
    pub fn load(&self) -> Result<Rule<TestContext>, ConfigError> {
        registry().load(self.rule.clone())
    }

    /// Run all test cases and return results.
    ///
    /// Each case is also evaluated under a recording context; the recorded
    /// verdict must agree with the direct one.
    ///
    /// # Errors
    ///
    /// Loading or evaluation failures.
    pub fn run(&self) -> Result<Vec<CaseResult>, String> {
        let rule = self.load().map_err(|e| e.to_string())?;
        self.cases
            .iter()
            .map(|case| {
                let mut cx = case.build_context();
                let actual = evaluate(&rule, &DirectContext, &mut cx).map_err(|e| e.to_string())?;

                let traced = evaluate_with_trace(&rule, &mut case.build_context())
                    .map_err(|e| e.to_string())?;
                if traced.result != actual {
                    return Err(format!(
                        "case '{}': recording context answered {} but direct answered {actual}",
                        case.name, traced.result
                    ));
                }

                let actual_calls = cx.calls().to_vec();
                let calls_ok = case
                    .calls
                    .as_ref()
                    .map_or(true, |expected| *expected == actual_calls);
                Ok(CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == case.expect && calls_ok,
                    expected: case.expect,
                    actual,
                    expected_calls: case.calls.clone(),
                    actual_calls,
                })
            })
            .collect()
    }

    /// Run the fixture and panic on the first failure.
    pub fn run_and_assert(&self) {
        if let Some(expected) = &self.expect_error {
            match self.load() {
                Ok(_) => panic!("Fixture '{}' loaded but should fail with '{expected}'", self.name),
                Err(e) => assert!(
                    e.to_string().contains(expected.as_str()),
                    "Fixture '{}' failed with '{e}', expected '{expected}'",
                    self.name
                ),
            }
            return;
        }

        let results = self
            .run()
            .unwrap_or_else(|e| panic!("Fixture '{}' failed to run: {e}", self.name));
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {} {:?}, got {} {:?}",
                self.name,
                result.case_name,
                result.expected,
                result.expected_calls,
                result.actual,
                result.actual_calls
            );
        }
    }
}
