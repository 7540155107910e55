//! Type registry for config-driven rule construction.
//!
//! The registry enables **generic config loading**: JSON/YAML config -> compiled
//! `Rule<Req>` without domain-specific compile code.
//!
//! # Architecture (axum `BoxedIntoRoute` pattern)
//!
//! Each leaf type registers itself via [`IntoRule`]. At registration time, the
//! concrete type `T` is monomorphized into a closure and erased behind
//! `Box<dyn Fn>`: early type erasure at registration, late invocation at load
//! time. Combinators (`and`, `or`, `not`, `all`, `none`) are built in.
//!
//! Leaves with nested sequences (an attribute matcher's `then` / `otherwise`)
//! receive the registry and load those sequences through
//! [`Registry::load_sequence()`].
//!
//! # Example
//!
//! ```ignore
//! let registry = portcullis_http::register(RegistryBuilder::new()).build();
//!
//! let config: RuleConfig = serde_yaml::from_str(yaml)?;
//! let rule = registry.load(config)?;
//! ```

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::{
    config::{RuleConfig, TypedConfig},
    all, and, none, or, ConfigError, Not, Rule, MAX_RULES_PER_SEQUENCE,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Traits
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for leaf rule types that can be constructed from configuration.
///
/// Each leaf knows its own config shape via the associated `Config` type.
/// The registry calls [`from_config`](Self::from_config) at load time.
///
/// # Example
///
/// ```ignore
/// impl IntoRule<Exchange> for StatusFactory {
///     type Config = StatusConfig;
///     fn from_config(config: Self::Config, _: &Registry<Exchange>) -> Result<Rule<Exchange>, ConfigError> {
///         status::code(config.code)
///     }
/// }
/// ```
pub trait IntoRule<Req: 'static>: Send + Sync + 'static {
    /// The configuration type deserialized from JSON/YAML.
    type Config: DeserializeOwned + Send + Sync;

    /// Construct a rule from deserialized configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config is semantically invalid or a
    /// nested sequence fails to load.
    fn from_config(config: Self::Config, registry: &Registry<Req>) -> Result<Rule<Req>, ConfigError>;
}

/// Type-erased leaf factory closure.
type BoxedRuleFactory<Req> =
    Box<dyn Fn(&serde_json::Value, &Registry<Req>) -> Result<Rule<Req>, ConfigError> + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for constructing a [`Registry`].
///
/// Register leaf types with their type URLs, then call
/// [`build()`](Self::build) to produce an immutable `Registry`. No runtime
/// registration is possible after that.
pub struct RegistryBuilder<Req> {
    factories: HashMap<String, BoxedRuleFactory<Req>>,
}

impl<Req: 'static> RegistryBuilder<Req> {
    /// Create a new empty registry builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a leaf type with a type URL.
    ///
    /// At load time, the registry deserializes config as `T::Config` and calls
    /// `T::from_config()` to produce the rule. Registering the same URL twice
    /// keeps the later factory.
    #[must_use]
    pub fn rule<T: IntoRule<Req>>(mut self, type_url: &str) -> Self {
        self.factories.insert(
            type_url.to_owned(),
            Box::new(|value: &serde_json::Value, registry: &Registry<Req>| {
                let config: T::Config = serde_json::from_value(value.clone()).map_err(|e| {
                    ConfigError::InvalidConfig {
                        message: e.to_string(),
                    }
                })?;
                T::from_config(config, registry)
            }),
        );
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> Registry<Req> {
        Registry {
            factories: self.factories,
        }
    }
}

impl<Req: 'static> Default for RegistryBuilder<Req> {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable registry of leaf factories.
///
/// Constructed via [`RegistryBuilder`]. Use [`load()`](Self::load) to compile
/// config into a runtime [`Rule`].
pub struct Registry<Req> {
    factories: HashMap<String, BoxedRuleFactory<Req>>,
}

impl<Req: 'static> Registry<Req> {
    /// Load a rule tree from configuration and validate it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownTypeUrl`] — a leaf `type_url` is not registered
    /// - [`ConfigError::InvalidConfig`] — leaf config deserialization failed
    /// - [`ConfigError::TooManyRules`] — a sequence exceeds [`MAX_RULES_PER_SEQUENCE`]
    /// - [`ConfigError::NotAMatcher`] — `not` wraps an action or dual rule
    /// - [`ConfigError::DepthExceeded`] — nesting exceeds [`MAX_DEPTH`](crate::MAX_DEPTH)
    pub fn load(&self, config: RuleConfig) -> Result<Rule<Req>, ConfigError> {
        let rule = self.build_rule(config)?;
        rule.validate()?;
        Ok(rule)
    }

    /// Load a rule sequence (for nested `then` / `otherwise` lists).
    ///
    /// Depth is not validated here; the enclosing [`load()`](Self::load)
    /// validates the whole tree.
    ///
    /// # Errors
    ///
    /// Same as [`load()`](Self::load), minus the depth check.
    pub fn load_sequence(&self, configs: Vec<RuleConfig>) -> Result<Vec<Rule<Req>>, ConfigError> {
        if configs.len() > MAX_RULES_PER_SEQUENCE {
            return Err(ConfigError::TooManyRules {
                count: configs.len(),
                max: MAX_RULES_PER_SEQUENCE,
            });
        }
        configs.into_iter().map(|c| self.build_rule(c)).collect()
    }

    /// Returns the number of registered leaf types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no leaf types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns `true` if the given type URL is registered.
    #[must_use]
    pub fn contains(&self, type_url: &str) -> bool {
        self.factories.contains_key(type_url)
    }

    /// Returns all registered type URLs (sorted).
    #[must_use]
    pub fn type_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    fn build_rule(&self, config: RuleConfig) -> Result<Rule<Req>, ConfigError> {
        match config {
            RuleConfig::And { rules, otherwise } => {
                let mut rule = and(self.load_sequence(rules)?);
                if let Some(otherwise) = otherwise {
                    rule = rule.otherwise(self.load_sequence(otherwise)?);
                }
                Ok(rule.into())
            }
            RuleConfig::Or { rules, otherwise } => {
                let mut rule = or(self.load_sequence(rules)?);
                if let Some(otherwise) = otherwise {
                    rule = rule.otherwise(self.load_sequence(otherwise)?);
                }
                Ok(rule.into())
            }
            RuleConfig::Not { rule } => match self.build_rule(*rule)? {
                Rule::Matcher(inner) => Ok(Not::from_shared(inner).into()),
                _ => Err(ConfigError::NotAMatcher { context: "not" }),
            },
            RuleConfig::All { rules } => Ok(all().then(self.load_sequence(rules)?).into()),
            RuleConfig::None { rules } => {
                // Still loaded so a disabled branch is checked like a live one.
                Ok(none().then(self.load_sequence(rules)?).into())
            }
            RuleConfig::Typed(typed) => self.build_typed(&typed),
        }
    }

    fn build_typed(&self, config: &TypedConfig) -> Result<Rule<Req>, ConfigError> {
        let factory =
            self.factories
                .get(&config.type_url)
                .ok_or_else(|| ConfigError::UnknownTypeUrl {
                    type_url: config.type_url.clone(),
                    available: self.factories.keys().cloned().collect(),
                })?;
        factory(&config.config, self)
    }
}

impl<Req> std::fmt::Debug for Registry<Req> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut urls: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        urls.sort_unstable();
        f.debug_struct("Registry").field("type_urls", &urls).finish()
    }
}
