//! Config types for rule-tree construction.
//!
//! These types mirror the runtime combinators but are serde-deserializable,
//! enabling config-driven rule construction via [`Registry::load()`].
//!
//! # Relationship to runtime types
//!
//! | Config variant | Runtime type |
//! |----------------|--------------|
//! | `and` | [`And`](crate::And) |
//! | `or` | [`Or`](crate::Or) |
//! | `not` | [`Not`](crate::Not) |
//! | `all` | [`All`](crate::All) |
//! | `none` | [`Never`](crate::Never) |
//! | `typed` | any leaf registered via [`IntoRule`](crate::IntoRule) |
//!
//! [`Registry::load()`]: crate::Registry::load

use serde::Deserialize;

/// Configuration for one [`Rule`](crate::Rule).
///
/// Uses `#[serde(tag = "type")]` for discriminated union deserialization:
///
/// ```yaml
/// type: and
/// rules:
///   - type: typed
///     type_url: portcullis.http.v1.Method
///     config: { values: [GET] }
/// otherwise:
///   - type: typed
///     type_url: portcullis.http.v1.Status
///     config: { code: 403 }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Every matcher must match.
    And {
        /// The primary sequence.
        rules: Vec<RuleConfig>,
        /// Runs on the first `NoMatch`.
        #[serde(default)]
        otherwise: Option<Vec<RuleConfig>>,
    },

    /// Any matcher must match.
    Or {
        /// The primary sequence.
        rules: Vec<RuleConfig>,
        /// Runs when nothing matched.
        #[serde(default)]
        otherwise: Option<Vec<RuleConfig>>,
    },

    /// Negates one matcher.
    Not {
        /// Must load to a matcher-only rule.
        rule: Box<RuleConfig>,
    },

    /// Always matches, optionally running `rules`.
    All {
        /// Side-effect sequence.
        #[serde(default)]
        rules: Vec<RuleConfig>,
    },

    /// Never matches; `rules` are accepted and discarded.
    None {
        /// Disabled sequence.
        #[serde(default)]
        rules: Vec<RuleConfig>,
    },

    /// A registered leaf.
    Typed(TypedConfig),
}

/// Reference to a registered type with its configuration.
///
/// - `type_url` identifies the registered type
/// - `config` carries the type-specific configuration payload
#[derive(Debug, Clone, Deserialize)]
pub struct TypedConfig {
    /// The type URL identifying the registered leaf.
    /// Must match a `type_url` registered in the [`Registry`](crate::Registry).
    pub type_url: String,

    /// Type-specific configuration payload.
    /// Deserialized as the `Config` associated type of the registered [`IntoRule`](crate::IntoRule).
    #[serde(default = "default_config")]
    pub config: serde_json::Value,
}

fn default_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Empty configuration for leaves that need no parameters.
///
/// Accepts any value (`{}`, `null`, etc.) and ignores it.
#[derive(Debug, Clone, Copy)]
pub struct UnitConfig;

impl<'de> Deserialize<'de> for UnitConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(UnitConfig)
    }
}
