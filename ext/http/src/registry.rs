//! Registry bindings for the HTTP domain.
//!
//! | Type URL | Config |
//! |----------|--------|
//! | `portcullis.http.v1.Method` | `{ values: [GET, ...], then?, otherwise? }` |
//! | `portcullis.http.v1.DispatcherType` | `{ values: [REQUEST, ...], then?, otherwise? }` |
//! | `portcullis.http.v1.AuthType` | `{ values: [BASIC, ...], then?, otherwise? }` |
//! | `portcullis.http.v1.Constrain` | `{ methods: [GET, ...] }` |
//! | `portcullis.http.v1.Status` | `{ code: 404, message? }` |
//! | `portcullis.http.v1.Proceed` | `{}` |

use crate::{
    chain, constrain, status, AuthTypeAttribute, DispatcherType, DispatcherTypeAttribute,
    HttpExchange, MethodAttribute,
};
use http::{Method, StatusCode};
use portcullis::{
    AttributeMatcher, ConfigError, IntoRule, Registry, RegistryBuilder, RequestAttribute, Rule,
    RuleConfig, UnitConfig,
};
use serde::Deserialize;

/// Register every HTTP leaf type.
#[must_use]
pub fn register<X: HttpExchange + 'static>(builder: RegistryBuilder<X>) -> RegistryBuilder<X> {
    builder
        .rule::<MethodRule>("portcullis.http.v1.Method")
        .rule::<DispatcherTypeRule>("portcullis.http.v1.DispatcherType")
        .rule::<AuthTypeRule>("portcullis.http.v1.AuthType")
        .rule::<ConstrainRule>("portcullis.http.v1.Constrain")
        .rule::<StatusRule>("portcullis.http.v1.Status")
        .rule::<ProceedRule>("portcullis.http.v1.Proceed")
}

/// Shared shape of the attribute-matcher configs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeConfig<V> {
    /// Values that count as a match. Empty never matches.
    pub values: Vec<V>,
    /// Runs on match.
    #[serde(default)]
    pub then: Option<Vec<RuleConfig>>,
    /// Runs on mismatch.
    #[serde(default)]
    pub otherwise: Option<Vec<RuleConfig>>,
}

fn attribute_rule<X, A>(
    attribute: A,
    values: Vec<A::Value>,
    then: Option<Vec<RuleConfig>>,
    otherwise: Option<Vec<RuleConfig>>,
    registry: &Registry<X>,
) -> Result<Rule<X>, ConfigError>
where
    X: HttpExchange + 'static,
    A: RequestAttribute<X> + 'static,
{
    let mut matcher = AttributeMatcher::is_in(attribute, values);
    if let Some(then) = then {
        matcher = matcher.then(registry.load_sequence(then)?);
    }
    if let Some(otherwise) = otherwise {
        matcher = matcher.otherwise(registry.load_sequence(otherwise)?);
    }
    Ok(matcher.into())
}

fn parse_methods(tokens: Vec<String>) -> Result<Vec<Method>, ConfigError> {
    tokens
        .into_iter()
        .map(|token| {
            Method::from_bytes(token.as_bytes())
                .map_err(|_| ConfigError::InvalidMethod { method: token })
        })
        .collect()
}

/// Factory for `portcullis.http.v1.Method`.
#[derive(Debug)]
pub struct MethodRule;

impl<X: HttpExchange + 'static> IntoRule<X> for MethodRule {
    type Config = AttributeConfig<String>;

    fn from_config(config: Self::Config, registry: &Registry<X>) -> Result<Rule<X>, ConfigError> {
        let methods = parse_methods(config.values)?;
        attribute_rule(MethodAttribute, methods, config.then, config.otherwise, registry)
    }
}

/// Factory for `portcullis.http.v1.DispatcherType`.
#[derive(Debug)]
pub struct DispatcherTypeRule;

impl<X: HttpExchange + 'static> IntoRule<X> for DispatcherTypeRule {
    type Config = AttributeConfig<DispatcherType>;

    fn from_config(config: Self::Config, registry: &Registry<X>) -> Result<Rule<X>, ConfigError> {
        attribute_rule(
            DispatcherTypeAttribute,
            config.values,
            config.then,
            config.otherwise,
            registry,
        )
    }
}

/// Factory for `portcullis.http.v1.AuthType`.
#[derive(Debug)]
pub struct AuthTypeRule;

impl<X: HttpExchange + 'static> IntoRule<X> for AuthTypeRule {
    type Config = AttributeConfig<String>;

    fn from_config(config: Self::Config, registry: &Registry<X>) -> Result<Rule<X>, ConfigError> {
        attribute_rule(AuthTypeAttribute, config.values, config.then, config.otherwise, registry)
    }
}

/// Config for `portcullis.http.v1.Constrain`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstrainConfig {
    /// Allowed method tokens.
    pub methods: Vec<String>,
}

/// Factory for `portcullis.http.v1.Constrain`.
#[derive(Debug)]
pub struct ConstrainRule;

impl<X: HttpExchange + 'static> IntoRule<X> for ConstrainRule {
    type Config = ConstrainConfig;

    fn from_config(config: Self::Config, _: &Registry<X>) -> Result<Rule<X>, ConfigError> {
        Ok(constrain(parse_methods(config.methods)?).into())
    }
}

/// Config for `portcullis.http.v1.Status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    /// Numeric status code.
    pub code: u16,
    /// Optional error message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Factory for `portcullis.http.v1.Status`.
#[derive(Debug)]
pub struct StatusRule;

impl<X: HttpExchange + 'static> IntoRule<X> for StatusRule {
    type Config = StatusConfig;

    fn from_config(config: Self::Config, _: &Registry<X>) -> Result<Rule<X>, ConfigError> {
        match config.message {
            None => status::code(config.code),
            Some(message) => {
                let code = StatusCode::from_u16(config.code)
                    .map_err(|_| ConfigError::InvalidStatus { code: config.code })?;
                Ok(status::with_message(code, message))
            }
        }
    }
}

/// Factory for `portcullis.http.v1.Proceed`.
#[derive(Debug)]
pub struct ProceedRule;

impl<X: HttpExchange + 'static> IntoRule<X> for ProceedRule {
    type Config = UnitConfig;

    fn from_config(_: UnitConfig, _: &Registry<X>) -> Result<Rule<X>, ConfigError> {
        Ok(chain::proceed().into())
    }
}
