//! portcullis-http: HTTP domain for rule trees
//!
//! This crate provides the leaves a web filter chain needs on top of the
//! `portcullis` algebra:
//!
//! 1. **Host boundary**: [`HttpExchange`] / [`HttpResponse`], implemented by the host
//! 2. **Attributes**: [`method`], [`dispatcher`], [`auth_type`] matchers
//! 3. **Actions**: [`constrain()`] method negotiation, [`status`] responses, [`proceed()`]
//!
//! # Architecture
//!
//! ```text
//! host filter (per request)
//!         ↓ wraps request/response/chain
//! impl HttpExchange
//!         ↓ portcullis::evaluate(root, cx, &mut exchange)
//! Rule<X> tree (shared, immutable)
//! ```
//!
//! # Example
//!
//! ```
//! use portcullis_http::prelude::*;
//!
//! let rules: Vec<Rule<SimpleExchange>> = vec![
//!     constrain([Method::GET, Method::POST]).into(),
//!     method::is(Method::POST)
//!         .then(vec![status::send(StatusCode::FORBIDDEN)])
//!         .into(),
//! ];
//! let root: Rule<SimpleExchange> = and(rules).into();
//!
//! let mut exchange = SimpleExchange::builder().method(Method::OPTIONS).build();
//! let verdict = evaluate(&root, &DirectContext, &mut exchange).unwrap();
//!
//! assert_eq!(verdict, MatcherResult::Terminate);
//! assert_eq!(exchange.recorded().header("allow"), Some("GET, POST, HEAD, OPTIONS"));
//! ```

mod attributes;
mod chain;
mod constrain;
mod exchange;
#[cfg(feature = "registry")]
mod registry;
mod simple;
pub mod status;

pub use attributes::{
    auth_type, dispatcher, method, AuthTypeAttribute, DispatcherTypeAttribute, MethodAttribute,
};
pub use chain::{proceed, Proceed};
pub use constrain::{constrain, Constrain};
pub use exchange::{DispatcherType, HttpExchange, HttpResponse, UnknownDispatcherType};
#[cfg(feature = "registry")]
pub use registry::{
    register, AttributeConfig, AuthTypeRule, ConstrainConfig, ConstrainRule, DispatcherTypeRule,
    MethodRule, ProceedRule, StatusConfig, StatusRule,
};
pub use simple::{RecordedResponse, SimpleExchange, SimpleExchangeBuilder};
pub use status::SendStatus;

// Re-export the HTTP vocabulary used in signatures
pub use http::{Method, StatusCode};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        // Attributes
        auth_type,
        // Actions
        constrain,
        dispatcher,
        method,
        proceed,
        status,
        // Host boundary
        DispatcherType,
        HttpExchange,
        HttpResponse,
        // Vocabulary
        Method,
        // Simple exchange (for testing)
        RecordedResponse,
        SimpleExchange,
        StatusCode,
    };
    pub use portcullis::prelude::*;
}
