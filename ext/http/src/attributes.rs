//! Request attributes exposed by [`HttpExchange`].
//!
//! Each attribute gets a small module with `is` / `is_in` builders, so rules
//! read as `method::is_in([Method::GET, Method::POST])`.

use crate::HttpExchange;
use http::Method;
use portcullis::{AttributeMatcher, RequestAttribute};

/// The request method.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodAttribute;

impl<X: HttpExchange> RequestAttribute<X> for MethodAttribute {
    type Value = Method;

    fn name(&self) -> &'static str {
        "method"
    }

    fn read(&self, req: &X) -> Option<Method> {
        Some(req.method().clone())
    }
}

/// The dispatcher type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatcherTypeAttribute;

impl<X: HttpExchange> RequestAttribute<X> for DispatcherTypeAttribute {
    type Value = crate::DispatcherType;

    fn name(&self) -> &'static str {
        "dispatcher_type"
    }

    fn read(&self, req: &X) -> Option<crate::DispatcherType> {
        Some(req.dispatcher_type())
    }
}

/// The authentication scheme. Absent on unauthenticated requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthTypeAttribute;

impl<X: HttpExchange> RequestAttribute<X> for AuthTypeAttribute {
    type Value = String;

    fn name(&self) -> &'static str {
        "auth_type"
    }

    fn read(&self, req: &X) -> Option<String> {
        req.auth_type().map(str::to_owned)
    }
}

/// Matchers on the request method.
pub mod method {
    use super::{AttributeMatcher, Method, MethodAttribute};
    use crate::HttpExchange;

    /// Match one method.
    pub fn is<X: HttpExchange>(method: Method) -> AttributeMatcher<X, MethodAttribute> {
        AttributeMatcher::is(MethodAttribute, method)
    }

    /// Match any of `methods`. Empty never matches.
    pub fn is_in<X: HttpExchange>(
        methods: impl IntoIterator<Item = Method>,
    ) -> AttributeMatcher<X, MethodAttribute> {
        AttributeMatcher::is_in(MethodAttribute, methods)
    }
}

/// Matchers on the dispatcher type.
pub mod dispatcher {
    use super::{AttributeMatcher, DispatcherTypeAttribute};
    use crate::{DispatcherType, HttpExchange};

    /// Match one dispatcher type.
    pub fn is<X: HttpExchange>(
        dispatcher_type: DispatcherType,
    ) -> AttributeMatcher<X, DispatcherTypeAttribute> {
        AttributeMatcher::is(DispatcherTypeAttribute, dispatcher_type)
    }

    /// Match any of `types`.
    pub fn is_in<X: HttpExchange>(
        types: impl IntoIterator<Item = DispatcherType>,
    ) -> AttributeMatcher<X, DispatcherTypeAttribute> {
        AttributeMatcher::is_in(DispatcherTypeAttribute, types)
    }
}

/// Matchers on the authentication scheme.
pub mod auth_type {
    use super::{AttributeMatcher, AuthTypeAttribute};
    use crate::HttpExchange;

    /// Match one scheme (e.g. `"BASIC"`). Unauthenticated requests never match.
    pub fn is<X: HttpExchange>(scheme: impl Into<String>) -> AttributeMatcher<X, AuthTypeAttribute> {
        AttributeMatcher::is(AuthTypeAttribute, scheme.into())
    }

    /// Match any of `schemes`.
    pub fn is_in<X: HttpExchange, S: Into<String>>(
        schemes: impl IntoIterator<Item = S>,
    ) -> AttributeMatcher<X, AuthTypeAttribute> {
        AttributeMatcher::is_in(AuthTypeAttribute, schemes.into_iter().map(Into::into))
    }
}
