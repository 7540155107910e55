//! Method negotiation against an in-memory exchange.

use portcullis_http::prelude::*;

fn run(rule: &Rule<SimpleExchange>, exchange: &mut SimpleExchange) -> MatcherResult {
    evaluate(rule, &DirectContext, exchange).unwrap()
}

fn request(method: Method) -> SimpleExchange {
    SimpleExchange::builder().method(method).build()
}

fn get_only() -> Rule<SimpleExchange> {
    constrain([Method::GET]).into()
}

#[test]
fn allowed_method_continues_untouched() {
    let mut x = request(Method::GET);
    assert_eq!(run(&get_only(), &mut x), MatcherResult::Match);
    assert_eq!(x.recorded().status(), None);
    assert!(!x.recorded().is_committed());
}

#[test]
fn get_implies_head() {
    let mut x = request(Method::HEAD);
    assert_eq!(run(&get_only(), &mut x), MatcherResult::Match);
    assert_eq!(x.recorded().status(), None);
}

#[test]
fn options_answers_200_with_allow() {
    let mut x = request(Method::OPTIONS);
    assert_eq!(run(&get_only(), &mut x), MatcherResult::Terminate);

    let r = x.recorded();
    assert_eq!(r.status(), Some(StatusCode::OK));
    assert_eq!(r.header("allow"), Some("GET, HEAD, OPTIONS"));
    assert_eq!(r.content_length(), Some(0));
    assert!(r.body_closed());
}

#[test]
fn disallowed_method_answers_405_with_allow() {
    let mut x = request(Method::POST);
    assert_eq!(run(&get_only(), &mut x), MatcherResult::Terminate);

    let r = x.recorded();
    assert_eq!(r.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
    assert_eq!(r.header("allow"), Some("GET, HEAD, OPTIONS"));
    assert_eq!(r.content_length(), Some(0));
    assert!(r.body_closed());
}

#[test]
fn include_dispatch_is_never_constrained() {
    for method in [Method::GET, Method::POST, Method::OPTIONS, Method::DELETE] {
        let mut x = SimpleExchange::builder()
            .method(method.clone())
            .dispatcher_type(DispatcherType::Include)
            .build();
        assert_eq!(run(&get_only(), &mut x), MatcherResult::Match, "{method}");
        assert_eq!(x.recorded().status(), None);
    }
}

#[test]
fn forward_dispatch_is_constrained() {
    let mut x = SimpleExchange::builder()
        .method(Method::PUT)
        .dispatcher_type(DispatcherType::Forward)
        .build();
    assert_eq!(run(&get_only(), &mut x), MatcherResult::Terminate);
    assert_eq!(x.recorded().status(), Some(StatusCode::METHOD_NOT_ALLOWED));
}

#[test]
fn get_post_allow_order() {
    let rule: Rule<SimpleExchange> = constrain([Method::GET, Method::POST]).into();
    let mut x = request(Method::OPTIONS);
    run(&rule, &mut x);
    assert_eq!(x.recorded().header("allow"), Some("GET, POST, HEAD, OPTIONS"));
}

#[test]
fn duplicate_methods_listed_once() {
    let rule: Rule<SimpleExchange> =
        constrain([Method::POST, Method::POST, Method::GET, Method::GET]).into();
    let mut x = request(Method::DELETE);
    run(&rule, &mut x);
    assert_eq!(x.recorded().header("allow"), Some("POST, GET, HEAD, OPTIONS"));
}

#[test]
fn explicitly_allowed_options_passes_through() {
    let rule: Rule<SimpleExchange> = constrain([Method::GET, Method::OPTIONS]).into();
    let mut x = request(Method::OPTIONS);
    assert_eq!(run(&rule, &mut x), MatcherResult::Match);
    assert_eq!(x.recorded().status(), None);
}

#[test]
fn close_failure_surfaces_as_transport_error() {
    let mut x = SimpleExchange::builder()
        .method(Method::POST)
        .fail_close()
        .build();
    let err = evaluate(&get_only(), &DirectContext, &mut x).unwrap_err();
    assert!(matches!(err, EvalError::Transport(_)));
}

#[test]
fn rejection_stops_the_enclosing_sequence() {
    let root: Rule<SimpleExchange> = and(vec![get_only(), proceed().into()]).into();

    let mut rejected = request(Method::PATCH);
    assert_eq!(run(&root, &mut rejected), MatcherResult::Terminate);
    assert_eq!(rejected.proceeded(), 0);

    let mut allowed = request(Method::GET);
    assert_eq!(run(&root, &mut allowed), MatcherResult::Terminate);
    assert_eq!(allowed.proceeded(), 1);
}

#[test]
fn constrain_with_method_branching() {
    // Only admins may DELETE; everyone else gets 403.
    let delete_guard: Rule<SimpleExchange> = method::is(Method::DELETE)
        .then(vec![auth_type::is("CLIENT_CERT")
            .otherwise(vec![status::send(StatusCode::FORBIDDEN)])
            .into()])
        .into();
    let rules: Vec<Rule<SimpleExchange>> = vec![
        constrain([Method::GET, Method::DELETE]).into(),
        delete_guard,
    ];
    let root: Rule<SimpleExchange> = and(rules).into();

    let mut anon = request(Method::DELETE);
    assert_eq!(run(&root, &mut anon), MatcherResult::Terminate);
    assert_eq!(anon.recorded().status(), Some(StatusCode::FORBIDDEN));

    let mut cert = SimpleExchange::builder()
        .method(Method::DELETE)
        .auth_type("CLIENT_CERT")
        .build();
    assert_eq!(run(&root, &mut cert), MatcherResult::Match);
    assert_eq!(cert.recorded().status(), None);

    // GET skips the guard's `then`; with no `otherwise` the bare result is NoMatch.
    let mut get = request(Method::GET);
    assert_eq!(run(&root, &mut get), MatcherResult::NoMatch);
}
