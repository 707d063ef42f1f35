//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Resolve the first route matching verb + path
//! - Bind captured parameters and invoke the handler
//!
//! # Design Decisions
//! - Patterns are compiled once, at registration
//! - Most recently registered route is tried first
//! - Explicit NoMatch rather than silent default

use std::fmt;
use std::sync::Arc;

use crate::protocol::{Request, Responder, Response};
use crate::routing::matcher::Location;

/// Something that can answer a request.
///
/// Handlers run synchronously on the connection's task and must not block.
pub trait Handler: Send + Sync {
    fn call(&self, req: &Request, res: &mut Responder);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Responder) + Send + Sync,
{
    fn call(&self, req: &Request, res: &mut Responder) {
        self(req, res)
    }
}

/// A registered verb + location binding.
#[derive(Clone)]
pub struct Route {
    verb: String,
    location: Location,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn new(verb: &str, pattern: &str, handler: Arc<dyn Handler>) -> Self {
        Self {
            verb: verb.trim().to_uppercase(),
            location: Location::compile(pattern),
            handler,
        }
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("verb", &self.verb)
            .field("location", &self.location.pattern())
            .finish_non_exhaustive()
    }
}

/// Outcome of dispatching one request.
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// A route matched and its handler ran.
    Handled {
        /// Pattern of the route that won.
        pattern: String,
        /// What the handler asked to send, if anything.
        response: Option<Response>,
    },
    /// No route accepted the request; it is dropped.
    NoMatch,
}

/// Ordered route table.
#[derive(Debug, Default, Clone)]
pub struct Router {
    /// Registration order; dispatch walks it backwards.
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Shadows any earlier route matching the same requests.
    pub fn register<H>(&mut self, verb: &str, pattern: &str, handler: H)
    where
        H: Handler + 'static,
    {
        let route = Route::new(verb, pattern, Arc::new(handler));
        tracing::debug!(verb = %route.verb, pattern = %route.location, "Route registered");
        self.routes.push(route);
    }

    /// Routes in the order they are tried.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the route for `req`, bind its parameters and run its handler.
    pub fn dispatch(&self, req: &mut Request) -> Dispatch {
        let found = self.routes().find_map(|route| {
            if !route.verb.eq_ignore_ascii_case(req.verb()) {
                return None;
            }
            route.location.matches(req.path()).map(|params| (route, params))
        });

        let Some((route, params)) = found else {
            return Dispatch::NoMatch;
        };

        req.bind_params(params);
        let mut responder = Responder::new();
        route.handler.call(req, &mut responder);

        Dispatch::Handled {
            pattern: route.location.pattern().to_string(),
            response: responder.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(frame: &str) -> Request {
        Request::parse(frame, "127.0.0.1:5000".parse().unwrap()).unwrap()
    }

    fn reply_with(tag: &'static str) -> impl Fn(&Request, &mut Responder) + Send + Sync {
        move |req, res| res.send("R", req.path(), tag)
    }

    fn content(dispatch: Dispatch) -> Option<String> {
        match dispatch {
            Dispatch::Handled { response, .. } => response.map(|r| r.content),
            Dispatch::NoMatch => None,
        }
    }

    #[test]
    fn later_registration_wins() {
        let mut router = Router::new();
        router.register("P", "/a/:id", reply_with("param"));
        router.register("P", "/a/1", reply_with("literal"));

        assert_eq!(content(router.dispatch(&mut request("P /a/1"))).as_deref(), Some("literal"));
        assert_eq!(content(router.dispatch(&mut request("P /a/2"))).as_deref(), Some("param"));
    }

    #[test]
    fn later_parameter_route_shadows_earlier_literal() {
        let mut router = Router::new();
        router.register("P", "/a/1", reply_with("literal"));
        router.register("P", "/a/:id", reply_with("param"));

        assert_eq!(content(router.dispatch(&mut request("P /a/1"))).as_deref(), Some("param"));
    }

    #[test]
    fn only_first_match_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        for _ in 0..3 {
            let calls = calls.clone();
            router.register("P", "/x", move |_: &Request, _: &mut Responder| {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        router.dispatch(&mut request("P /x"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn verb_matching_is_case_insensitive() {
        let mut router = Router::new();
        router.register("report", "/r", reply_with("ok"));

        assert_eq!(content(router.dispatch(&mut request("RePoRt /r"))).as_deref(), Some("ok"));
    }

    #[test]
    fn verb_must_match() {
        let mut router = Router::new();
        router.register("P", "/r", reply_with("ok"));

        assert_eq!(router.dispatch(&mut request("G /r")), Dispatch::NoMatch);
    }

    #[test]
    fn params_are_bound_before_handler_runs() {
        let mut router = Router::new();
        router.register("P", "/report/:id", |req: &Request, res: &mut Responder| {
            res.send("ACK", "/report", req.param("id").unwrap_or("missing"));
        });

        let mut req = request("P /report/42\n{}");
        assert_eq!(content(router.dispatch(&mut req)).as_deref(), Some("42"));
        assert_eq!(req.param("id"), Some("42"));
    }

    #[test]
    fn unmatched_request_is_explicit_no_match() {
        let mut router = Router::new();
        router.register("P", "/known", reply_with("ok"));

        let mut req = request("P /unknown");
        assert_eq!(router.dispatch(&mut req), Dispatch::NoMatch);
        assert!(req.params().is_empty());
    }

    #[test]
    fn empty_router_matches_nothing() {
        assert_eq!(Router::new().dispatch(&mut request("P /")), Dispatch::NoMatch);
    }

    #[test]
    fn handler_without_send_yields_no_response() {
        let mut router = Router::new();
        router.register("P", "/quiet", |_: &Request, _: &mut Responder| {});

        assert_eq!(
            router.dispatch(&mut request("P /quiet")),
            Dispatch::Handled { pattern: "/quiet".into(), response: None }
        );
    }

    #[test]
    fn routes_iterate_most_recent_first() {
        let mut router = Router::new();
        router.register("A", "/1", reply_with(""));
        router.register("B", "/2", reply_with(""));

        let verbs: Vec<&str> = router.routes().map(Route::verb).collect();
        assert_eq!(verbs, vec!["B", "A"]);
        assert_eq!(router.len(), 2);
    }
}
