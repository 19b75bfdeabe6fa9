//! URI-pattern keyed handler registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{HandlerResolver, RequestHandler};

/// Maps URI patterns to request handlers.
///
/// Three pattern forms are recognized: an exact path (`/ping`), a prefix
/// pattern (`/static/*`) and a suffix pattern (`*.ico`). Lookup prefers an
/// exact hit, then the pattern with the longest literal part; `*` alone
/// matches everything.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn RequestHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under a pattern, replacing any previous one.
    pub fn register<H: RequestHandler + 'static>(&mut self, pattern: &str, handler: H) {
        self.handlers.insert(pattern.to_string(), Arc::new(handler));
    }

    fn matches(pattern: &str, path: &str) -> bool {
        if pattern == "*" || pattern == path {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix('*') {
            return path.starts_with(prefix);
        }
        if let Some(suffix) = pattern.strip_prefix('*') {
            return path.ends_with(suffix);
        }
        false
    }
}

impl HandlerResolver for HandlerRegistry {
    fn lookup(&self, path: &str) -> Option<Arc<dyn RequestHandler>> {
        if let Some(handler) = self.handlers.get(path) {
            return Some(handler.clone());
        }
        let mut best: Option<&str> = None;
        for pattern in self.handlers.keys() {
            if Self::matches(pattern, path) {
                let better = match best {
                    // a longer pattern carries more literal text
                    Some(current) => pattern.len() > current.len(),
                    None => true,
                };
                if better {
                    best = Some(pattern);
                }
            }
        }
        best.and_then(|pattern| self.handlers.get(pattern)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use http::StatusCode;

    fn handler_setting(status: StatusCode) -> impl RequestHandler {
        make_handler(move |_req, resp, _ctx| {
            *resp.status_mut() = status;
            Ok(())
        })
    }

    fn status_of(registry: &HandlerRegistry, path: &str) -> Option<StatusCode> {
        registry.lookup(path).map(|handler| {
            let mut request = http::Request::builder().uri(path).body(None).unwrap();
            let mut response = http::Response::builder().body(None).unwrap();
            handler.handle(&mut request, &mut response, &crate::context::HttpContext::new()).unwrap();
            response.status()
        })
    }

    #[test]
    fn exact_match_wins() {
        let mut registry = HandlerRegistry::new();
        registry.register("*", handler_setting(StatusCode::OK));
        registry.register("/ping", handler_setting(StatusCode::NO_CONTENT));

        assert_eq!(status_of(&registry, "/ping"), Some(StatusCode::NO_CONTENT));
        assert_eq!(status_of(&registry, "/pong"), Some(StatusCode::OK));
    }

    #[test]
    fn longest_pattern_wins() {
        let mut registry = HandlerRegistry::new();
        registry.register("/static/*", handler_setting(StatusCode::OK));
        registry.register("/static/images/*", handler_setting(StatusCode::ACCEPTED));
        registry.register("*.ico", handler_setting(StatusCode::NO_CONTENT));

        assert_eq!(status_of(&registry, "/static/app.css"), Some(StatusCode::OK));
        assert_eq!(status_of(&registry, "/static/images/logo.png"), Some(StatusCode::ACCEPTED));
        assert_eq!(status_of(&registry, "/favicon.ico"), Some(StatusCode::NO_CONTENT));
    }

    #[test]
    fn no_match_is_none() {
        let mut registry = HandlerRegistry::new();
        registry.register("/only", handler_setting(StatusCode::OK));
        assert_eq!(status_of(&registry, "/other"), None);
    }
}
