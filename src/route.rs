//! A single registration: method filter, pattern, handler chain.

use std::sync::Arc;

use tracing::trace;

use crate::handler::{Chain, Outcome};
use crate::method::{Method, MethodFilter};
use crate::pattern::Pattern;
use crate::request::Request;

/// One `(method, pattern, handlers)` registration. Immutable once added to a
/// [`Router`](crate::Router).
pub struct Route {
    method: MethodFilter,
    pattern: Arc<Pattern>,
    chain: Chain,
}

impl Route {
    pub(crate) fn new(method: MethodFilter, pattern: Arc<Pattern>, chain: Chain) -> Self {
        Self { method, pattern, chain }
    }

    pub fn method(&self) -> MethodFilter { self.method }
    pub fn pattern(&self) -> &Pattern { &self.pattern }

    /// Number of handlers in the chain. Never zero.
    pub fn handler_count(&self) -> usize { self.chain.len() }

    pub(crate) fn permits(&self, method: Method) -> bool {
        self.method.permits(method)
    }

    /// Runs the chain in order. Returns `Respond` or `Fail` when a handler
    /// ended the request, `Next` when the router should move on to the next
    /// candidate route.
    pub(crate) async fn run(&self, mut req: Request) -> Outcome {
        let handlers = self.chain.handlers();
        for (i, handler) in handlers.iter().enumerate() {
            match handler.call(req).await {
                Outcome::Next(r) => req = r,
                Outcome::SkipRoute(r) => {
                    trace!(
                        route = self.pattern.as_str(),
                        skipped = handlers.len() - i - 1,
                        "skipping rest of route"
                    );
                    return Outcome::Next(r);
                }
                done => return done,
            }
        }
        Outcome::Next(req)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("handlers", &self.chain.len())
            .finish()
    }
}
