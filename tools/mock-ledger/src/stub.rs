use crate::behavior::{BehaviorFailure, QueueHandle};
use crate::invocation::ActualInvocation;
use crate::matcher::InvocationMatcher;
use std::sync::Arc;

/// One `stub()` registration: a matcher and the queue it answers with.
///
/// Clones share the matcher and the queue.
pub struct StubEntry<A, R> {
    matcher: Arc<InvocationMatcher<A>>,
    handler: QueueHandle<A, R>,
}

impl<A, R> StubEntry<A, R> {
    pub fn new(matcher: InvocationMatcher<A>, handler: QueueHandle<A, R>) -> Self {
        Self {
            matcher: Arc::new(matcher),
            handler,
        }
    }

    pub fn matches(&self, invocation: &ActualInvocation<A>) -> bool {
        self.matcher.matches(invocation)
    }

    pub fn matcher(&self) -> &InvocationMatcher<A> {
        &self.matcher
    }

    pub fn handler(&self) -> &QueueHandle<A, R> {
        &self.handler
    }

    pub fn handle(&self, arguments: &A) -> Result<R, BehaviorFailure> {
        self.handler.handle(arguments)
    }
}

impl<A, R> Clone for StubEntry<A, R> {
    fn clone(&self) -> Self {
        Self {
            matcher: Arc::clone(&self.matcher),
            handler: self.handler.clone(),
        }
    }
}
