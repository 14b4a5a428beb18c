use crate::invocation::ActualInvocation;
use std::fmt;
use std::sync::Arc;

type PredicateFn<A> = dyn Fn(&A) -> bool + Send + Sync;

/// Decides whether a stub applies to a call, or which calls a query returns.
pub enum InvocationMatcher<A> {
    Exact(ExpectedArguments<A>),
    Predicate(UserPredicate<A>),
    Any,
}

impl<A> InvocationMatcher<A> {
    pub fn exact(expected: A) -> Self
    where
        A: PartialEq,
    {
        Self::Exact(ExpectedArguments::new(expected))
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(UserPredicate::new(predicate))
    }

    pub fn any() -> Self {
        Self::Any
    }

    pub fn matches(&self, invocation: &ActualInvocation<A>) -> bool {
        self.matches_arguments(invocation.arguments())
    }

    pub fn matches_arguments(&self, arguments: &A) -> bool {
        match self {
            Self::Exact(expected) => expected.matches(arguments),
            Self::Predicate(predicate) => predicate.matches(arguments),
            Self::Any => true,
        }
    }
}

impl<A> Default for InvocationMatcher<A> {
    fn default() -> Self {
        Self::Any
    }
}

impl<A: fmt::Debug> fmt::Debug for InvocationMatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(expected) => f.debug_tuple("Exact").field(expected.expected()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Any => f.write_str("Any"),
        }
    }
}

/// Element-wise equality against a fixed argument tuple.
///
/// The comparison function is captured when the matcher is built, which is
/// where the `PartialEq` requirement is checked.
pub struct ExpectedArguments<A> {
    expected: A,
    eq: fn(&A, &A) -> bool,
}

impl<A: PartialEq> ExpectedArguments<A> {
    pub fn new(expected: A) -> Self {
        Self {
            expected,
            eq: <A as PartialEq>::eq,
        }
    }
}

impl<A> ExpectedArguments<A> {
    pub fn expected(&self) -> &A {
        &self.expected
    }

    fn matches(&self, actual: &A) -> bool {
        (self.eq)(&self.expected, actual)
    }
}

pub struct UserPredicate<A> {
    predicate: Arc<PredicateFn<A>>,
}

impl<A> UserPredicate<A> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    fn matches(&self, actual: &A) -> bool {
        (self.predicate)(actual)
    }
}

impl<A> Clone for UserPredicate<A> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}
