use crate::types::{MethodId, Ordinal};
use std::sync::atomic::{AtomicU64, Ordering};

// Shared by every ledger in the process. Never reset: ordinals from ledgers
// created at different times must stay comparable.
static INVOCATION_ORDINAL: AtomicU64 = AtomicU64::new(0);

pub fn next_ordinal() -> Ordinal {
    Ordinal(INVOCATION_ORDINAL.fetch_add(1, Ordering::SeqCst))
}

/// One real call into a mocked method.
#[derive(Debug, Clone, PartialEq)]
pub struct ActualInvocation<A> {
    ordinal: Ordinal,
    method: MethodId,
    arguments: A,
}

impl<A> ActualInvocation<A> {
    pub fn new(ordinal: Ordinal, method: MethodId, arguments: A) -> Self {
        Self {
            ordinal,
            method,
            arguments,
        }
    }

    pub fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    pub fn method(&self) -> &MethodId {
        &self.method
    }

    pub fn arguments(&self) -> &A {
        &self.arguments
    }

    pub fn summary(&self) -> InvocationSummary {
        InvocationSummary {
            ordinal: self.ordinal,
            method: self.method.clone(),
        }
    }
}

/// Argument-free view of an invocation, comparable across ledgers of
/// different argument types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvocationSummary {
    pub ordinal: Ordinal,
    pub method: MethodId,
}

/// Anything holding call history that order verification can read.
pub trait InvocationSource {
    fn collect_invocations(&self, into: &mut Vec<InvocationSummary>);
}

/// Merges several histories into one list in real call order.
///
/// A source passed twice contributes its calls once.
pub fn ordered_invocations(sources: &[&dyn InvocationSource]) -> Vec<InvocationSummary> {
    let mut all = Vec::new();
    for source in sources {
        source.collect_invocations(&mut all);
    }
    all.sort_by_key(|summary| summary.ordinal);
    all.dedup_by_key(|summary| summary.ordinal);
    all
}
