//! Per-method call ledger: stub registration, call resolution and history.
//!
//! Every call is stamped with a process-wide ordinal and appended to the
//! history before resolution, so an unmocked call is still visible to
//! verification. Resolution scans stubs from the most recently registered to
//! the oldest and uses the first match: a narrow stub registered after a
//! broad one overrides it for the calls it covers.

use crate::behavior::{BehaviorFailure, BehaviorMock, QueueHandle};
use crate::errors::MockError;
use crate::invocation::{next_ordinal, ActualInvocation, InvocationSource, InvocationSummary};
use crate::matcher::InvocationMatcher;
use crate::stub::StubEntry;
use crate::trace::recorder::{argument_render_limit, trace_call};
use crate::trace::recording::{CallOutcome, RenderedArguments};
use crate::types::MethodId;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct LedgerState<A, R> {
    stubs: Vec<StubEntry<A, R>>,
    history: Vec<Arc<ActualInvocation<A>>>,
}

pub struct MethodLedger<A, R> {
    method: MethodId,
    state: Mutex<LedgerState<A, R>>,
}

impl<A, R> MethodLedger<A, R> {
    pub fn new(method: MethodId) -> Self {
        Self {
            method,
            state: Mutex::new(LedgerState {
                stubs: Vec::new(),
                history: Vec::new(),
            }),
        }
    }

    pub fn method(&self) -> &MethodId {
        &self.method
    }

    /// Registers a stub after all existing ones. The queue must not be empty.
    pub fn stub(
        &self,
        matcher: InvocationMatcher<A>,
        handler: QueueHandle<A, R>,
    ) -> Result<(), MockError> {
        if handler.is_empty() {
            return Err(MockError::InvalidStub(format!(
                "stub for {} registered without behaviors",
                self.method
            )));
        }
        self.lock_state()
            .stubs
            .push(StubEntry::new(matcher, handler));
        Ok(())
    }

    /// Builds a queue from `behaviors`, registers it, and hands back the
    /// queue so more behaviors can be appended later.
    pub fn stub_with<I>(
        &self,
        matcher: InvocationMatcher<A>,
        behaviors: I,
    ) -> Result<QueueHandle<A, R>, MockError>
    where
        I: IntoIterator<Item = BehaviorMock<A, R>>,
    {
        let handler = QueueHandle::from_behaviors(behaviors)?;
        self.stub(matcher, handler.clone())?;
        Ok(handler)
    }

    /// Drops every stub. History is kept.
    pub fn clear(&self) {
        self.lock_state().stubs.clear();
    }

    pub fn stub_count(&self) -> usize {
        self.lock_state().stubs.len()
    }

    pub fn invocation_count(&self) -> usize {
        self.lock_state().history.len()
    }

    pub fn history(&self) -> Vec<Arc<ActualInvocation<A>>> {
        self.lock_state().history.clone()
    }

    /// Recorded calls accepted by `matcher`, in call order.
    pub fn query(&self, matcher: &InvocationMatcher<A>) -> Vec<Arc<ActualInvocation<A>>> {
        self.history()
            .into_iter()
            .filter(|invocation| matcher.matches(invocation))
            .collect()
    }

    fn lock_state(&self) -> MutexGuard<'_, LedgerState<A, R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Debug, R> MethodLedger<A, R> {
    /// Records a call and runs the behavior of the stub it resolves to.
    pub fn record(&self, arguments: A) -> Result<R, MockError> {
        let (invocation, stubs) = {
            let mut state = self.lock_state();
            // Allocated under the lock so history stays in ordinal order.
            let ordinal = next_ordinal();
            let invocation = Arc::new(ActualInvocation::new(
                ordinal,
                self.method.clone(),
                arguments,
            ));
            state.history.push(Arc::clone(&invocation));
            (invocation, state.stubs.clone())
        };

        // Matchers run on the snapshot so a predicate may read this ledger.
        let handler = stubs
            .iter()
            .rev()
            .find(|stub| stub.matches(&invocation))
            .map(|stub| stub.handler().clone());

        let result = match handler {
            Some(handler) => self.run_handler(&handler, &invocation),
            None => Err(MockError::UnmockedMethodCall {
                method: self.method.clone(),
                ordinal: invocation.ordinal(),
                arguments: RenderedArguments::render(
                    invocation.arguments(),
                    argument_render_limit(),
                )
                .text,
            }),
        };
        trace_call(invocation.as_ref(), CallOutcome::of(&result));
        result
    }

    fn run_handler(
        &self,
        handler: &QueueHandle<A, R>,
        invocation: &ActualInvocation<A>,
    ) -> Result<R, MockError> {
        handler
            .handle(invocation.arguments())
            .map_err(|failure| match failure {
                BehaviorFailure::Exhausted => MockError::BehaviorExhausted {
                    method: self.method.clone(),
                    ordinal: invocation.ordinal(),
                },
                BehaviorFailure::Raised(message) => MockError::Raised {
                    method: self.method.clone(),
                    ordinal: invocation.ordinal(),
                    message,
                },
            })
    }
}

impl<A, R> InvocationSource for MethodLedger<A, R> {
    fn collect_invocations(&self, into: &mut Vec<InvocationSummary>) {
        into.extend(self.lock_state().history.iter().map(|i| i.summary()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MockObject;

    fn ledger() -> MethodLedger<(i32,), String> {
        MethodLedger::new(MockObject::new("Formatter").method("format"))
    }

    #[test]
    fn unmocked_call_is_still_recorded() {
        let ledger = ledger();
        let err = ledger.record((3,)).expect_err("no stubs");
        assert!(matches!(err, MockError::UnmockedMethodCall { ref arguments, .. } if arguments == "(3,)"));
        assert_eq!(ledger.invocation_count(), 1);
        assert_eq!(ledger.history()[0].arguments(), &(3,));
    }

    #[test]
    fn most_recent_stub_wins() {
        let ledger = ledger();
        ledger
            .stub(InvocationMatcher::any(), QueueHandle::returning("broad".to_string()))
            .expect("stub broad");
        ledger
            .stub(InvocationMatcher::exact((7,)), QueueHandle::returning("narrow".to_string()))
            .expect("stub narrow");
        assert_eq!(ledger.record((7,)).expect("narrow call"), "narrow");
        assert_eq!(ledger.record((9,)).expect("broad call"), "broad");
    }

    #[test]
    fn broad_stub_registered_last_shadows_narrow_one() {
        let ledger = ledger();
        ledger
            .stub(InvocationMatcher::exact((7,)), QueueHandle::returning("narrow".to_string()))
            .expect("stub narrow");
        ledger
            .stub(InvocationMatcher::any(), QueueHandle::returning("broad".to_string()))
            .expect("stub broad");
        assert_eq!(ledger.record((7,)).expect("call"), "broad");
    }

    #[test]
    fn empty_queue_is_rejected_at_registration() {
        let ledger = ledger();
        let err = ledger
            .stub(InvocationMatcher::any(), QueueHandle::new())
            .expect_err("empty queue");
        assert!(matches!(err, MockError::InvalidStub(_)));
        assert_eq!(ledger.stub_count(), 0);
    }

    #[test]
    fn queue_cleared_after_registration_fails_distinctly() {
        let ledger = ledger();
        let handle = ledger
            .stub_with(
                InvocationMatcher::any(),
                [BehaviorMock::returning("x".to_string())],
            )
            .expect("stub");
        handle.clear();
        let err = ledger.record((1,)).expect_err("exhausted");
        assert!(matches!(err, MockError::BehaviorExhausted { .. }));
        assert_eq!(ledger.invocation_count(), 1);
    }

    #[test]
    fn raise_behavior_surfaces_message() {
        let ledger = ledger();
        ledger
            .stub_with(InvocationMatcher::any(), [BehaviorMock::raise("disk full")])
            .expect("stub");
        let err = ledger.record((1,)).expect_err("raised");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn clear_keeps_history() {
        let ledger = ledger();
        ledger
            .stub(InvocationMatcher::any(), QueueHandle::returning("a".to_string()))
            .expect("stub");
        ledger.record((1,)).expect("first call");
        let before = ledger.history()[0].ordinal();
        ledger.clear();
        assert_eq!(ledger.stub_count(), 0);
        assert!(ledger.record((2,)).is_err());
        let history = ledger.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].ordinal(), before);
    }

    #[test]
    fn behavior_may_call_back_into_its_ledger() {
        let ledger = Arc::new(MethodLedger::<(u32,), u32>::new(
            crate::types::MethodId::mint("fact"),
        ));
        let inner = Arc::clone(&ledger);
        ledger
            .stub(
                InvocationMatcher::any(),
                QueueHandle::doing(move |(n,): &(u32,)| {
                    if *n <= 1 {
                        1
                    } else {
                        n * inner.record((n - 1,)).unwrap_or(0)
                    }
                }),
            )
            .expect("stub");
        assert_eq!(ledger.record((4,)).expect("fact"), 24);
        assert_eq!(ledger.invocation_count(), 4);
    }

    #[test]
    fn predicate_may_read_its_own_ledger() {
        let ledger = Arc::new(MethodLedger::<(u32,), &'static str>::new(
            crate::types::MethodId::mint("greet"),
        ));
        let inner = Arc::clone(&ledger);
        ledger
            .stub(InvocationMatcher::any(), QueueHandle::returning("again"))
            .expect("stub any");
        ledger
            .stub(
                InvocationMatcher::predicate(move |_: &(u32,)| inner.invocation_count() == 1),
                QueueHandle::returning("first"),
            )
            .expect("stub first-call");

        let worker = Arc::clone(&ledger);
        let results = std::thread::spawn(move || {
            (0..3)
                .map(|n| worker.record((n,)).expect("greet"))
                .collect::<Vec<_>>()
        })
        .join()
        .expect("recording thread");
        assert_eq!(results, vec!["first", "again", "again"]);
    }

    #[test]
    fn query_matcher_may_read_the_ledger() {
        let ledger = Arc::new(MethodLedger::<(i32,), i32>::new(
            crate::types::MethodId::mint("id"),
        ));
        ledger
            .stub(InvocationMatcher::any(), QueueHandle::doing(|(n,): &(i32,)| *n))
            .expect("stub");
        for n in 0..4 {
            ledger.record((n,)).expect("call");
        }
        let inner = Arc::clone(&ledger);
        let latest = InvocationMatcher::predicate(move |(n,): &(i32,)| {
            inner.invocation_count() as i32 == n + 1
        });
        let hits = ledger.query(&latest);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].arguments(), &(3,));
    }

    #[test]
    fn query_filters_in_call_order() {
        let ledger = ledger();
        ledger
            .stub(InvocationMatcher::any(), QueueHandle::returning(String::new()))
            .expect("stub");
        for n in [4, 1, 4, 2] {
            ledger.record((n,)).expect("call");
        }
        let fours = ledger.query(&InvocationMatcher::exact((4,)));
        assert_eq!(fours.len(), 2);
        assert!(fours[0].ordinal() < fours[1].ordinal());
        let small = ledger.query(&InvocationMatcher::predicate(|(n,): &(i32,)| *n < 3));
        let args = small.iter().map(|i| i.arguments().0).collect::<Vec<_>>();
        assert_eq!(args, vec![1, 2]);
        assert_eq!(ledger.query(&InvocationMatcher::any()).len(), 4);
    }
}
