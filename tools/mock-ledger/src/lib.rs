//! Call recording and stub resolution for mocked methods.
//!
//! A fake object forwards each intercepted call to the [`MethodLedger`] of
//! that method slot. The ledger records the call, picks the most recently
//! registered stub whose matcher accepts it, and runs that stub's behavior
//! queue. Verification code reads the history back with
//! [`MethodLedger::query`] and orders calls across methods with
//! [`ordered_invocations`].

pub mod behavior;
pub mod config;
pub mod errors;
pub mod invocation;
pub mod ledger;
pub mod log_retention;
pub mod logging;
pub mod matcher;
pub mod stub;
pub mod trace;
pub mod types;

pub use behavior::{BehaviorFailure, BehaviorMock, QueueHandle, RecordedMethodBody};
pub use errors::MockError;
pub use invocation::{
    next_ordinal, ordered_invocations, ActualInvocation, InvocationSource, InvocationSummary,
};
pub use ledger::MethodLedger;
pub use matcher::{ExpectedArguments, InvocationMatcher, UserPredicate};
pub use stub::StubEntry;
pub use types::{MethodId, MockId, MockObject, Ordinal};
