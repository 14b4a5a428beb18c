//! Canned behaviors and the queue that hands them out.
//!
//! A queue is consumed front to back across matching calls, except that the
//! last behavior is never removed: once one is left it answers every further
//! call. "Return 1, then 2, then 3 forever" is `[1, 2, 3]`.

use crate::errors::MockError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type DoFn<A, R> = dyn Fn(&A) -> R + Send + Sync;

/// What to do when a stub matches.
pub enum BehaviorMock<A, R> {
    /// Compute the result from the call's arguments.
    Do(Arc<DoFn<A, R>>),
    /// Fail the call with [`MockError::Raised`].
    Raise(String),
}

impl<A, R> BehaviorMock<A, R> {
    pub fn doing<F>(f: F) -> Self
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        Self::Do(Arc::new(f))
    }

    pub fn returning(value: R) -> Self
    where
        R: Clone + Send + Sync + 'static,
    {
        Self::Do(Arc::new(move |_: &A| value.clone()))
    }

    pub fn raise(message: impl Into<String>) -> Self {
        Self::Raise(message.into())
    }

    pub fn invoke(&self, arguments: &A) -> Result<R, BehaviorFailure> {
        match self {
            Self::Do(f) => Ok(f(arguments)),
            Self::Raise(message) => Err(BehaviorFailure::Raised(message.clone())),
        }
    }
}

impl<A, R> Clone for BehaviorMock<A, R> {
    fn clone(&self) -> Self {
        match self {
            Self::Do(f) => Self::Do(Arc::clone(f)),
            Self::Raise(message) => Self::Raise(message.clone()),
        }
    }
}

/// Why a queue could not produce a value. The ledger turns this into a
/// [`MockError`] carrying the method and ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BehaviorFailure {
    Exhausted,
    Raised(String),
}

/// Ordered behaviors attached to one stub registration.
pub struct RecordedMethodBody<A, R> {
    behaviors: VecDeque<BehaviorMock<A, R>>,
}

impl<A, R> RecordedMethodBody<A, R> {
    pub fn new() -> Self {
        Self {
            behaviors: VecDeque::new(),
        }
    }

    pub fn append(&mut self, behavior: BehaviorMock<A, R>) {
        self.behaviors.push_back(behavior);
    }

    pub fn append_do<F>(&mut self, f: F)
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        self.append(BehaviorMock::doing(f));
    }

    pub fn append_return(&mut self, value: R)
    where
        R: Clone + Send + Sync + 'static,
    {
        self.append(BehaviorMock::returning(value));
    }

    pub fn clear(&mut self) {
        self.behaviors.clear();
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Takes the behavior for the next call. The last one stays queued.
    pub fn next_behavior(&mut self) -> Option<BehaviorMock<A, R>> {
        if self.behaviors.len() > 1 {
            self.behaviors.pop_front()
        } else {
            self.behaviors.front().cloned()
        }
    }

    pub fn handle(&mut self, arguments: &A) -> Result<R, BehaviorFailure> {
        let behavior = self.next_behavior().ok_or(BehaviorFailure::Exhausted)?;
        behavior.invoke(arguments)
    }
}

impl<A, R> Default for RecordedMethodBody<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a behavior queue.
///
/// The stub keeps one clone and the configuring test may keep another to
/// append or clear behaviors after registration.
pub struct QueueHandle<A, R> {
    body: Arc<Mutex<RecordedMethodBody<A, R>>>,
}

impl<A, R> QueueHandle<A, R> {
    pub fn new() -> Self {
        Self {
            body: Arc::new(Mutex::new(RecordedMethodBody::new())),
        }
    }

    pub fn from_behaviors<I>(behaviors: I) -> Result<Self, MockError>
    where
        I: IntoIterator<Item = BehaviorMock<A, R>>,
    {
        let handle = Self::new();
        {
            let mut body = handle.lock_body();
            for behavior in behaviors {
                body.append(behavior);
            }
            if body.is_empty() {
                return Err(MockError::InvalidStub(
                    "a stub needs at least one behavior".to_string(),
                ));
            }
        }
        Ok(handle)
    }

    pub fn returning(value: R) -> Self
    where
        R: Clone + Send + Sync + 'static,
    {
        let handle = Self::new();
        handle.append_return(value);
        handle
    }

    pub fn doing<F>(f: F) -> Self
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        let handle = Self::new();
        handle.append_do(f);
        handle
    }

    pub fn append(&self, behavior: BehaviorMock<A, R>) {
        self.lock_body().append(behavior);
    }

    pub fn append_do<F>(&self, f: F)
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        self.lock_body().append_do(f);
    }

    pub fn append_return(&self, value: R)
    where
        R: Clone + Send + Sync + 'static,
    {
        self.lock_body().append_return(value);
    }

    pub fn clear(&self) {
        self.lock_body().clear();
    }

    pub fn len(&self) -> usize {
        self.lock_body().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_body().is_empty()
    }

    /// Runs the next behavior. The queue lock is released before user code
    /// runs, so a behavior may call back into the same mock.
    pub fn handle(&self, arguments: &A) -> Result<R, BehaviorFailure> {
        let behavior = self
            .lock_body()
            .next_behavior()
            .ok_or(BehaviorFailure::Exhausted)?;
        behavior.invoke(arguments)
    }

    fn lock_body(&self) -> MutexGuard<'_, RecordedMethodBody<A, R>> {
        self.body.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A, R> Clone for QueueHandle<A, R> {
    fn clone(&self) -> Self {
        Self {
            body: Arc::clone(&self.body),
        }
    }
}

impl<A, R> Default for QueueHandle<A, R> {
    fn default() -> Self {
        Self::new()
    }
}
