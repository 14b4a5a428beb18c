//! Serializable types for the call trace.

use crate::errors::MockError;
use crate::invocation::ActualInvocation;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub const CALL_EVENT_TYPE: &str = "call";

// ── CallOutcome ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Stubbed,
    Unmocked,
    Exhausted,
    Raised,
}

impl CallOutcome {
    pub fn of<R>(result: &Result<R, MockError>) -> Self {
        match result {
            Ok(_) => Self::Stubbed,
            Err(MockError::UnmockedMethodCall { .. }) => Self::Unmocked,
            Err(MockError::BehaviorExhausted { .. }) => Self::Exhausted,
            Err(_) => Self::Raised,
        }
    }

    pub fn level(self) -> &'static str {
        match self {
            Self::Stubbed => "info",
            Self::Unmocked | Self::Exhausted | Self::Raised => "warn",
        }
    }
}

// ── RenderedArguments ─────────────────────────────────────────────────────────

/// `{:?}` rendering of an argument tuple, replaced by a digest when too large.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArguments {
    /// Full rendering, or `<hash:sha256:XXXXXXXXXXXXXXXX>` when truncated.
    pub text: String,
    pub truncated: bool,
}

impl RenderedArguments {
    pub fn render<A: Debug>(arguments: &A, max_bytes: usize) -> Self {
        let text = format!("{arguments:?}");
        if text.len() > max_bytes {
            Self::digest(&text)
        } else {
            Self {
                text,
                truncated: false,
            }
        }
    }

    pub fn digest(text: &str) -> Self {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(text.as_bytes());
        // First 8 bytes (16 hex chars)
        let prefix = hex_bytes(&hash[..8]);
        Self {
            text: format!("<hash:sha256:{prefix}>"),
            truncated: true,
        }
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ── CallTraceRecord ───────────────────────────────────────────────────────────

/// One traced call, stored as the payload of a `call` log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTraceRecord {
    pub ordinal: u64,
    pub timestamp_ns: u64,
    pub thread_id: String,
    /// Qualified method name, `Mock::method` when the slot has an owner.
    pub method: String,
    pub method_token: u64,
    pub mock: Option<String>,
    pub arguments: String,
    #[serde(default)]
    pub arguments_truncated: bool,
    pub outcome: CallOutcome,
}

impl CallTraceRecord {
    pub fn from_invocation<A: Debug>(
        invocation: &ActualInvocation<A>,
        outcome: CallOutcome,
        max_argument_bytes: usize,
        timestamp_ns: u64,
    ) -> Self {
        let method = invocation.method();
        let rendered = RenderedArguments::render(invocation.arguments(), max_argument_bytes);
        Self {
            ordinal: invocation.ordinal().get(),
            timestamp_ns,
            thread_id: format!("{:?}", std::thread::current().id()),
            method: method.qualified_name(),
            method_token: method.token(),
            mock: method.mock().map(|mock| mock.name().to_string()),
            arguments: rendered.text,
            arguments_truncated: rendered.truncated,
            outcome,
        }
    }

    /// Replaces a full rendering with its digest. A no-op once digested.
    pub fn digest_arguments(&mut self) {
        if self.arguments_truncated {
            return;
        }
        self.arguments = RenderedArguments::digest(&self.arguments).text;
        self.arguments_truncated = true;
    }
}
