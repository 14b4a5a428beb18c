//! Process-wide call trace sink.
//!
//! Held in a `OnceLock<Mutex<Option<..>>>` so it can be installed and cleared
//! at any point; ledgers look it up on every call.

use crate::config::{LedgerConfig, DEFAULT_MAX_ARGUMENT_BYTES, DEFAULT_MAX_PAYLOAD_BYTES};
use crate::errors::MockError;
use crate::invocation::ActualInvocation;
use crate::logging::{JsonlLogger, LogEvent, DEFAULT_DISK_BUDGET_BYTES};
use crate::trace::recording::{CallOutcome, CallTraceRecord, CALL_EVENT_TYPE};
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceLimits {
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
    pub max_argument_bytes: usize,
}

impl Default for TraceLimits {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
            max_argument_bytes: DEFAULT_MAX_ARGUMENT_BYTES,
        }
    }
}

impl From<&LedgerConfig> for TraceLimits {
    fn from(cfg: &LedgerConfig) -> Self {
        Self {
            max_payload_bytes: cfg.trace.max_payload_bytes,
            budget_bytes: cfg.trace.budget_bytes,
            max_argument_bytes: cfg.render.max_argument_bytes,
        }
    }
}

pub fn timestamp_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

// ── TraceSink ─────────────────────────────────────────────────────────────────

struct TraceSink {
    logger: JsonlLogger,
    max_argument_bytes: usize,
    write_lock: Mutex<()>,
}

impl TraceSink {
    fn new(path: &Path, limits: TraceLimits) -> Self {
        let mut logger = JsonlLogger::new(path);
        logger.max_payload_bytes = limits.max_payload_bytes;
        logger.budget_bytes = limits.budget_bytes;
        Self {
            logger,
            max_argument_bytes: limits.max_argument_bytes,
            write_lock: Mutex::new(()),
        }
    }

    /// Writes one call line. Arguments are digested if the full record would
    /// not fit the logger's payload limit.
    fn emit(&self, mut record: CallTraceRecord) -> Result<(), MockError> {
        let mut payload =
            serde_json::to_value(&record).map_err(|e| MockError::Io(e.to_string()))?;
        if !record.arguments_truncated && payload.to_string().len() > self.logger.max_payload_bytes
        {
            record.digest_arguments();
            payload = serde_json::to_value(&record).map_err(|e| MockError::Io(e.to_string()))?;
        }
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.logger.append(&LogEvent {
            level: record.outcome.level(),
            event_type: CALL_EVENT_TYPE,
            payload,
        })
    }
}

static CALL_TRACE: OnceLock<Mutex<Option<Arc<TraceSink>>>> = OnceLock::new();

fn trace_slot() -> MutexGuard<'static, Option<Arc<TraceSink>>> {
    CALL_TRACE
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn active_sink() -> Option<Arc<TraceSink>> {
    trace_slot().as_ref().map(Arc::clone)
}

/// Start tracing every recorded call to `path` with default limits.
pub fn init_call_trace(path: impl AsRef<Path>) -> Result<(), MockError> {
    init_call_trace_with(path, TraceLimits::default())
}

pub fn init_call_trace_with(path: impl AsRef<Path>, limits: TraceLimits) -> Result<(), MockError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MockError::Io(e.to_string()))?;
    }
    *trace_slot() = Some(Arc::new(TraceSink::new(path, limits)));
    Ok(())
}

/// Installs the trace named by `cfg`. Returns whether a trace is now active.
pub fn init_call_trace_from_config(cfg: &LedgerConfig) -> Result<bool, MockError> {
    match &cfg.trace.path {
        Some(path) => {
            init_call_trace_with(path, TraceLimits::from(cfg))?;
            Ok(true)
        }
        None => {
            clear_call_trace();
            Ok(false)
        }
    }
}

/// Stop tracing. Ordinals are not reset.
pub fn clear_call_trace() {
    *trace_slot() = None;
}

pub fn is_tracing() -> bool {
    trace_slot().is_some()
}

/// Appends `invocation` to the active trace, if any.
pub fn trace_call<A: Debug>(invocation: &ActualInvocation<A>, outcome: CallOutcome) {
    let Some(sink) = active_sink() else {
        return;
    };
    let record = CallTraceRecord::from_invocation(
        invocation,
        outcome,
        sink.max_argument_bytes,
        timestamp_ns(),
    );
    let _ = sink.emit(record);
}

/// Byte limit for argument renderings in diagnostics: the active trace's
/// limit, or the default when no trace is installed.
pub fn argument_render_limit() -> usize {
    active_sink().map_or(DEFAULT_MAX_ARGUMENT_BYTES, |sink| sink.max_argument_bytes)
}
