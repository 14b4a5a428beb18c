//! Load a call trace back for inspection inside the test that wrote it.

use crate::errors::MockError;
use crate::log_retention::rotated_segments;
use crate::logging::LogLine;
use crate::trace::recording::{CallOutcome, CallTraceRecord, CALL_EVENT_TYPE};
use std::path::{Path, PathBuf};

/// A parsed trace file.
#[derive(Debug, Clone, Default)]
pub struct CallTrace {
    pub calls: Vec<CallTraceRecord>,
    /// Call lines whose payload was cut by the logger's payload limit.
    pub truncated_lines: usize,
}

impl CallTrace {
    /// Reads the rotated segments of `path`, oldest first, then `path` itself.
    pub fn load(path: &Path) -> Result<Self, MockError> {
        let mut trace = Self::default();
        for file in rotated_segments(path)?
            .iter()
            .map(PathBuf::as_path)
            .chain(std::iter::once(path))
        {
            let raw = std::fs::read_to_string(file).map_err(|e| MockError::Io(e.to_string()))?;
            trace.parse_lines(&raw, &file.display().to_string())?;
        }
        trace.calls.sort_by_key(|record| record.ordinal);
        Ok(trace)
    }

    pub fn parse(raw: &str) -> Result<Self, MockError> {
        let mut trace = Self::default();
        trace.parse_lines(raw, "trace")?;
        trace.calls.sort_by_key(|record| record.ordinal);
        Ok(trace)
    }

    fn parse_lines(&mut self, raw: &str, source: &str) -> Result<(), MockError> {
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry: LogLine = serde_json::from_str(line).map_err(|e| {
                MockError::TraceParse(format!("{source} line {}: {e}", idx + 1))
            })?;
            if entry.event_type != CALL_EVENT_TYPE {
                continue;
            }
            if entry.payload.is_string() {
                self.truncated_lines += 1;
                continue;
            }
            let record: CallTraceRecord = serde_json::from_value(entry.payload).map_err(|e| {
                MockError::TraceParse(format!("{source} line {}: {e}", idx + 1))
            })?;
            self.calls.push(record);
        }
        Ok(())
    }

    /// Calls into one method slot, in ordinal order.
    pub fn calls_for(&self, method_token: u64) -> Vec<&CallTraceRecord> {
        self.calls
            .iter()
            .filter(|record| record.method_token == method_token)
            .collect()
    }

    pub fn outcomes_for(&self, method_token: u64) -> Vec<CallOutcome> {
        self.calls_for(method_token)
            .into_iter()
            .map(|record| record.outcome)
            .collect()
    }
}
