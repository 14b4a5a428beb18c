//! Opt-in JSONL trace of every recorded call.
//!
//! # Overview
//!
//! When a trace is installed, each `MethodLedger::record` appends one
//! `CallTraceRecord` line: the ordinal, the method slot, the rendered
//! arguments and how the call resolved. The trace is a debugging aid for the
//! test that produced it. Write failures are swallowed so tracing can never
//! change the outcome of a mocked call.

pub mod reader;
pub mod recorder;
pub mod recording;
