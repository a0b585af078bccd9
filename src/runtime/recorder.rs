//! Recording and replaying calls through a [`CallInterceptor`].

use super::CallInterceptor;
use crate::abi::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One call that returned normally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub function: String,
    pub args: Vec<Value>,
    pub result: Value,
}

#[derive(Debug, Clone, Copy)]
pub struct RecordLimits {
    /// Oldest records are dropped once this many are held
    pub max_records: usize,
}

impl Default for RecordLimits {
    fn default() -> Self {
        Self {
            max_records: 10_000,
        }
    }
}

/// Records every call that completes normally.
#[derive(Debug, Default)]
pub struct Recorder {
    limits: RecordLimits,
    records: Mutex<VecDeque<CallRecord>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: RecordLimits) -> Self {
        Self {
            limits,
            records: Mutex::new(VecDeque::new()),
        }
    }

    /// Snapshot of the records, oldest first
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records())
    }
}

impl CallInterceptor for Recorder {
    fn before_call(&self, _function: &str, _args: &[Value]) -> Option<Value> {
        None
    }

    fn after_call(&self, function: &str, args: &[Value], output: &Value) {
        if self.limits.max_records == 0 {
            return;
        }
        let mut records = self.records.lock();
        while records.len() >= self.limits.max_records {
            records.pop_front();
        }
        records.push_back(CallRecord {
            function: function.to_string(),
            args: args.to_vec(),
            result: output.clone(),
        });
        tracing::trace!(function, held = records.len(), "recorded call");
    }
}

/// Answers calls from previously recorded results.
///
/// Each record is used at most once, in recording order. A call with no
/// matching record falls through to the real function.
#[derive(Debug, Default)]
pub struct Replayer {
    pending: Mutex<Vec<CallRecord>>,
}

impl Replayer {
    pub fn new(records: Vec<CallRecord>) -> Self {
        Self {
            pending: Mutex::new(records),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<CallRecord> = serde_json::from_str(json)?;
        Ok(Self::new(records))
    }

    /// Records not yet replayed
    pub fn remaining(&self) -> usize {
        self.pending.lock().len()
    }
}

impl CallInterceptor for Replayer {
    fn before_call(&self, function: &str, args: &[Value]) -> Option<Value> {
        let mut pending = self.pending.lock();
        let index = pending
            .iter()
            .position(|r| r.function == function && r.args == args)?;
        let record = pending.remove(index);
        tracing::trace!(function, left = pending.len(), "replayed call");
        Some(record.result)
    }

    fn after_call(&self, function: &str, _args: &[Value], _output: &Value) {
        tracing::debug!(function, "no recorded result, called through");
    }
}
