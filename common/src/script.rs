//! The script program seam.
//!
//! The validating runtime is an external collaborator: the harness only needs
//! to address a compiled script by content hash and invoke it with an
//! argument list. Implementations wrap whatever interpreter actually runs the
//! bytecode. Debug-mode builds preserve trace instructions that optimized
//! builds may strip; both must report the same content hash for the same
//! on-chain logic.

use crate::crypto::Hash;
use crate::data::ScriptData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Prefix identifying trace/print lines emitted by script logic.
///
/// The runtime's trace convention is last-write-wins: the final line carrying
/// this prefix is the authoritative diagnostic message.
pub const TRACE_PREFIX: &str = "INFO";

/// Execution cost consumed by one script invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionBudget {
    /// Memory units
    pub mem: u64,
    /// CPU / execution units
    pub cpu: u64,
}

impl ExecutionBudget {
    pub const fn new(mem: u64, cpu: u64) -> Self {
        Self { mem, cpu }
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self {
            mem: self.mem.saturating_add(other.mem),
            cpu: self.cpu.saturating_add(other.cpu),
        }
    }

    /// True when either dimension exceeds the given ceiling
    pub fn exceeds(&self, ceiling: &Self) -> bool {
        self.mem > ceiling.mem || self.cpu > ceiling.cpu
    }
}

impl fmt::Display for ExecutionBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mem:{}, cpu:{}", self.mem, self.cpu)
    }
}

/// Successful script invocation: the produced value, the cost consumed and
/// any trace lines emitted along the way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub value: ScriptData,
    pub budget: ExecutionBudget,
    pub traces: Vec<String>,
}

impl Evaluation {
    pub fn unit(budget: ExecutionBudget) -> Self {
        Self {
            value: ScriptData::unit(),
            budget,
            traces: Vec::new(),
        }
    }
}

/// Failed script invocation.
///
/// Trace lines emitted before the failure are preserved; debug-mode builds
/// are expected to carry more of them than optimized builds.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct ScriptFailure {
    pub message: String,
    pub traces: Vec<String>,
    pub budget: ExecutionBudget,
}

impl ScriptFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            traces: Vec::new(),
            budget: ExecutionBudget::default(),
        }
    }

    pub fn with_traces(mut self, traces: Vec<String>) -> Self {
        self.traces = traces;
        self
    }

    pub fn with_budget(mut self, budget: ExecutionBudget) -> Self {
        self.budget = budget;
        self
    }
}

/// A compiled on-chain script, addressable by content hash and invocable
/// with an argument list.
#[async_trait]
pub trait ScriptProgram: Send + Sync {
    /// Deterministic hash over the compiled bytecode. Doubles as the
    /// minting-policy hash when the script authorizes minting.
    fn hash(&self) -> Hash;

    /// Run the script against the given arguments.
    async fn invoke(&self, args: &[ScriptData]) -> Result<Evaluation, ScriptFailure>;
}

/// Extract the trace lines carrying the [`TRACE_PREFIX`] convention.
pub fn trace_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| line.starts_with(TRACE_PREFIX))
        .cloned()
        .collect()
}
