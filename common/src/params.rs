//! Opaque network cost-model parameters.
//!
//! Parameters are fetched once per runner init by the caller (over HTTP in
//! production setups) and forwarded to the finalize step. The harness does
//! not interpret them beyond an optional execution-budget ceiling.

use crate::script::ExecutionBudget;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Wrapper around the raw parameter document supplied by the caller.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NetworkParams(Json);

impl NetworkParams {
    pub fn new(raw: Json) -> Self {
        Self(raw)
    }

    /// The raw document, for forwarding
    pub fn raw(&self) -> &Json {
        &self.0
    }

    /// Optional per-transaction execution ceiling, read from
    /// `max_tx_ex_mem` / `max_tx_ex_cpu` when both are present.
    pub fn max_budget(&self) -> Option<ExecutionBudget> {
        let mem = self.0.get("max_tx_ex_mem")?.as_u64()?;
        let cpu = self.0.get("max_tx_ex_cpu")?.as_u64()?;
        Some(ExecutionBudget::new(mem, cpu))
    }
}
