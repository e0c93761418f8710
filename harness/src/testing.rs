//! Test support: configurable stub script programs.
//!
//! Unit and integration tests drive the pipeline with stubs instead of a
//! real interpreter; the trait seam makes them interchangeable.

use async_trait::async_trait;
use harness_common::{
    Evaluation, ExecutionBudget, Hash, ScriptData, ScriptFailure, ScriptProgram,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum StubBehavior {
    Accept,
    Reject(String),
}

/// A script program with scripted behavior, recording the arguments of its
/// most recent invocation.
pub struct StubProgram {
    hash: Hash,
    behavior: StubBehavior,
    traces: Vec<String>,
    budget: ExecutionBudget,
    invocations: AtomicUsize,
    last_args: Mutex<Option<Vec<ScriptData>>>,
}

impl StubProgram {
    fn new(behavior: StubBehavior) -> Self {
        Self {
            hash: Hash::digest(b"stub-program"),
            behavior,
            traces: Vec::new(),
            budget: ExecutionBudget::new(100, 200),
            invocations: AtomicUsize::new(0),
            last_args: Mutex::new(None),
        }
    }

    /// A program that accepts every invocation.
    pub fn accepting() -> Self {
        Self::new(StubBehavior::Accept)
    }

    /// A program that rejects every invocation with the given message.
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self::new(StubBehavior::Reject(message.into()))
    }

    /// Override the content hash, for multi-script setups.
    pub fn with_hash(mut self, hash: Hash) -> Self {
        self.hash = hash;
        self
    }

    /// Trace lines emitted on every invocation, successful or not.
    pub fn with_traces(mut self, traces: Vec<String>) -> Self {
        self.traces = traces;
        self
    }

    pub fn with_budget(mut self, budget: ExecutionBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Number of invocations so far.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Arguments of the most recent invocation, if any.
    pub fn last_args(&self) -> Option<Vec<ScriptData>> {
        self.last_args.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl ScriptProgram for StubProgram {
    fn hash(&self) -> Hash {
        self.hash
    }

    async fn invoke(&self, args: &[ScriptData]) -> Result<Evaluation, ScriptFailure> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_args.lock() {
            *guard = Some(args.to_vec());
        }
        match &self.behavior {
            StubBehavior::Accept => Ok(Evaluation {
                value: ScriptData::unit(),
                budget: self.budget,
                traces: self.traces.clone(),
            }),
            StubBehavior::Reject(message) => Err(ScriptFailure::new(message.clone())
                .with_traces(self.traces.clone())
                .with_budget(self.budget)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_records_invocations() {
        let stub = StubProgram::accepting();
        assert_eq!(stub.invocations(), 0);
        stub.invoke(&[ScriptData::Int(1)]).await.unwrap();
        assert_eq!(stub.invocations(), 1);
        assert_eq!(stub.last_args().unwrap(), vec![ScriptData::Int(1)]);
    }

    #[tokio::test]
    async fn rejecting_stub_carries_traces() {
        let stub = StubProgram::rejecting("denied").with_traces(vec!["INFO: why".to_string()]);
        let failure = stub.invoke(&[]).await.unwrap_err();
        assert_eq!(failure.message, "denied");
        assert_eq!(failure.traces, vec!["INFO: why".to_string()]);
    }
}
