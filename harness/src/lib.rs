//! # Contract Conformance Harness
//!
//! Conformance-test harness for smart-contract transaction logic: given a
//! compiled on-chain script and a declarative fixture describing a candidate
//! transaction, determine whether the validating runtime would accept or
//! reject it and verify that outcome against the test author's
//! approve/deny assertion.
//!
//! ## Pipeline
//!
//! Fixture → [`TestBuilder::build`] → draft → [`ContractTester::run`] →
//! finalize → classify → (optional) diagnostic replay → report.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use contract_harness::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let script = load_compiled_script();
//!     let runner = ContractTester::new(change_address, params);
//!
//!     let builder = TestBuilder::new(script.clone(), owner_spend_fixture());
//!     runner.run("transfer", "owner can spend", builder, Expectation::approve()).await;
//!
//!     let builder = TestBuilder::new(script, stranger_spend_fixture());
//!     runner.run("transfer", "stranger cannot", builder,
//!         Expectation::deny_with("not signed by owner")).await;
//!
//!     runner.display_stats();
//! }
//! ```
//!
//! The runner never propagates case errors: a batch of N cases always yields
//! N verdicts, surfaced through the report output and [`ContractTester::totals`].

pub mod builder;
pub mod finalize;
pub mod replay;
pub mod report;
pub mod runner;

/// Test support: stub script programs
pub mod testing;

/// Convenient re-exports for common usage
pub mod prelude {
    pub use crate::builder::{ScriptAttachment, SyntheticUtxoAllocator, TestBuilder};
    pub use crate::finalize::{CostReport, EvalContext, ExecutionOutcome, ScriptPurpose};
    pub use crate::runner::{classify, ContractTester, Expectation, TestVerdict};
    pub use harness_common::{
        Address, AssetClass, Fixture, FixtureFactory, Hash, NetworkParams, Output, ScriptData,
        ScriptProgram, UtxoRef, Value,
    };
}

pub use builder::{BuildError, TestBuilder, TransactionDraft};
pub use finalize::{EvalContext, ExecutionOutcome, ValidationError};
pub use replay::{replay, ReplayError};
pub use runner::{ContractTester, Expectation};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
