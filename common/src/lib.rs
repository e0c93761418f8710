//! Shared data model for the contract conformance harness.
//!
//! This crate holds the leaf types consumed by the `contract-harness`
//! pipeline: content hashes, the script data value tree, fixtures describing
//! candidate transactions, the `ScriptProgram` collaborator trait and the
//! opaque network parameter wrapper.

pub mod crypto;
pub mod data;
pub mod fixture;
pub mod params;
pub mod script;

pub use crypto::Hash;
pub use data::ScriptData;
pub use fixture::{Address, AssetClass, Fixture, FixtureFactory, Output, UtxoRef, Value};
pub use params::NetworkParams;
pub use script::{Evaluation, ExecutionBudget, ScriptFailure, ScriptProgram, TRACE_PREFIX};
