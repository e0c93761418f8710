//! Transaction fixtures.
//!
//! A [`Fixture`] is an immutable description of the pieces composing one
//! candidate transaction: inputs, reference inputs, outputs, signers, minted
//! assets, a redeemer and optional collateral. Test setup code produces one
//! fixture per test case; the builder consumes it without mutating it.

use crate::crypto::Hash;
use crate::data::ScriptData;
use async_trait::async_trait;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A payment address backed by a key or script hash.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub Hash);

impl Address {
    pub fn from_key_hash(hash: Hash) -> Self {
        Self(hash)
    }

    /// Address of the script itself, for outputs locked at the contract
    pub fn from_script_hash(hash: Hash) -> Self {
        Self(hash)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "addr_{}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// An asset class: minting policy plus asset name.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetClass {
    pub policy: Hash,
    pub name: Vec<u8>,
}

impl AssetClass {
    pub fn new(policy: Hash, name: impl Into<Vec<u8>>) -> Self {
        Self {
            policy,
            name: name.into(),
        }
    }
}

impl fmt::Debug for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.policy, hex::encode(&self.name))
    }
}

/// A quantity of the native coin plus any multi-asset amounts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub coins: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<(AssetClass, u64)>,
}

impl Value {
    pub fn coins(coins: u64) -> Self {
        Self {
            coins,
            assets: Vec::new(),
        }
    }

    pub fn with_asset(mut self, asset: AssetClass, amount: u64) -> Self {
        self.assets.push((asset, amount));
        self
    }
}

/// A transaction output: destination, value, optional inline datum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub address: Address,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datum: Option<ScriptData>,
}

impl Output {
    pub fn new(address: Address, value: Value) -> Self {
        Self {
            address,
            value,
            datum: None,
        }
    }

    pub fn with_datum(mut self, datum: ScriptData) -> Self {
        self.datum = Some(datum);
        self
    }
}

/// A reference to an unspent transaction output, together with the resolved
/// output it points at.
///
/// Carrying the resolved output lets the spending validation path recover the
/// datum attached to the UTXO being consumed without a chain lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoRef {
    pub tx_hash: Hash,
    pub index: u64,
    pub resolved: Output,
}

impl UtxoRef {
    pub fn new(tx_hash: Hash, index: u64, resolved: Output) -> Self {
        Self {
            tx_hash,
            index,
            resolved,
        }
    }
}

/// Immutable description of a candidate transaction.
///
/// At most one redeemer is associated with the whole draft; when minting
/// occurs the same redeemer justifies both the spending and the minting
/// validation paths.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Fixture {
    pub inputs: Vec<UtxoRef>,
    pub ref_inputs: Vec<UtxoRef>,
    pub outputs: Vec<Output>,
    pub signatories: IndexSet<Hash>,
    /// Ordered (asset class, signed amount) pairs; negative amounts burn
    pub minted: Vec<(AssetClass, i64)>,
    pub redeemer: Option<ScriptData>,
    pub collateral: Option<UtxoRef>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, input: UtxoRef) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_ref_input(mut self, input: UtxoRef) -> Self {
        self.ref_inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_signer(mut self, key_hash: Hash) -> Self {
        self.signatories.insert(key_hash);
        self
    }

    pub fn with_mint(mut self, asset: AssetClass, amount: i64) -> Self {
        self.minted.push((asset, amount));
        self
    }

    pub fn with_redeemer(mut self, redeemer: ScriptData) -> Self {
        self.redeemer = Some(redeemer);
        self
    }

    pub fn with_collateral(mut self, collateral: UtxoRef) -> Self {
        self.collateral = Some(collateral);
        self
    }
}

/// Factory producing the fixture for one test case.
///
/// The factory may perform asynchronous work and receives the script's
/// content hash, so fixtures can reference the contract's own address (an
/// input locked at the script, for instance) before the draft exists.
/// Returns exactly one fixture per call.
#[async_trait]
pub trait FixtureFactory: Send + Sync {
    async fn fixture(&self, script_hash: &Hash) -> Fixture;
}

#[async_trait]
impl<F> FixtureFactory for F
where
    F: Fn(&Hash) -> Fixture + Send + Sync,
{
    async fn fixture(&self, script_hash: &Hash) -> Fixture {
        self(script_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output() -> Output {
        Output::new(Address::from_key_hash(Hash::zero()), Value::coins(2_000_000))
    }

    #[test]
    fn builder_methods_accumulate_in_order() {
        let asset = AssetClass::new(Hash::digest(b"policy"), b"token".to_vec());
        let fixture = Fixture::new()
            .with_input(UtxoRef::new(Hash::digest(b"a"), 0, sample_output()))
            .with_input(UtxoRef::new(Hash::digest(b"b"), 1, sample_output()))
            .with_output(sample_output())
            .with_signer(Hash::digest(b"key"))
            .with_mint(asset.clone(), 1)
            .with_redeemer(ScriptData::unit());

        assert_eq!(fixture.inputs.len(), 2);
        assert_eq!(fixture.inputs[0].tx_hash, Hash::digest(b"a"));
        assert_eq!(fixture.minted, vec![(asset, 1)]);
        assert!(fixture.redeemer.is_some());
        assert!(fixture.collateral.is_none());
    }

    #[test]
    fn duplicate_signers_collapse() {
        let key = Hash::digest(b"key");
        let fixture = Fixture::new().with_signer(key).with_signer(key);
        assert_eq!(fixture.signatories.len(), 1);
    }

    #[tokio::test]
    async fn closure_acts_as_factory() {
        let factory = |script_hash: &Hash| {
            Fixture::new().with_output(Output::new(
                Address::from_script_hash(*script_hash),
                Value::coins(1),
            ))
        };
        let fixture = FixtureFactory::fixture(&factory, &Hash::digest(b"s")).await;
        assert_eq!(fixture.outputs.len(), 1);
    }
}
