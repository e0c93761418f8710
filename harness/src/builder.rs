//! Transaction draft assembly.
//!
//! [`TestBuilder`] consumes one fixture and one script program and assembles
//! a [`TransactionDraft`] in a fixed step order: inputs (the fixture redeemer
//! rides on the last one), reference inputs, script attachment, mint action,
//! outputs, signers, collateral. No I/O happens here; validation is the
//! finalize step's job.

use harness_common::{
    Address, AssetClass, Fixture, FixtureFactory, Hash, Output, ScriptData, ScriptProgram, UtxoRef,
    Value,
};
use indexmap::IndexSet;
use log::{debug, trace};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Failure to assemble a draft from a fixture.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("fixture mints assets but supplies no redeemer")]
    MintWithoutRedeemer,
}

/// How the script travels with the transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptAttachment {
    /// Script bytes embedded in the transaction witnesses
    #[default]
    Inline,
    /// Script held at a synthetic placeholder UTXO and referenced
    Reference,
}

/// Allocator for synthetic placeholder UTXOs backing reference scripts.
///
/// Scoped to a builder session rather than process-global; share one
/// allocator across builders when drafts must not collide with each other.
#[derive(Debug, Default)]
pub struct SyntheticUtxoAllocator {
    counter: AtomicU64,
}

impl SyntheticUtxoAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fabricate the next globally-unique placeholder UTXO holding the
    /// given script at the given address.
    pub fn next_for(&self, script_hash: &Hash) -> UtxoRef {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut seed = Vec::with_capacity(40 + 20);
        seed.extend_from_slice(b"synthetic-ref-script");
        seed.extend_from_slice(script_hash.as_bytes());
        seed.extend_from_slice(&seq.to_be_bytes());
        let tx_hash = Hash::digest(&seed);
        trace!("allocated synthetic utxo {}#{}", tx_hash, seq);
        UtxoRef::new(
            tx_hash,
            seq,
            Output::new(Address::from_script_hash(*script_hash), Value::coins(0)),
        )
    }
}

/// An input wired into the draft, optionally tagged with the redeemer that
/// justifies spending it.
#[derive(Clone, Debug)]
pub struct DraftInput {
    pub utxo: UtxoRef,
    pub redeemer: Option<ScriptData>,
}

/// The mint action registered on the draft, keyed by the minting-policy hash.
#[derive(Clone, Debug)]
pub struct MintAction {
    pub policy: Hash,
    pub assets: Vec<(AssetClass, i64)>,
    pub redeemer: ScriptData,
}

/// Mutable accumulator for one candidate transaction.
///
/// Owned exclusively by one [`TestBuilder`] for the duration of one test;
/// handed to the finalize step once populated.
pub struct TransactionDraft {
    pub inputs: Vec<DraftInput>,
    pub ref_inputs: Vec<UtxoRef>,
    pub script: Arc<dyn ScriptProgram>,
    pub attachment: ScriptAttachment,
    /// Placeholder UTXO holding the script on the reference path
    pub script_ref: Option<UtxoRef>,
    pub outputs: Vec<Output>,
    pub signers: IndexSet<Hash>,
    pub mint: Option<MintAction>,
    pub collateral: Option<UtxoRef>,
}

impl std::fmt::Debug for TransactionDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionDraft")
            .field("inputs", &self.inputs)
            .field("ref_inputs", &self.ref_inputs)
            .field("script", &self.script.hash())
            .field("attachment", &self.attachment)
            .field("script_ref", &self.script_ref)
            .field("outputs", &self.outputs)
            .field("signers", &self.signers)
            .field("mint", &self.mint)
            .field("collateral", &self.collateral)
            .finish()
    }
}

/// Serializable projection of the draft body, used for the size metric and
/// verbose dumps. Scripts appear as their content hash only.
#[derive(Serialize)]
pub struct DraftBody<'a> {
    pub inputs: Vec<(Hash, u64)>,
    pub ref_inputs: Vec<(Hash, u64)>,
    pub script_hash: Hash,
    pub attachment: ScriptAttachment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_ref: Option<(Hash, u64)>,
    pub outputs: &'a [Output],
    pub signers: Vec<Hash>,
    pub mint: Vec<(&'a AssetClass, i64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collateral: Option<(Hash, u64)>,
    pub change_address: &'a Address,
}

impl TransactionDraft {
    /// Body projection with the change address wired in.
    pub fn body<'a>(&'a self, change_address: &'a Address) -> DraftBody<'a> {
        DraftBody {
            inputs: self
                .inputs
                .iter()
                .map(|input| (input.utxo.tx_hash, input.utxo.index))
                .collect(),
            ref_inputs: self
                .ref_inputs
                .iter()
                .map(|utxo| (utxo.tx_hash, utxo.index))
                .collect(),
            script_hash: self.script.hash(),
            attachment: self.attachment,
            script_ref: self
                .script_ref
                .as_ref()
                .map(|utxo| (utxo.tx_hash, utxo.index)),
            outputs: &self.outputs,
            signers: self.signers.iter().copied().collect(),
            mint: self
                .mint
                .iter()
                .flat_map(|action| action.assets.iter())
                .map(|(asset, amount)| (asset, *amount))
                .collect(),
            collateral: self
                .collateral
                .as_ref()
                .map(|utxo| (utxo.tx_hash, utxo.index)),
            change_address,
        }
    }
}

/// Assembles a [`TransactionDraft`] from a fixture and a script program.
pub struct TestBuilder {
    script: Arc<dyn ScriptProgram>,
    fixture: Fixture,
    attachment: ScriptAttachment,
    allocator: Arc<SyntheticUtxoAllocator>,
}

impl TestBuilder {
    pub fn new(script: Arc<dyn ScriptProgram>, fixture: Fixture) -> Self {
        Self {
            script,
            fixture,
            attachment: ScriptAttachment::Inline,
            allocator: Arc::new(SyntheticUtxoAllocator::new()),
        }
    }

    /// Resolve the fixture through a factory that needs the script hash
    /// before the draft exists.
    pub async fn from_factory(
        script: Arc<dyn ScriptProgram>,
        factory: &dyn FixtureFactory,
    ) -> Self {
        let fixture = factory.fixture(&script.hash()).await;
        Self::new(script, fixture)
    }

    /// Choose inline embedding or reference-script attachment.
    pub fn with_attachment(mut self, attachment: ScriptAttachment) -> Self {
        self.attachment = attachment;
        self
    }

    /// Share a synthetic-UTXO allocator across builders so repeated
    /// reference-path builds never collide.
    pub fn with_allocator(mut self, allocator: Arc<SyntheticUtxoAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn script(&self) -> &Arc<dyn ScriptProgram> {
        &self.script
    }

    /// Assemble the draft. Fails only on structurally invalid fixtures.
    pub fn build(&self) -> Result<TransactionDraft, BuildError> {
        let fixture = &self.fixture;
        let last = fixture.inputs.len().checked_sub(1);

        // Step 1: inputs, redeemer on the last one
        let inputs = fixture
            .inputs
            .iter()
            .enumerate()
            .map(|(index, utxo)| DraftInput {
                utxo: utxo.clone(),
                redeemer: if Some(index) == last {
                    fixture.redeemer.clone()
                } else {
                    None
                },
            })
            .collect::<Vec<_>>();

        // Step 3: script attachment
        let script_ref = match self.attachment {
            ScriptAttachment::Inline => None,
            ScriptAttachment::Reference => Some(self.allocator.next_for(&self.script.hash())),
        };

        // Step 4: mint action, same redeemer as the spending path
        let mint = if fixture.minted.is_empty() {
            None
        } else {
            let redeemer = fixture
                .redeemer
                .clone()
                .ok_or(BuildError::MintWithoutRedeemer)?;
            Some(MintAction {
                policy: self.script.hash(),
                assets: fixture.minted.clone(),
                redeemer,
            })
        };

        debug!(
            "built draft: {} inputs, {} ref inputs, {} outputs, {} signers, mint: {}, attachment: {:?}",
            inputs.len(),
            fixture.ref_inputs.len(),
            fixture.outputs.len(),
            fixture.signatories.len(),
            mint.is_some(),
            self.attachment,
        );

        Ok(TransactionDraft {
            inputs,
            ref_inputs: fixture.ref_inputs.clone(),
            script: self.script.clone(),
            attachment: self.attachment,
            script_ref,
            outputs: fixture.outputs.clone(),
            signers: fixture.signatories.clone(),
            mint,
            collateral: fixture.collateral.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubProgram;
    use harness_common::Value;
    use std::collections::HashSet;

    fn utxo(seed: &[u8], index: u64) -> UtxoRef {
        UtxoRef::new(
            Hash::digest(seed),
            index,
            Output::new(Address::from_key_hash(Hash::zero()), Value::coins(5_000_000)),
        )
    }

    #[test]
    fn redeemer_rides_on_last_input_only() {
        let fixture = Fixture::new()
            .with_input(utxo(b"a", 0))
            .with_input(utxo(b"b", 0))
            .with_input(utxo(b"c", 0))
            .with_redeemer(ScriptData::Int(1));
        let draft = TestBuilder::new(Arc::new(StubProgram::accepting()), fixture)
            .build()
            .unwrap();

        assert!(draft.inputs[0].redeemer.is_none());
        assert!(draft.inputs[1].redeemer.is_none());
        assert_eq!(draft.inputs[2].redeemer, Some(ScriptData::Int(1)));
    }

    #[test]
    fn mint_without_redeemer_is_rejected() {
        let script = Arc::new(StubProgram::accepting());
        let asset = AssetClass::new(script.hash(), b"token".to_vec());
        let fixture = Fixture::new()
            .with_input(utxo(b"a", 0))
            .with_mint(asset, 1);

        let err = TestBuilder::new(script, fixture).build().unwrap_err();
        assert_eq!(err, BuildError::MintWithoutRedeemer);
    }

    #[test]
    fn mint_uses_policy_hash_and_shared_redeemer() {
        let script = Arc::new(StubProgram::accepting());
        let asset = AssetClass::new(script.hash(), b"token".to_vec());
        let fixture = Fixture::new()
            .with_input(utxo(b"a", 0))
            .with_mint(asset.clone(), -3)
            .with_redeemer(ScriptData::Int(9));

        let draft = TestBuilder::new(script.clone(), fixture).build().unwrap();
        let mint = draft.mint.unwrap();
        assert_eq!(mint.policy, script.hash());
        assert_eq!(mint.assets, vec![(asset, -3)]);
        assert_eq!(mint.redeemer, ScriptData::Int(9));
        // Spending path shares the same redeemer
        assert_eq!(draft.inputs[0].redeemer, Some(ScriptData::Int(9)));
    }

    #[test]
    fn reference_attachment_allocates_placeholder() {
        let script = Arc::new(StubProgram::accepting());
        let fixture = Fixture::new().with_input(utxo(b"a", 0));
        let draft = TestBuilder::new(script.clone(), fixture)
            .with_attachment(ScriptAttachment::Reference)
            .build()
            .unwrap();

        let script_ref = draft.script_ref.unwrap();
        assert_eq!(
            script_ref.resolved.address,
            Address::from_script_hash(script.hash())
        );
        assert!(matches!(draft.attachment, ScriptAttachment::Reference));
    }

    #[test]
    fn inline_attachment_has_no_placeholder() {
        let fixture = Fixture::new().with_input(utxo(b"a", 0));
        let draft = TestBuilder::new(Arc::new(StubProgram::accepting()), fixture)
            .build()
            .unwrap();
        assert!(draft.script_ref.is_none());
    }

    #[test]
    fn shared_allocator_never_collides_across_builds() {
        let script = Arc::new(StubProgram::accepting());
        let allocator = Arc::new(SyntheticUtxoAllocator::new());
        let mut seen = HashSet::new();

        for _ in 0..50 {
            let builder =
                TestBuilder::new(script.clone(), Fixture::new().with_input(utxo(b"a", 0)))
                    .with_attachment(ScriptAttachment::Reference)
                    .with_allocator(allocator.clone());
            let draft = builder.build().unwrap();
            let script_ref = draft.script_ref.unwrap();
            assert!(seen.insert((script_ref.tx_hash, script_ref.index)));
        }
    }

    #[test]
    fn body_size_is_positive_and_stable() {
        let change = Address::from_key_hash(Hash::digest(b"change"));
        let fixture = Fixture::new()
            .with_input(utxo(b"a", 0))
            .with_output(Output::new(
                Address::from_key_hash(Hash::digest(b"dest")),
                Value::coins(1_000_000),
            ));
        let draft = TestBuilder::new(Arc::new(StubProgram::accepting()), fixture)
            .build()
            .unwrap();

        let a = serde_json::to_vec(&draft.body(&change)).unwrap().len();
        let b = serde_json::to_vec(&draft.body(&change)).unwrap().len();
        assert!(a > 0);
        assert_eq!(a, b);
    }
}
