//! Finalize/validate step.
//!
//! Runs a populated [`TransactionDraft`] through the simulated validating
//! runtime: structural checks first, then the spending and minting script
//! invocations. The result is a [`Result`] whose error variant already
//! carries the failure taxonomy, so outcome classification downstream is a
//! pure function of the value rather than exception inspection.

use crate::builder::TransactionDraft;
use harness_common::{
    script::trace_lines, Address, ExecutionBudget, NetworkParams, ScriptData,
};
use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

/// Which validation path a script invocation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPurpose {
    Spending,
    Minting,
}

/// The arguments the runtime was evaluating when a script rejected.
///
/// Fields are checked by presence: the datum is populated only on the
/// spending path, when the consumed output carries one.
#[derive(Clone, Debug)]
pub struct EvalContext {
    pub purpose: ScriptPurpose,
    pub datum: Option<ScriptData>,
    pub redeemer: ScriptData,
    pub script_context: ScriptData,
}

impl EvalContext {
    /// The argument list the runtime passes to the script:
    /// `[datum?, redeemer, script_context]`, datum prepended only on the
    /// spending path.
    pub fn argument_list(&self) -> Vec<ScriptData> {
        let mut args = Vec::with_capacity(3);
        if self.purpose == ScriptPurpose::Spending {
            if let Some(datum) = &self.datum {
                args.push(datum.clone());
            }
        }
        args.push(self.redeemer.clone());
        args.push(self.script_context.clone());
        args
    }
}

/// Validation failure raised by the finalize step.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A script invocation rejected; carries the replayable context.
    #[error("script rejected transaction: {message}")]
    Rejected {
        message: String,
        context: Box<EvalContext>,
        traces: Vec<String>,
        budget: ExecutionBudget,
        size: usize,
    },
    /// Structural or budget failure with no replayable context.
    #[error("{0}")]
    Invalid(String),
}

/// Cost metrics of a finalized transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CostReport {
    pub budget: ExecutionBudget,
    /// Serialized byte size of the transaction body
    pub size: usize,
}

/// Result of one finalize attempt, as seen by classification.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Draft finalized and validated without error
    Approved { cost: CostReport, traces: Vec<String> },
    /// Validation failed with a replayable argument context
    RejectedWithContext {
        message: String,
        context: Box<EvalContext>,
        traces: Vec<String>,
        cost: CostReport,
    },
    /// Validation failed with only a free-text error
    RejectedOpaque(String),
}

impl ExecutionOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, ExecutionOutcome::Approved { .. })
    }

    /// Text matched against an expected deny message.
    pub fn error_text(&self) -> Option<String> {
        match self {
            ExecutionOutcome::Approved { .. } => None,
            ExecutionOutcome::RejectedWithContext {
                message, traces, ..
            } => {
                let mut text = message.clone();
                for line in traces {
                    text.push('\n');
                    text.push_str(line);
                }
                Some(text)
            }
            ExecutionOutcome::RejectedOpaque(message) => Some(message.clone()),
        }
    }

    pub fn cost(&self) -> CostReport {
        match self {
            ExecutionOutcome::Approved { cost, .. } => *cost,
            ExecutionOutcome::RejectedWithContext { cost, .. } => *cost,
            ExecutionOutcome::RejectedOpaque(_) => CostReport::default(),
        }
    }

    pub fn traces(&self) -> &[String] {
        match self {
            ExecutionOutcome::Approved { traces, .. } => traces,
            ExecutionOutcome::RejectedWithContext { traces, .. } => traces,
            ExecutionOutcome::RejectedOpaque(_) => &[],
        }
    }
}

impl From<Result<(CostReport, Vec<String>), ValidationError>> for ExecutionOutcome {
    fn from(result: Result<(CostReport, Vec<String>), ValidationError>) -> Self {
        match result {
            Ok((cost, traces)) => ExecutionOutcome::Approved { cost, traces },
            Err(ValidationError::Rejected {
                message,
                context,
                traces,
                budget,
                size,
            }) => ExecutionOutcome::RejectedWithContext {
                message,
                context,
                traces,
                cost: CostReport { budget, size },
            },
            Err(ValidationError::Invalid(message)) => ExecutionOutcome::RejectedOpaque(message),
        }
    }
}

impl TransactionDraft {
    /// Project the draft into the script-context value handed to scripts.
    pub fn script_context(&self, purpose: ScriptPurpose) -> ScriptData {
        let inputs = ScriptData::List(
            self.inputs
                .iter()
                .map(|input| {
                    ScriptData::constr(
                        0,
                        vec![
                            ScriptData::bytes(input.utxo.tx_hash.as_bytes().to_vec()),
                            ScriptData::Int(input.utxo.index as i128),
                        ],
                    )
                })
                .collect(),
        );
        let ref_inputs = ScriptData::List(
            self.ref_inputs
                .iter()
                .map(|utxo| {
                    ScriptData::constr(
                        0,
                        vec![
                            ScriptData::bytes(utxo.tx_hash.as_bytes().to_vec()),
                            ScriptData::Int(utxo.index as i128),
                        ],
                    )
                })
                .collect(),
        );
        let outputs = ScriptData::List(
            self.outputs
                .iter()
                .map(|output| {
                    let mut fields = vec![
                        ScriptData::bytes(output.address.0.as_bytes().to_vec()),
                        ScriptData::Int(output.value.coins as i128),
                    ];
                    if let Some(datum) = &output.datum {
                        fields.push(datum.clone());
                    }
                    ScriptData::constr(0, fields)
                })
                .collect(),
        );
        let mint = ScriptData::Map(
            self.mint
                .iter()
                .flat_map(|action| action.assets.iter())
                .map(|(asset, amount)| {
                    (
                        ScriptData::constr(
                            0,
                            vec![
                                ScriptData::bytes(asset.policy.as_bytes().to_vec()),
                                ScriptData::bytes(asset.name.clone()),
                            ],
                        ),
                        ScriptData::Int(*amount as i128),
                    )
                })
                .collect(),
        );
        let signers = ScriptData::List(
            self.signers
                .iter()
                .map(|key| ScriptData::bytes(key.as_bytes().to_vec()))
                .collect(),
        );
        let purpose_data = match purpose {
            ScriptPurpose::Spending => {
                // The spent UTXO is the one carrying the redeemer
                let spent = self
                    .inputs
                    .iter()
                    .find(|input| input.redeemer.is_some())
                    .or_else(|| self.inputs.last());
                match spent {
                    Some(input) => ScriptData::constr(
                        0,
                        vec![
                            ScriptData::bytes(input.utxo.tx_hash.as_bytes().to_vec()),
                            ScriptData::Int(input.utxo.index as i128),
                        ],
                    ),
                    None => ScriptData::constr(0, Vec::new()),
                }
            }
            ScriptPurpose::Minting => ScriptData::constr(
                1,
                vec![ScriptData::bytes(self.script.hash().as_bytes().to_vec())],
            ),
        };

        ScriptData::constr(
            0,
            vec![inputs, ref_inputs, outputs, mint, signers, purpose_data],
        )
    }

    /// Finalize and validate the draft against the supplied network
    /// parameters and change address.
    ///
    /// Fee and change handling belongs to the validating runtime; here the
    /// change address only participates in the serialized body. The spending
    /// path always runs the script against the consumed input, and the
    /// minting path runs it again when a mint action is registered,
    /// aggregating cost across invocations.
    pub async fn finalize(
        &self,
        params: &NetworkParams,
        change_address: &Address,
    ) -> Result<(CostReport, Vec<String>), ValidationError> {
        if self.inputs.is_empty() {
            return Err(ValidationError::Invalid(
                "transaction body has no inputs".to_string(),
            ));
        }

        let size = serde_json::to_vec(&self.body(change_address))
            .map_err(|e| ValidationError::Invalid(format!("body serialization failed: {}", e)))?
            .len();

        let mut budget = ExecutionBudget::default();
        let mut traces = Vec::new();

        // Spending path: the script validates consumption of its input with
        // [datum?, redeemer, script_context]. The redeemer rides on the input
        // tagged by the builder; when the fixture supplied none, the unit
        // value stands in and the script still runs.
        if let Some(input) = self
            .inputs
            .iter()
            .find(|input| input.redeemer.is_some())
            .or_else(|| self.inputs.last())
        {
            let context = EvalContext {
                purpose: ScriptPurpose::Spending,
                datum: input.utxo.resolved.datum.clone(),
                redeemer: input.redeemer.clone().unwrap_or_else(ScriptData::unit),
                script_context: self.script_context(ScriptPurpose::Spending),
            };
            let (spent, lines) = self.invoke(context, size).await?;
            budget = budget.saturating_add(spent);
            traces.extend(lines);
        }

        // Minting path: same redeemer, no datum.
        if let Some(mint) = &self.mint {
            let context = EvalContext {
                purpose: ScriptPurpose::Minting,
                datum: None,
                redeemer: mint.redeemer.clone(),
                script_context: self.script_context(ScriptPurpose::Minting),
            };
            let (spent, lines) = self.invoke(context, size).await?;
            budget = budget.saturating_add(spent);
            traces.extend(lines);
        }

        if let Some(ceiling) = params.max_budget() {
            if budget.exceeds(&ceiling) {
                warn!("execution budget exceeded: {} > {}", budget, ceiling);
                return Err(ValidationError::Invalid(format!(
                    "execution budget exceeded: consumed {}, limit {}",
                    budget, ceiling
                )));
            }
        }

        debug!("draft finalized: {}, size:{} bytes", budget, size);
        Ok((CostReport { budget, size }, traces))
    }

    async fn invoke(
        &self,
        context: EvalContext,
        size: usize,
    ) -> Result<(ExecutionBudget, Vec<String>), ValidationError> {
        let args = context.argument_list();
        match self.script.invoke(&args).await {
            Ok(evaluation) => Ok((evaluation.budget, trace_lines(&evaluation.traces))),
            Err(failure) => Err(ValidationError::Rejected {
                message: failure.message.clone(),
                traces: trace_lines(&failure.traces),
                budget: failure.budget,
                size,
                context: Box::new(context),
            }),
        }
    }
}
