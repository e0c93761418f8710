//! Diagnostic replay.
//!
//! When validation rejects with a structured context, the harness re-derives
//! the argument list the runtime was evaluating and re-invokes the debug-mode
//! build of the script in isolation, bypassing transaction finalization
//! entirely. Debug builds preserve the trace instructions optimized builds
//! strip, so this is how human-readable diagnostics are recovered.

use crate::finalize::EvalContext;
use harness_common::{script::trace_lines, ScriptProgram};
use log::debug;
use thiserror::Error;

/// Diagnostic replay failed; reported alongside the primary verdict, never
/// altering it.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// The debug program could not be invoked with the reconstructed
    /// arguments (context shape mismatch, arity error, ...). Nothing was
    /// recovered.
    #[error("debug program could not replay the failing context: {0}")]
    Invocation(String),
}

/// Re-invoke the debug-mode program with the arguments reconstructed from
/// the failing context and capture its trace output.
///
/// Trace lines are recognized by the runtime's fixed prefix convention; the
/// last such line is the authoritative final diagnostic (last-write-wins).
/// A rejection during replay is the expected case — the original failure is
/// being reproduced — and still yields its trace lines. Only a rejection
/// that surfaces no trace lines at all counts as a replay failure, since
/// nothing usable was recovered.
pub async fn replay(
    debug_program: &dyn ScriptProgram,
    context: &EvalContext,
) -> Result<Vec<String>, ReplayError> {
    let args = context.argument_list();
    debug!(
        "replaying {:?} context against debug program {} ({} args)",
        context.purpose,
        debug_program.hash(),
        args.len()
    );

    match debug_program.invoke(&args).await {
        Ok(evaluation) => Ok(trace_lines(&evaluation.traces)),
        Err(failure) => {
            let lines = trace_lines(&failure.traces);
            if lines.is_empty() {
                Err(ReplayError::Invocation(failure.message))
            } else {
                Ok(lines)
            }
        }
    }
}

/// The authoritative diagnostic from a captured trace sequence.
pub fn final_diagnostic(lines: &[String]) -> Option<&str> {
    lines.last().map(String::as_str)
}
