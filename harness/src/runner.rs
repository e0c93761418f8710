//! Test orchestration.
//!
//! [`ContractTester`] runs named test cases through the
//! build → finalize → classify → replay → report pipeline. Every `run`
//! invocation completes: all build/finalize/replay errors are converted into
//! a verdict at this boundary and a batch of N cases always yields N
//! verdicts. Cases may be scheduled concurrently by the caller; the shared
//! counters are atomic and each case emits its report block in a single
//! write.

use crate::builder::TestBuilder;
use crate::finalize::ExecutionOutcome;
use crate::replay::replay;
use crate::report::{render_case, render_summary, CaseReport, RunTotals};
use harness_common::{Address, NetworkParams, ScriptProgram};
use log::{debug, trace};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The assertion a test author attaches to a case.
#[derive(Clone, Debug)]
pub struct Expectation {
    pub approve: bool,
    /// Substring the error text must contain on an expected deny
    pub message: Option<String>,
}

impl Expectation {
    /// The transaction should be accepted.
    pub fn approve() -> Self {
        Self {
            approve: true,
            message: None,
        }
    }

    /// The transaction should be rejected, any reason.
    pub fn deny() -> Self {
        Self {
            approve: false,
            message: None,
        }
    }

    /// The transaction should be rejected with an error containing `message`.
    pub fn deny_with(message: impl Into<String>) -> Self {
        Self {
            approve: false,
            message: Some(message.into()),
        }
    }
}

/// Derived verdict for one executed case.
#[derive(Debug)]
pub struct TestVerdict {
    pub expected_approve: bool,
    pub expected_message: Option<String>,
    pub outcome: ExecutionOutcome,
    pub passed: bool,
}

/// Whether the outcome satisfies the expectation.
///
/// The rule, exactly:
/// ```text
/// passed =  (expected_approve AND outcome == Approved)
///        OR (NOT expected_approve AND outcome != Approved
///            AND (message absent OR error text contains message))
/// ```
pub fn classify(expectation: &Expectation, outcome: &ExecutionOutcome) -> bool {
    if expectation.approve {
        outcome.is_approved()
    } else if outcome.is_approved() {
        false
    } else {
        match (&expectation.message, outcome.error_text()) {
            (None, _) => true,
            (Some(message), Some(text)) => text.contains(message.as_str()),
            (Some(_), None) => false,
        }
    }
}

/// Shared per-runner counters, incremented atomically so concurrently
/// completing cases never lose updates.
#[derive(Debug, Default)]
struct RunStats {
    test_count: AtomicUsize,
    success_count: AtomicUsize,
    fail_count: AtomicUsize,
}

impl RunStats {
    fn record_test(&self) {
        self.test_count.fetch_add(1, Ordering::SeqCst);
    }

    fn record_result(&self, passed: bool) {
        if passed {
            self.success_count.fetch_add(1, Ordering::SeqCst);
        } else {
            self.fail_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn totals(&self) -> RunTotals {
        RunTotals {
            test_count: self.test_count.load(Ordering::SeqCst),
            success_count: self.success_count.load(Ordering::SeqCst),
            fail_count: self.fail_count.load(Ordering::SeqCst),
        }
    }
}

/// Orchestrates one or more named test cases against a contract.
pub struct ContractTester {
    params: NetworkParams,
    change_address: Address,
    group_filter: Option<String>,
    test_filter: Option<String>,
    debug_program: Option<Arc<dyn ScriptProgram>>,
    verbose: bool,
    stats: RunStats,
}

impl ContractTester {
    /// Create a runner with the cost-model parameters (fetched once by the
    /// caller) and the change address used by every finalize.
    pub fn new(change_address: Address, params: NetworkParams) -> Self {
        Self {
            params,
            change_address,
            group_filter: None,
            test_filter: None,
            debug_program: None,
            verbose: false,
            stats: RunStats::default(),
        }
    }

    /// Only execute cases matching the given group/test names. Either filter
    /// may be left open; non-matching cases are skipped without counting.
    pub fn with_filter(
        mut self,
        group_name: Option<impl Into<String>>,
        test_name: Option<impl Into<String>>,
    ) -> Self {
        self.group_filter = group_name.map(Into::into);
        self.test_filter = test_name.map(Into::into);
        self
    }

    /// Debug-mode build of the script, retained for diagnostic replay.
    pub fn with_debug_program(mut self, program: Arc<dyn ScriptProgram>) -> Self {
        self.debug_program = Some(program);
        self
    }

    /// Verbose mode: replay on every structured rejection and dump the
    /// draft body on failure.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run one named case. Always completes; the verdict is surfaced through
    /// the report output and the run totals.
    pub async fn run(
        &self,
        group: &str,
        name: &str,
        builder: TestBuilder,
        expectation: Expectation,
    ) {
        if let Some(filter) = &self.group_filter {
            if filter != group {
                trace!("skipping '{}' '{}': group filter", group, name);
                return;
            }
        }
        if let Some(filter) = &self.test_filter {
            if filter != name {
                trace!("skipping '{}' '{}': test filter", group, name);
                return;
            }
        }

        self.stats.record_test();
        let block = self.execute(group, name, builder, expectation).await;
        // One write per case keeps concurrent blocks contiguous
        print!("{}", block);
    }

    async fn execute(
        &self,
        group: &str,
        name: &str,
        builder: TestBuilder,
        expectation: Expectation,
    ) -> String {
        let draft = match builder.build() {
            Ok(draft) => draft,
            Err(error) => {
                // Malformed fixture: hard failure before finalize
                debug!("'{}' '{}' failed to build: {}", group, name, error);
                self.stats.record_result(false);
                let text = format!("build error: {}", error);
                return render_case(&CaseReport {
                    group,
                    name,
                    passed: false,
                    expected_approve: expectation.approve,
                    expected_message: expectation.message.as_deref(),
                    cost: Default::default(),
                    traces: &[],
                    error_text: Some(&text),
                    replay_error: None,
                    body_dump: None,
                });
            }
        };

        let outcome: ExecutionOutcome = draft
            .finalize(&self.params, &self.change_address)
            .await
            .into();
        let verdict = TestVerdict {
            passed: classify(&expectation, &outcome),
            expected_approve: expectation.approve,
            expected_message: expectation.message,
            outcome,
        };

        let mut traces = verdict.outcome.traces().to_vec();
        let mut replay_error = None;
        if let ExecutionOutcome::RejectedWithContext { context, .. } = &verdict.outcome {
            if !verdict.passed || self.verbose {
                if let Some(debug_program) = &self.debug_program {
                    match replay(debug_program.as_ref(), context).await {
                        // Prefer the debug build's trace output
                        Ok(lines) if !lines.is_empty() => traces = lines,
                        Ok(_) => {}
                        Err(error) => {
                            debug!("replay failed for '{}' '{}': {}", group, name, error);
                            replay_error = Some(error.to_string());
                        }
                    }
                }
            }
        }

        // Stats are committed before any rendering is attempted
        self.stats.record_result(verdict.passed);

        let body_dump = if self.verbose && !verdict.passed {
            serde_json::to_string_pretty(&draft.body(&self.change_address)).ok()
        } else {
            None
        };

        let error_text = verdict.outcome.error_text();
        render_case(&CaseReport {
            group,
            name,
            passed: verdict.passed,
            expected_approve: verdict.expected_approve,
            expected_message: verdict.expected_message.as_deref(),
            cost: verdict.outcome.cost(),
            traces: &traces,
            error_text: error_text.as_deref(),
            replay_error: replay_error.as_deref(),
            body_dump: body_dump.as_deref(),
        })
    }

    /// Aggregated counters; `test_count == success_count + fail_count`.
    pub fn totals(&self) -> RunTotals {
        self.stats.totals()
    }

    /// Print the run summary.
    pub fn display_stats(&self) {
        print!("{}", render_summary(&self.totals()));
    }
}
