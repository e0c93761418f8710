//! Report rendering.
//!
//! Pure functions from a classified test case to formatted text. Each case
//! renders to a single string emitted in one write, so output blocks from
//! concurrently running cases never interleave line-by-line. Rendering never
//! feeds back into pass/fail determination.

use crate::finalize::CostReport;
use crate::replay::final_diagnostic;
use std::fmt::Write;

const SEPARATOR: &str = "------------------------------";

/// Everything the sink needs to render one case.
pub struct CaseReport<'a> {
    pub group: &'a str,
    pub name: &'a str,
    pub passed: bool,
    pub expected_approve: bool,
    pub expected_message: Option<&'a str>,
    pub cost: CostReport,
    /// Trace lines shown to the user; replay output when available
    pub traces: &'a [String],
    /// Raw error text of the outcome, when it was a rejection
    pub error_text: Option<&'a str>,
    /// Secondary error from a failed diagnostic replay
    pub replay_error: Option<&'a str>,
    /// Verbose body dump, shown on failure when requested
    pub body_dump: Option<&'a str>,
}

/// Aggregated counters for one runner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub test_count: usize,
    pub success_count: usize,
    pub fail_count: usize,
}

/// Render one case to its output block.
pub fn render_case(report: &CaseReport<'_>) -> String {
    let mut out = String::new();
    let framed = !report.passed || !report.traces.is_empty();

    if framed {
        out.push_str(SEPARATOR);
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{} - {:<7} - {:<25} '{}' ( mem:{}, cpu:{}, size:{} bytes )",
        if report.passed { "PASS" } else { "FAIL" },
        if report.expected_approve {
            "APPROVE"
        } else {
            "DENY"
        },
        report.group,
        report.name,
        report.cost.budget.mem,
        report.cost.budget.cpu,
        report.cost.size,
    );

    if !report.traces.is_empty() {
        out.push_str("   PRINT STATEMENTS:\n");
        for line in report.traces {
            let _ = writeln!(out, "   {}", line);
        }
    }

    if !report.passed {
        let expected = report.expected_message.unwrap_or(if report.expected_approve {
            "approval"
        } else {
            "rejection"
        });
        let _ = writeln!(out, "   EXPECTED:\n   {}", expected);

        // Last trace line wins; fall back to the raw error text, then to
        // the bare mismatch description.
        let received = final_diagnostic(report.traces)
            .or(report.error_text)
            .unwrap_or(if report.expected_approve {
                "tx denied"
            } else {
                "tx approved"
            });
        let _ = writeln!(out, "   RECEIVED:\n   {}", received);
    }

    if let Some(replay_error) = report.replay_error {
        let _ = writeln!(out, "   REPLAY ERROR:\n   {}", replay_error);
    }

    if let Some(dump) = report.body_dump {
        let _ = writeln!(out, "   TX BODY:\n{}", dump);
    }

    if framed {
        out.push_str(SEPARATOR);
        out.push('\n');
    }

    out
}

/// Render the run-level summary.
pub fn render_summary(totals: &RunTotals) -> String {
    let mut out = String::new();
    out.push_str("** SUMMARY **\n");
    let _ = writeln!(out, "{:>5} total tests", totals.test_count);
    if totals.success_count > 0 {
        let _ = writeln!(out, "{:>5} successful", totals.success_count);
    }
    if totals.fail_count > 0 {
        let _ = writeln!(out, "{:>5} failed", totals.fail_count);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_common::ExecutionBudget;

    fn base_report<'a>(traces: &'a [String]) -> CaseReport<'a> {
        CaseReport {
            group: "transfer",
            name: "owner can spend",
            passed: true,
            expected_approve: true,
            expected_message: None,
            cost: CostReport {
                budget: ExecutionBudget::new(120, 450),
                size: 310,
            },
            traces,
            error_text: None,
            replay_error: None,
            body_dump: None,
        }
    }

    #[test]
    fn passing_case_is_one_line() {
        let rendered = render_case(&base_report(&[]));
        assert_eq!(rendered.lines().count(), 1);
        assert!(rendered.starts_with("PASS - APPROVE - transfer"));
        assert!(rendered.contains("'owner can spend' ( mem:120, cpu:450, size:310 bytes )"));
    }

    #[test]
    fn failing_case_has_expected_received_block() {
        let mut report = base_report(&[]);
        report.passed = false;
        report.expected_approve = false;
        report.expected_message = Some("not signed by owner");
        report.error_text = Some("wrong datum shape");

        let rendered = render_case(&report);
        assert!(rendered.starts_with(SEPARATOR));
        assert!(rendered.contains("FAIL - DENY"));
        assert!(rendered.contains("EXPECTED:\n   not signed by owner"));
        assert!(rendered.contains("RECEIVED:\n   wrong datum shape"));
        assert!(rendered.ends_with(&format!("{}\n", SEPARATOR)));
    }

    #[test]
    fn last_trace_line_wins_as_received() {
        let traces = vec!["INFO: step one".to_string(), "INFO: final word".to_string()];
        let mut report = base_report(&traces);
        report.passed = false;
        report.error_text = Some("raw error");

        let rendered = render_case(&report);
        assert!(rendered.contains("PRINT STATEMENTS:"));
        assert!(rendered.contains("RECEIVED:\n   INFO: final word"));
    }

    #[test]
    fn unexpected_approval_received_text() {
        let mut report = base_report(&[]);
        report.passed = false;
        report.expected_approve = false;

        let rendered = render_case(&report);
        assert!(rendered.contains("RECEIVED:\n   tx approved"));
    }

    #[test]
    fn replay_error_is_a_secondary_block() {
        let mut report = base_report(&[]);
        report.passed = false;
        report.replay_error = Some("shape mismatch");

        let rendered = render_case(&report);
        assert!(rendered.contains("REPLAY ERROR:\n   shape mismatch"));
    }

    #[test]
    fn summary_hides_zero_counters() {
        let all_pass = render_summary(&RunTotals {
            test_count: 3,
            success_count: 3,
            fail_count: 0,
        });
        assert!(all_pass.contains("3 total tests"));
        assert!(all_pass.contains("3 successful"));
        assert!(!all_pass.contains("failed"));

        let with_failures = render_summary(&RunTotals {
            test_count: 2,
            success_count: 0,
            fail_count: 2,
        });
        assert!(with_failures.contains("2 failed"));
        assert!(!with_failures.contains("successful"));
    }
}
