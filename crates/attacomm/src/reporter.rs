//! Reporting outcomes into the hosting test framework

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::protocol::{OutcomeKind, OutcomeRecord};

/// Name of the case reported when loading fails
pub const LOADING_CASE: &str = "Loading test components";

/// Name of the case reported when the assertion batch cannot settle
pub const BATCH_CASE: &str = "Running test assertions";

/// Assertion primitive handed to a test case body
pub trait Asserter {
    fn assert_true(&mut self, condition: bool, message: Option<&str>);
}

/// Primitives the hosting test framework provides
pub trait Harness: Send + Sync {
    /// Register a named test case and run its body
    fn test(&self, name: &str, body: &mut dyn FnMut(&mut dyn Asserter));

    /// Signal that every case has been reported
    fn done(&self);
}

/// Report one API's outcomes as a single named case.
///
/// ERROR outcomes are not assertions and are left out; the session
/// surfaces them on the operator channel instead.
pub fn report_outcomes(harness: &dyn Harness, name: &str, outcomes: &[OutcomeRecord]) {
    harness.test(name, &mut |asserter: &mut dyn Asserter| {
        for outcome in outcomes {
            match outcome.kind {
                OutcomeKind::Pass => asserter.assert_true(true, None),
                OutcomeKind::Fail => asserter.assert_true(false, outcome.message.as_deref()),
                OutcomeKind::Error => {}
            }
        }
    });
}

/// Report a fatal failure as a failed case and finish the run
pub fn report_fatal(harness: &dyn Harness, case: &str, message: &str) {
    harness.test(case, &mut |asserter: &mut dyn Asserter| {
        asserter.assert_true(false, Some(message))
    });
    harness.done();
}

/// Counts for one completed API run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub api: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn from_outcomes(api: &str, outcomes: &[OutcomeRecord]) -> Self {
        let count = |kind| outcomes.iter().filter(|o| o.kind == kind).count();
        Self {
            api: api.to_string(),
            total: outcomes.len(),
            passed: count(OutcomeKind::Pass),
            failed: count(OutcomeKind::Fail),
            errors: count(OutcomeKind::Error),
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    pub passed: bool,
    pub assertions: Vec<AssertionResult>,
}

impl CaseResult {
    pub fn failures(&self) -> impl Iterator<Item = &AssertionResult> {
        self.assertions.iter().filter(|a| !a.passed)
    }
}

impl Asserter for CaseResult {
    fn assert_true(&mut self, condition: bool, message: Option<&str>) {
        self.passed &= condition;
        self.assertions.push(AssertionResult {
            passed: condition,
            message: message.map(str::to_string),
        });
    }
}

/// In-memory harness that records every case
#[derive(Debug, Default)]
pub struct RecordingHarness {
    state: Mutex<Recorded>,
}

#[derive(Debug, Default)]
struct Recorded {
    cases: Vec<CaseResult>,
    done: bool,
}

impl RecordingHarness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cases(&self) -> Vec<CaseResult> {
        self.state.lock().cases.clone()
    }

    pub fn is_done(&self) -> bool {
        self.state.lock().done
    }

    pub fn all_passed(&self) -> bool {
        self.state.lock().cases.iter().all(|c| c.passed)
    }
}

impl Harness for RecordingHarness {
    fn test(&self, name: &str, body: &mut dyn FnMut(&mut dyn Asserter)) {
        let mut case = CaseResult {
            name: name.to_string(),
            passed: true,
            assertions: Vec::new(),
        };
        body(&mut case);
        self.state.lock().cases.push(case);
    }

    fn done(&self) {
        self.state.lock().done = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes() -> Vec<OutcomeRecord> {
        vec![
            OutcomeRecord::pass(1),
            OutcomeRecord::fail(2, "bad role"),
            OutcomeRecord::error(3, "AT crashed"),
        ]
    }

    #[test]
    fn test_report_outcomes_as_one_case() {
        let harness = RecordingHarness::new();
        report_outcomes(&harness, "button role", &outcomes());

        let cases = harness.cases();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "button role");
        assert!(!cases[0].passed);
        assert_eq!(cases[0].assertions.len(), 2);
        let failures: Vec<_> = cases[0].failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message.as_deref(), Some("2: bad role"));
        assert!(!harness.is_done());
    }

    #[test]
    fn test_report_fatal_finishes() {
        let harness = RecordingHarness::new();
        report_fatal(&harness, LOADING_CASE, "Loading of test components failed: boom");
        assert!(harness.is_done());
        assert!(!harness.all_passed());
        assert_eq!(harness.cases()[0].name, LOADING_CASE);
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary::from_outcomes("ATK", &outcomes());
        assert_eq!(
            summary,
            RunSummary {
                api: "ATK".into(),
                total: 3,
                passed: 1,
                failed: 1,
                errors: 1,
            }
        );
        assert!(!summary.success());
    }
}
