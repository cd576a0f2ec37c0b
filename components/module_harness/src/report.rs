//! Aggregate reports and reporting collaborators

use crate::error::HarnessResult;
use crate::result::{RunResult, TestStatus};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Batch report with statistics and failure details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    /// Number of modules processed
    pub modules: usize,
    /// Number of modules that failed to load
    pub load_failures: usize,
    /// Number of tests that passed
    pub passed: usize,
    /// Number of tests that failed
    pub failed: usize,
    /// Number of tests that were skipped
    pub skipped: usize,
    /// Number of failed module code, setup or teardown invocations
    pub hook_failures: usize,
    /// List of failures with (location, reason)
    pub failures: Vec<(String, String)>,
    /// List of skipped tests with (location, reason)
    pub skips: Vec<(String, String)>,
}

impl TestReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            modules: 0,
            load_failures: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            hook_failures: 0,
            failures: Vec::new(),
            skips: Vec::new(),
        }
    }

    /// Build a report over `results`
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a RunResult>) -> Self {
        let mut report = Self::new();
        for result in results {
            report.add_result(result);
        }
        report
    }

    /// Add a module result to the report
    pub fn add_result(&mut self, result: &RunResult) {
        self.modules += 1;
        if let Some(failure) = result.load_failure() {
            self.load_failures += 1;
            let location = match &failure.location {
                Some(pos) => format!("{}:{}", failure.module_id, pos),
                None => failure.module_id.to_string(),
            };
            self.failures
                .push((location, format!("{}: {}", failure.category, failure.message)));
            return;
        }

        for failure in result.runtime_failures() {
            self.failures.push((
                format!("{}::{}", failure.module_id, failure.function_name()),
                format!("{}: {}", failure.error_kind, failure.message),
            ));
        }
        self.hook_failures += result.hook_failures().len();

        for test in result.tests() {
            match &test.status {
                TestStatus::Passed => self.passed += 1,
                TestStatus::Failed(_) => self.failed += 1,
                TestStatus::Skipped(reason) => {
                    self.skipped += 1;
                    self.skips
                        .push((format!("{}::{}", result.module_id, test.name), reason.clone()));
                }
            }
        }
    }

    /// Total number of tests recorded
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Calculate the pass rate as a percentage
    pub fn pass_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.passed as f64 / total as f64) * 100.0
        }
    }

    /// Calculate the effective pass rate (excluding skips)
    pub fn effective_pass_rate(&self) -> f64 {
        let executed = self.passed + self.failed;
        if executed == 0 {
            0.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }

    /// Generate a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Module Results:\n\
             Modules: {} ({} failed to load)\n\
             Tests: {}\n\
             Passed: {} ({:.1}%)\n\
             Failed: {}\n\
             Skipped: {}\n\
             Hook Failures: {}\n\
             Effective Pass Rate: {:.1}%",
            self.modules,
            self.load_failures,
            self.total(),
            self.passed,
            self.pass_rate(),
            self.failed,
            self.skipped,
            self.hook_failures,
            self.effective_pass_rate()
        )
    }

    /// Generate a detailed report including failures
    pub fn detailed_summary(&self) -> String {
        let mut output = self.summary();

        if !self.failures.is_empty() {
            output.push_str("\n\nFailures:\n");
            for (location, reason) in &self.failures {
                output.push_str(&format!("  - {}\n    Reason: {}\n", location, reason));
            }
        }

        output
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: &TestReport) {
        self.modules += other.modules;
        self.load_failures += other.load_failures;
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.hook_failures += other.hook_failures;
        self.failures.extend(other.failures.iter().cloned());
        self.skips.extend(other.skips.iter().cloned());
    }

    /// Check if nothing failed to load or run
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Get the first N failures
    pub fn top_failures(&self, n: usize) -> Vec<&(String, String)> {
        self.failures.iter().take(n).collect()
    }

    /// Export report as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import report from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for TestReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives results as a batch progresses
pub trait Reporter {
    /// Called once per module, in run order
    fn module_finished(&mut self, result: &RunResult) -> HarnessResult<()>;

    /// Called once when the batch ends
    fn run_finished(&mut self, report: &TestReport) -> HarnessResult<()>;
}

/// Human-readable text output
pub struct SummaryReporter<W: Write> {
    out: W,
    verbose: bool,
}

impl<W: Write> SummaryReporter<W> {
    /// Write one line per module and a final summary to `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            verbose: false,
        }
    }

    /// Also list every failure after the summary
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for SummaryReporter<W> {
    fn module_finished(&mut self, result: &RunResult) -> HarnessResult<()> {
        let mark = if result.is_success() { "PASS" } else { "FAIL" };
        writeln!(self.out, "{} {}", mark, result)?;
        for failure in result.runtime_failures() {
            writeln!(self.out, "    {}", failure)?;
        }
        Ok(())
    }

    fn run_finished(&mut self, report: &TestReport) -> HarnessResult<()> {
        let text = if self.verbose {
            report.detailed_summary()
        } else {
            report.summary()
        };
        writeln!(self.out, "\n{}", text)?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    results: &'a [RunResult],
    report: &'a TestReport,
}

/// Writes every result plus the report as one JSON document
pub struct JsonReporter<W: Write> {
    out: W,
    results: Vec<RunResult>,
}

impl<W: Write> JsonReporter<W> {
    /// Buffer results and write them to `out` when the run finishes
    pub fn new(out: W) -> Self {
        Self {
            out,
            results: Vec::new(),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn module_finished(&mut self, result: &RunResult) -> HarnessResult<()> {
        self.results.push(result.clone());
        Ok(())
    }

    fn run_finished(&mut self, report: &TestReport) -> HarnessResult<()> {
        let output = JsonOutput {
            results: &self.results,
            report,
        };
        serde_json::to_writer_pretty(&mut self.out, &output)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
