use std::collections::BTreeMap;

use crossbeam_queue::SegQueue;
use expectkit_source::{SourceText, VerifierConfig};
use expectkit_syntax::build_expectations;

use crate::{
    normalize::{normalize_issues, AnalyzerIssue},
    reconcile::reconcile,
    verdict::{Discrepancy, DiscrepancyKind, FileVerdict, Verdict},
};

/// Everything needed to verify one file.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub source: SourceText,
    /// What the analyzer raised on the file, in emission order
    pub issues: Vec<AnalyzerIssue>,
    /// Expected text after applying a quickfix, by quickfix id
    pub goldens: BTreeMap<String, String>,
    /// Message of the single issue the file must raise on itself
    pub file_issue: Option<String>,
}

impl FileInput {
    pub fn new(source: SourceText, issues: Vec<AnalyzerIssue>) -> Self {
        Self { source, issues, goldens: BTreeMap::new(), file_issue: None }
    }

    pub fn with_file_issue(mut self, message: impl Into<String>) -> Self {
        self.file_issue = Some(message.into());
        self
    }

    pub fn with_golden(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.goldens.insert(id.into(), text.into());
        self
    }
}

/// Verifies fixture files against analyzer output.
///
/// Files are independent: each one is scanned, normalized and reconciled on
/// its own, so a run over many files is spread across worker threads.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn verify_file(&self, input: &FileInput) -> FileVerdict {
        let mut expectations = build_expectations(&input.source, &self.config);
        if let Some(message) = &input.file_issue {
            expectations.expect_file_issue(message, &self.config.fragment_marker);
        }
        let verdict = match normalize_issues(&input.source, &input.issues) {
            Ok(actual) => reconcile(&input.source, &self.config, &expectations, &actual, &input.goldens),
            Err(error) => {
                log::warn!("{}: {}", input.source.path(), error);
                let mut verdict = FileVerdict::new(input.source.path());
                verdict.expected = expectations.expected_count();
                verdict.actual = input.issues.len();
                verdict
                    .discrepancies
                    .push(Discrepancy::new(DiscrepancyKind::Normalization, None, None, error.to_string()));
                verdict
            }
        };
        log::info!(
            "{}: {} ({} expected, {} raised, {} discrepancies)",
            verdict.path,
            if verdict.passed() { "ok" } else { "FAILED" },
            verdict.expected,
            verdict.actual,
            verdict.discrepancies.len()
        );
        verdict
    }

    /// Verify several files; the verdict lists them in input order.
    pub fn verify_all(&self, inputs: &[FileInput]) -> Verdict {
        self.verify_all_with(inputs, |_| {})
    }

    /// Like [`verify_all`](Self::verify_all), calling `on_file` as each file finishes.
    pub fn verify_all_with<F>(&self, inputs: &[FileInput], on_file: F) -> Verdict
    where
        F: Fn(&FileVerdict) + Sync,
    {
        let workers = self
            .config
            .workers
            .unwrap_or_else(num_cpus::get)
            .clamp(1, inputs.len().max(1));
        log::debug!("Verifying {} file(s) with {} worker(s)", inputs.len(), workers);

        let pending = SegQueue::new();
        for (index, input) in inputs.iter().enumerate() {
            pending.push((index, input));
        }
        let done = SegQueue::new();

        let run = crossbeam_utils::thread::scope(|scope| {
            for worker in 0..workers {
                let (pending, done, on_file) = (&pending, &done, &on_file);
                scope.spawn(move |_| {
                    while let Some((index, input)) = pending.pop() {
                        let verdict = self.verify_file(input);
                        on_file(&verdict);
                        done.push((index, verdict));
                    }
                    log::debug!("Worker {} finished", worker);
                });
            }
        });
        if let Err(panic) = run {
            std::panic::resume_unwind(panic);
        }

        let mut files: Vec<(usize, FileVerdict)> = std::iter::from_fn(|| done.pop()).collect();
        files.sort_by_key(|(index, _)| *index);
        Verdict { files: files.into_iter().map(|(_, verdict)| verdict).collect() }
    }
}
