use std::fs;
use std::path::Path;

use expectkit_cli::commands::{handle_init, handle_verify, run_verification, OutputFormat, VerifyOptions};
use expectkit_cli::CliError;
use expectkit_verify::DiscrepancyKind;
use indicatif::ProgressBar;

const FIXTURE: &str = "\
class Parentheses {
  void m(boolean B) {
    if (B) {
    // Noncompliant@-1 [[sc=9;ec=10;quickfixes=qf1]] {{Add parentheses around this condition.}}
    // fix@qf1 {{Add parentheses}}
    // edit@qf1 [[sc=9;ec=9]] {{(}}
    // edit@qf1 [[sc=10;ec=10]] {{)}}
    }
  }
}
";

fn report_for(path: &Path, message: &str) -> String {
    format!(
        r#"{{"files": [{{"path": {path:?}, "issues": [{{
            "line": 3, "column": 9, "end_line": 3, "end_column": 10,
            "message": {message:?},
            "quickfixes": [{{"description": "Add parentheses", "edits": [
                {{"start_line": 3, "start_column": 9, "end_line": 3, "end_column": 9, "replacement": "("}},
                {{"start_line": 3, "start_column": 10, "end_line": 3, "end_column": 10, "replacement": ")"}}
            ]}}]
        }}]}}]}}"#,
        path = path.to_string_lossy(),
        message = message,
    )
}

fn workspace(message: &str, golden: Option<&str>) -> (tempfile::TempDir, VerifyOptions) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Parentheses.java");
    fs::write(&file, FIXTURE).unwrap();
    if let Some(golden) = golden {
        fs::write(dir.path().join("Parentheses.java.qf1.fixed"), golden).unwrap();
    }
    let issues = dir.path().join("issues.json");
    fs::write(&issues, report_for(&file, message)).unwrap();
    handle_init(dir.path()).unwrap();

    let options = VerifyOptions {
        files: vec![file],
        issues,
        config: Some(dir.path().join("expectkit.toml")),
        format: OutputFormat::Json,
        explain: false,
        file_issue: None,
    };
    (dir, options)
}

#[test]
fn verifies_files_with_their_golden_texts() {
    let golden = FIXTURE.replacen("    if (B) {", "    if ((B)) {", 1);
    let (_dir, options) = workspace("Add parentheses around this condition.", Some(&golden));
    let (verdict, sources) = run_verification(&options, &ProgressBar::hidden()).unwrap();
    assert!(verdict.passed(), "{}", verdict);
    assert_eq!(sources.len(), 1);
    assert!(handle_verify(&options).is_ok());
}

#[test]
fn stale_golden_text_fails_the_run() {
    let (_dir, options) = workspace("Add parentheses around this condition.", Some(FIXTURE));
    let (verdict, _) = run_verification(&options, &ProgressBar::hidden()).unwrap();
    let kinds: Vec<_> = verdict.files[0].discrepancies.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiscrepancyKind::QuickfixTextMismatch]);
    assert!(matches!(
        handle_verify(&options),
        Err(CliError::VerificationFailed { discrepancies: 1, failed: 1, total: 1 })
    ));
}

#[test]
fn message_mismatch_is_reported_without_golden() {
    let (_dir, options) = workspace("Wrap this condition.", None);
    let (verdict, _) = run_verification(&options, &ProgressBar::hidden()).unwrap();
    assert_eq!(verdict.files[0].discrepancies[0].kind, DiscrepancyKind::MessageMismatch);
}

#[test]
fn unreadable_report_is_an_error() {
    let (dir, mut options) = workspace("x", None);
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    options.issues = dir.path().join("broken.json");
    assert!(matches!(
        run_verification(&options, &ProgressBar::hidden()),
        Err(CliError::ReportParse { .. })
    ));

    options.issues = dir.path().join("missing.json");
    assert!(matches!(
        run_verification(&options, &ProgressBar::hidden()),
        Err(CliError::IoError { .. })
    ));
}

#[test]
fn invalid_config_is_an_error() {
    let (dir, options) = workspace("x", None);
    fs::write(dir.path().join("expectkit.toml"), "workers = 0\n").unwrap();
    assert!(matches!(
        run_verification(&options, &ProgressBar::hidden()),
        Err(CliError::Config(_))
    ));
}

#[test]
fn file_issue_is_expected_on_every_file() {
    let golden = FIXTURE.replacen("    if (B) {", "    if ((B)) {", 1);
    let (_dir, mut options) = workspace("Add parentheses around this condition.", Some(&golden));
    options.file_issue = Some("Move this class to its own file".to_string());
    let (verdict, _) = run_verification(&options, &ProgressBar::hidden()).unwrap();
    let discrepancies = &verdict.files[0].discrepancies;
    assert_eq!(discrepancies.len(), 1);
    assert_eq!(discrepancies[0].kind, DiscrepancyKind::MissingIssue);
    assert_eq!(discrepancies[0].line, None);
}
