use std::path::{Path, PathBuf};

use expectkit_source::SourceText;
use expectkit_verify::{AnalyzerReport, FileInput, Verdict, Verifier};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    error::{convert_io_error, CliError},
    utils::{find_goldens, load_config},
};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per discrepancy and a summary
    #[default]
    Text,
    /// The verdict as a JSON document
    Json,
}

#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub files: Vec<PathBuf>,
    pub issues: PathBuf,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub explain: bool,
    /// Message of the issue every file must raise on itself
    pub file_issue: Option<String>,
}

/// Read the analyzer report produced for the fixture files.
pub fn read_report(path: &Path) -> Result<AnalyzerReport, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| convert_io_error(e, path.to_path_buf(), "reading"))?;
    serde_json::from_str(&text).map_err(|source| CliError::ReportParse { path: path.to_path_buf(), source })
}

/// Collect the source, reported issues and golden texts of every file.
pub fn collect_inputs(
    files: &[PathBuf],
    report: &AnalyzerReport,
    golden_suffix: &str,
) -> Result<(Vec<FileInput>, Vec<SourceText>), CliError> {
    let mut inputs = Vec::with_capacity(files.len());
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let source = SourceText::read(file)?;
        let issues = report.issues_for(&report_path(file));
        let mut input = FileInput::new(source.clone(), issues);
        for (id, path) in find_goldens(file, golden_suffix)? {
            let text = std::fs::read_to_string(&path).map_err(|e| convert_io_error(e, path.clone(), "reading"))?;
            log::debug!("Golden text for `{}` of {}: {}", id, file.display(), path.display());
            input = input.with_golden(id, text);
        }
        inputs.push(input);
        sources.push(source);
    }

    for entry in &report.files {
        if !files.iter().any(|file| report_path(file) == entry.path) {
            log::warn!("The analyzer report mentions {}, which is not being verified", entry.path);
        }
    }
    Ok((inputs, sources))
}

/// The path as the analyzer report spells it: as given, without a leading `./`.
fn report_path(file: &Path) -> String {
    let path = file.strip_prefix(".").unwrap_or(file);
    path.to_string_lossy().into_owned()
}

/// Load everything from disk and verify it; nothing is printed.
pub fn run_verification(options: &VerifyOptions, progress: &ProgressBar) -> Result<(Verdict, Vec<SourceText>), CliError> {
    let current_dir = std::env::current_dir().map_err(|e| convert_io_error(e, PathBuf::from("."), "resolving"))?;
    let config = load_config(options.config.as_deref(), &current_dir)?;
    let report = read_report(&options.issues)?;
    let (mut inputs, sources) = collect_inputs(&options.files, &report, &config.golden_suffix)?;
    if let Some(message) = &options.file_issue {
        inputs = inputs.into_iter().map(|input| input.with_file_issue(message.clone())).collect();
    }

    progress.set_length(inputs.len() as u64);
    let verifier = Verifier::new(config);
    let verdict = verifier.verify_all_with(&inputs, |file| {
        progress.set_message(file.path.clone());
        progress.inc(1);
    });
    progress.finish_and_clear();
    Ok((verdict, sources))
}

pub fn handle_verify(options: &VerifyOptions) -> Result<(), CliError> {
    let progress = match options.format {
        OutputFormat::Text => ProgressBar::new(0).with_style(progress_style()?),
        OutputFormat::Json => ProgressBar::hidden(),
    };
    let (verdict, sources) = run_verification(options, &progress)?;

    match options.format {
        OutputFormat::Text => {
            if options.explain {
                for (file, source) in verdict.files.iter().zip(&sources) {
                    for discrepancy in &file.discrepancies {
                        eprintln!("{:?}", miette::Report::new(discrepancy.diagnostic(source)));
                    }
                }
            }
            print!("{}", verdict);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&verdict)
                .map_err(|e| CliError::InternalError(format!("Failed to serialize verdict: {}", e)))?;
            println!("{}", json);
        }
    }

    if verdict.passed() {
        Ok(())
    } else {
        Err(CliError::VerificationFailed {
            discrepancies: verdict.discrepancy_count(),
            failed: verdict.failed_files(),
            total: verdict.files.len(),
        })
    }
}

fn progress_style() -> Result<ProgressStyle, CliError> {
    ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
        .map(|style| style.progress_chars("=> "))
        .map_err(|e| CliError::InternalError(format!("Invalid progress template: {}", e)))
}
