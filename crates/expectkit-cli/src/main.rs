use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::Verbosity;
use expectkit_cli::commands::{handle_init, handle_verify, OutputFormat, VerifyOptions};

#[derive(Parser, Debug)]
#[command(name = "expectkit")]
#[command(about = "Verifies analyzer output against annotated fixture files", long_about = None)]
struct Args {
    #[command(flatten)]
    verbose: Verbosity,

    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Verify fixture files against an analyzer report
    Verify {
        /// Annotated fixture files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        /// JSON report of the issues the analyzer raised
        #[arg(short, long, value_name = "REPORT")]
        issues: PathBuf,
        /// Configuration file (defaults to the nearest expectkit.toml)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Render each discrepancy against its source line
        #[arg(short, long)]
        explain: bool,
        /// Expect every file to raise exactly one issue on itself, with this message
        #[arg(long, value_name = "MESSAGE")]
        file_issue: Option<String>,
    },

    /// Write a default expectkit.toml
    Init {
        /// Directory to initialize
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    match args.command {
        Command::Verify { files, issues, config, format, explain, file_issue } => {
            handle_verify(&VerifyOptions { files, issues, config, format, explain, file_issue })?;
        }
        Command::Init { dir } => {
            handle_init(&dir)?;
        }
    }
    Ok(())
}
