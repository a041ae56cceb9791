mod init;
mod verify;

pub use init::handle_init;
pub use verify::{collect_inputs, handle_verify, read_report, run_verification, OutputFormat, VerifyOptions};
