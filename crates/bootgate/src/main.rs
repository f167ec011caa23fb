//! Entry point for the `bootgate` client runtime.

use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match bootgate::run_client().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "client runtime failed to start");
            drop(writeln!(io::stderr(), "bootgate: {error}"));
            ExitCode::FAILURE
        }
    }
}
