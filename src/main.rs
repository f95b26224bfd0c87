use clap::Parser;
use finbot::cli::{Cli, run};
use std::process::ExitCode;

fn init_tracing() -> Result<(), String> {
    let filter = std::env::var("FINBOT_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("error: {e}");
        return ExitCode::from(1);
    }
    run(Cli::parse())
}
