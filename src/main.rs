//! taskdesk - organizational task board CLI
//!
//! Tasks with deadlines and checklists, assigned to a person or a department,
//! stored as plain files next to the team's work.

use clap::Parser;
use taskdesk::cli::Cli;
use taskdesk::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log filter variables, most specific first.
const LOG_ENV_VARS: [&str; 2] = ["TASKDESK_LOG", "RUST_LOG"];

/// Longest filter directive accepted from the environment.
const MAX_FILTER_LEN: usize = 4096;

fn log_filter() -> EnvFilter {
    LOG_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > MAX_FILTER_LEN {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"))
}

fn main() {
    // Logs go to stderr; stdout carries command output and events.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter())
        .init();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let json = cli.json_errors();
    if let Err(err) = cli.run() {
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
