mod check;
mod cli;
mod utils;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Format};
use std::io::Write;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use utils::Severity;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    // Ctrl+C：静默退出
    if let Err(e) = ctrlc::set_handler(|| {
        std::process::exit(Severity::Unknown.exit_code());
    }) {
        warn!("cannot install Ctrl-C handler: {}", e);
    }

    let status = match run(&cli) {
        Ok(status) => status,
        Err(e) => {
            println!("{}: {:#}", Severity::Unknown, e);
            Severity::Unknown
        }
    };

    std::process::exit(status.exit_code());
}

fn run(cli: &Cli) -> anyhow::Result<Severity> {
    let result = check::run_check(&cli.config());

    let line = match cli.format {
        Format::Text => result.render(),
        Format::Json => result.to_json()?,
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line).context("writing status line")?;
    stdout.flush().context("writing status line")?;

    Ok(result.status)
}

/// stderr only; stdout carries the status line.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
