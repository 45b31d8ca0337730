use crate::check::classify::Thresholds;
use crate::check::discovery::DiscoveryRoots;
use crate::check::CheckConfig;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "check_docker")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Check that the Docker containers this host should run are up and healthy", long_about = None)]
pub struct Cli {
    /// Verbose logging to stderr
    #[arg(long)]
    pub debug: bool,

    /// Discover containers from docker-<name> init scripts
    #[arg(long = "init_d")]
    pub init_d: bool,

    /// Discover containers from systemd units and compose files
    #[arg(
        long,
        action = ArgAction::Set,
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub systemd: bool,

    /// Seconds of runtime after which a container is OK
    #[arg(long = "runtime_ok", default_value_t = 120)]
    pub runtime_ok: u64,

    /// Seconds of runtime below which a container is CRITICAL
    #[arg(long = "runtime_warn", default_value_t = 60)]
    pub runtime_warn: u64,

    /// Init script directory
    #[arg(long = "init_d_dir", default_value = "/etc/init.d")]
    pub init_d_dir: PathBuf,

    /// systemd unit directory
    #[arg(long = "systemd_dir", default_value = "/etc/systemd/system")]
    pub systemd_dir: PathBuf,

    /// Docker CLI binary
    #[arg(long, default_value = "docker")]
    pub docker: String,

    /// Per-container inspect timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl Cli {
    pub fn config(&self) -> CheckConfig {
        CheckConfig {
            roots: DiscoveryRoots {
                init_d: self.init_d.then(|| self.init_d_dir.clone()),
                systemd: self.systemd.then(|| self.systemd_dir.clone()),
            },
            thresholds: Thresholds {
                runtime_ok: self.runtime_ok,
                runtime_warn: self.runtime_warn,
            },
            docker: self.docker.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}
