use crate::config::{ScanConfig, DEFAULT_RESULTS_DIR};
use crate::error::{Error, Result};
use crate::report::Report;
use crate::scan::Scanner;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "certificate_summarizer")]
#[command(
    version,
    about = "A tool which checks a list of websites and summarizes the certificate information",
    long_about = None
)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        required = true,
        value_name = "FILE",
        help = "File(s) with URLs of websites, one per line"
    )]
    pub files: Vec<PathBuf>,

    #[arg(
        long,
        default_value = DEFAULT_RESULTS_DIR,
        help = "Directory receiving one <hostname>.txt per host"
    )]
    pub results_dir: PathBuf,

    #[arg(
        long,
        default_value = "5",
        help = "Seconds allowed for connecting and completing the TLS handshake"
    )]
    pub timeout: u64,

    #[arg(long, default_value = "info", help = "Log level: error, warn, info, debug, trace")]
    pub log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Display version and build information about the tool")]
    Version,
}

impl Cli {
    pub fn scan_config(&self) -> Result<ScanConfig> {
        if self.timeout == 0 {
            return Err(Error::InvalidInput(
                "--timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(ScanConfig::new()
            .with_results_dir(&self.results_dir)
            .with_connect_timeout(Duration::from_secs(self.timeout)))
    }
}

const NOT_AVAILABLE: &str = "development-not_available";

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub binary: &'static str,
    pub version: &'static str,
    pub rust_version: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
    pub git_hash: &'static str,
    pub build_time: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            binary: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            rust_version: option_env!("RUSTC_VERSION").unwrap_or(NOT_AVAILABLE),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            git_hash: option_env!("BUILD_HASH").unwrap_or(NOT_AVAILABLE),
            build_time: option_env!("BUILD_TIME").unwrap_or(NOT_AVAILABLE),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Binary:\t\t{}", self.binary)?;
        writeln!(f, "Version:\t{}", self.version)?;
        writeln!(f, "Rust Version:\t{}", self.rust_version)?;
        writeln!(f, "OS:\t\t{}", self.os)?;
        writeln!(f, "Arch:\t\t{}", self.arch)?;
        writeln!(f, "Git Hash:\t{}", self.git_hash)?;
        write!(f, "Build Time:\t{}", self.build_time)
    }
}

pub fn init_logger(level: LevelFilter) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("rustls", LevelFilter::Warn);
    builder.target(env_logger::Target::Stderr);

    builder.format(|buf, record| {
        let level = record.level();
        let colored_level = match level {
            log::Level::Error => level.to_string().red(),
            log::Level::Warn => level.to_string().yellow(),
            log::Level::Info => level.to_string().green(),
            log::Level::Debug => level.to_string().blue(),
            log::Level::Trace => level.to_string().purple(),
        };
        writeln!(buf, "[{}] {}", colored_level, record.args())
    });

    // Already initialised in tests that call this twice.
    let _ = builder.try_init();
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Version) = cli.command {
        println!("{}", BuildInfo::current());
        return Ok(());
    }

    init_logger(cli.log_level);

    let config = cli.scan_config()?;
    let scanner = Scanner::with_tls(config)?;

    let mut report = Report::new();
    scanner.scan_files(&cli.files, &mut report);

    print!("{}", report);
    Ok(())
}
