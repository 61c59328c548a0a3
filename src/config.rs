//! Run configuration for a certificate scan.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 443;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_RESULTS_DIR: &str = "results";

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub results_dir: PathBuf,
    pub connect_timeout: Duration,
    pub default_port: u16,
}

impl ScanConfig {
    pub fn new() -> Self {
        Self {
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            default_port: DEFAULT_PORT,
        }
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}
