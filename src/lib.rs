//! Certificate Summarizer - who issued the certificates of a list of websites?
//!
//! Reads URLs from plain text files (one per line), opens a TLS connection to
//! each host without verifying anything, and reports on the certificate the
//! server placed last in its chain:
//!
//! - the certificate is dumped as text to `results/<hostname>.txt`
//! - hosts are counted by the certificate's Organization / Organizational Unit
//! - failures are counted by kind and kept per host (or raw URL)
//!
//! # Example
//!
//! ```no_run
//! use certificate_summarizer::{Report, ScanConfig, Scanner};
//!
//! let scanner = Scanner::with_tls(ScanConfig::default()).unwrap();
//! let mut report = Report::new();
//! scanner.scan_files(&["urls.txt"], &mut report);
//! print!("{}", report);
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod render;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod source;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};

pub use config::ScanConfig;
pub use fetch::{CertificateChain, CertificateSource, TlsFetcher};
pub use render::{organization_label, render_certificate, CertificateDetails};
pub use report::{FailureKind, Report};
pub use resolve::{resolve_host, HostPort};
pub use scan::Scanner;
