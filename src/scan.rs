//! The per-URL pipeline: resolve, fetch, select, render, write, tally.

use crate::config::ScanConfig;
use crate::error::Result;
use crate::fetch::{CertificateSource, TlsFetcher};
use crate::output::write_certificate;
use crate::render::CertificateDetails;
use crate::report::{FailureKind, Report};
use crate::resolve::resolve_host;
use crate::source::read_urls;
use log::{error, info, warn};
use std::path::Path;

pub struct Scanner<S> {
    source: S,
    config: ScanConfig,
}

impl Scanner<TlsFetcher> {
    pub fn with_tls(config: ScanConfig) -> Result<Self> {
        let fetcher = TlsFetcher::new(config.connect_timeout)?;
        Ok(Self::new(fetcher, config))
    }
}

impl<S: CertificateSource> Scanner<S> {
    pub fn new(source: S, config: ScanConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn scan_files<P: AsRef<Path>>(&self, files: &[P], report: &mut Report) {
        for file in files {
            self.scan_file(file.as_ref(), report);
        }
    }

    pub fn scan_file(&self, path: &Path, report: &mut Report) {
        let urls = match read_urls(path) {
            Ok(urls) => urls,
            Err(e) => {
                error!("{}", e);
                return;
            }
        };

        info!("Checking {} URL(s) from {}", urls.len(), path.display());
        for raw in &urls {
            self.scan_url(raw, report);
        }
    }

    pub fn scan_url(&self, raw: &str, report: &mut Report) {
        let host = match resolve_host(raw, self.config.default_port) {
            Ok(host) => host,
            Err(e) => {
                warn!("{}", e);
                report.record_failure(FailureKind::UrlParse, raw, e.detail());
                return;
            }
        };

        let chain = match self.source.fetch_chain(&host) {
            Ok(chain) => chain,
            Err(e) => {
                warn!("{}", e);
                report.record_failure(FailureKind::TlsConnection, host.as_str(), e.detail());
                return;
            }
        };

        let details = match CertificateDetails::from_der(chain.select()) {
            Ok(details) => details,
            Err(e) => {
                warn!("{}: {}", host, e);
                report.record_failure(FailureKind::Render, host.as_str(), e.detail());
                return;
            }
        };

        let label = details.label();
        info!("{}: {} ({} certificate(s) in chain)", host, label, chain.len());
        report.record_success(label);

        if let Err(e) = write_certificate(&self.config.results_dir, &host, &details.to_text()) {
            warn!("{}", e);
            report.record_failure(FailureKind::Write, host.as_str(), e.detail());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fetch::CertificateChain;
    use crate::resolve::HostPort;
    use rcgen::{CertificateParams, DnType, KeyPair};
    use rustls::pki_types::CertificateDer;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;

    fn cert(cn: &str, org: Option<&str>, unit: Option<&str>) -> CertificateDer<'static> {
        let mut params = CertificateParams::new(vec![cn.to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, cn);
        if let Some(org) = org {
            params.distinguished_name.push(DnType::OrganizationName, org);
        }
        if let Some(unit) = unit {
            params
                .distinguished_name
                .push(DnType::OrganizationalUnitName, unit);
        }
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().clone()
    }

    /// Serves canned chains and remembers which hosts were asked for.
    #[derive(Default)]
    struct CannedSource {
        chains: HashMap<String, Vec<CertificateDer<'static>>>,
        requested: RefCell<Vec<String>>,
    }

    impl CannedSource {
        fn with_chain(mut self, host: &str, chain: Vec<CertificateDer<'static>>) -> Self {
            self.chains.insert(host.to_string(), chain);
            self
        }
    }

    impl CertificateSource for CannedSource {
        fn fetch_chain(&self, host: &HostPort) -> Result<CertificateChain> {
            self.requested.borrow_mut().push(host.to_string());
            match self.chains.get(host.as_str()) {
                Some(chain) => CertificateChain::new(chain.clone()),
                None => Err(Error::TlsConnection(format!(
                    "dial tcp {}: i/o timeout",
                    host
                ))),
            }
        }
    }

    fn scanner(source: CannedSource, dir: &Path) -> Scanner<CannedSource> {
        Scanner::new(source, ScanConfig::new().with_results_dir(dir.join("results")))
    }

    #[test]
    fn test_mixed_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("urls.txt");
        fs::write(&input, "https://example.com\nnot a url\n").unwrap();

        let source = CannedSource::default().with_chain(
            "example.com:443",
            vec![cert("example.com", Some("Example Inc"), Some("Web"))],
        );
        let scanner = scanner(source, dir.path());
        let mut report = Report::new();
        scanner.scan_files(&[&input], &mut report);

        assert_eq!(report.count("failed_url_parse"), 1);
        assert!(report.failure("not a url").is_some());
        assert_eq!(report.count("O: Example Inc OU: Web"), 1);

        let written = dir.path().join("results").join("example.com.txt");
        let text = fs::read_to_string(written).unwrap();
        assert!(text.contains("O=Example Inc"));

        // The unparseable line never reaches the fetcher.
        assert_eq!(*scanner.source.requested.borrow(), vec!["example.com:443"]);
    }

    #[test]
    fn test_last_certificate_in_chain_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = CannedSource::default().with_chain(
            "chain.example:443",
            vec![
                cert("chain.example", Some("Leaf Org"), None),
                cert("Intermediate", Some("Middle Org"), None),
                cert("Root", Some("Top Org"), Some("Roots")),
            ],
        );
        let scanner = scanner(source, dir.path());
        let mut report = Report::new();
        scanner.scan_url("https://chain.example", &mut report);

        assert_eq!(report.count("O: Top Org OU: Roots"), 1);
        assert_eq!(report.count("O: Leaf Org OU: "), 0);
        assert_eq!(report.summary().len(), 1);
    }

    #[test]
    fn test_tls_failure_is_keyed_by_resolved_host() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = scanner(CannedSource::default(), dir.path());
        let mut report = Report::new();
        scanner.scan_url("https://unreachable.example", &mut report);

        assert_eq!(report.count("failed_tls_conn"), 1);
        assert_eq!(
            report.failure("unreachable.example:443"),
            Some("dial tcp unreachable.example:443: i/o timeout")
        );
        assert!(!dir.path().join("results").exists());
    }

    #[test]
    fn test_unrenderable_certificate_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = CannedSource::default()
            .with_chain("broken.example:443", vec![CertificateDer::from(vec![0u8; 8])])
            .with_chain("ok.example:443", vec![cert("ok.example", Some("Fine"), None)]);
        let scanner = scanner(source, dir.path());
        let mut report = Report::new();
        scanner.scan_url("https://broken.example", &mut report);
        scanner.scan_url("https://ok.example", &mut report);

        assert_eq!(report.count("failed_render"), 1);
        assert!(report.failure("broken.example:443").is_some());
        assert_eq!(report.count("O: Fine OU: "), 1);
    }

    #[test]
    fn test_write_failure_still_counts_the_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("results");
        fs::write(&blocker, "a file where the directory should be").unwrap();

        let source = CannedSource::default()
            .with_chain("example.com:443", vec![cert("example.com", Some("Acme"), None)]);
        let scanner = scanner(source, dir.path());
        let mut report = Report::new();
        scanner.scan_url("https://example.com", &mut report);

        assert_eq!(report.count("O: Acme OU: "), 1);
        assert_eq!(report.count("write_error"), 1);
        assert!(report.failure("example.com:443").is_some());
    }

    #[test]
    fn test_same_host_twice_keeps_last_content() {
        let dir = tempfile::tempdir().unwrap();
        let source = CannedSource::default()
            .with_chain("example.com:443", vec![cert("example.com", Some("First"), None)])
            .with_chain("example.com:8443", vec![cert("example.com", Some("Second"), None)]);
        let scanner = scanner(source, dir.path());
        let mut report = Report::new();
        scanner.scan_url("https://example.com", &mut report);
        scanner.scan_url("https://example.com:8443", &mut report);

        let text = fs::read_to_string(dir.path().join("results").join("example.com.txt")).unwrap();
        assert!(text.contains("O=Second"));
        assert!(!text.contains("O=First"));
    }

    #[test]
    fn test_missing_input_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        fs::write(&good, "not a url\n").unwrap();

        let scanner = scanner(CannedSource::default(), dir.path());
        let mut report = Report::new();
        scanner.scan_files(&[dir.path().join("missing.txt"), good], &mut report);

        assert_eq!(report.count("failed_url_parse"), 1);
    }
}
