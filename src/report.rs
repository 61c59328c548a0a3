//! Run-wide tallies of captured certificates and failures.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    UrlParse,
    TlsConnection,
    Render,
    Write,
}

impl FailureKind {
    pub fn counter(&self) -> &'static str {
        match self {
            FailureKind::UrlParse => "failed_url_parse",
            FailureKind::TlsConnection => "failed_tls_conn",
            FailureKind::Render => "failed_render",
            FailureKind::Write => "write_error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    summary: BTreeMap<String, usize>,
    failures: BTreeMap<String, String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, label: impl Into<String>) {
        *self.summary.entry(label.into()).or_insert(0) += 1;
    }

    /// Bumps the kind's counter and stores `message` under `key`, replacing
    /// whatever an earlier failure left there.
    pub fn record_failure(
        &mut self,
        kind: FailureKind,
        key: impl Into<String>,
        message: impl Into<String>,
    ) {
        *self.summary.entry(kind.counter().to_string()).or_insert(0) += 1;
        self.failures.insert(key.into(), message.into());
    }

    pub fn count(&self, label: &str) -> usize {
        self.summary.get(label).copied().unwrap_or(0)
    }

    pub fn failure(&self, key: &str) -> Option<&str> {
        self.failures.get(key).map(String::as_str)
    }

    pub fn summary(&self) -> &BTreeMap<String, usize> {
        &self.summary
    }

    pub fn failures(&self) -> &BTreeMap<String, String> {
        &self.failures
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Successful Connections")?;
        writeln!(f, "O == Organization")?;
        writeln!(f, "OU == Organizational Unit")?;
        for (label, count) in &self.summary {
            writeln!(f, "{}: {}", label, count)?;
        }

        writeln!(f)?;
        writeln!(f, "Failures")?;
        for (key, message) in &self.failures {
            writeln!(f, "{}: {}", key, message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_counts_accumulate() {
        let mut report = Report::new();
        report.record_success("O: Acme OU: ");
        report.record_success("O: Acme OU: ");
        report.record_success("O:  OU: Eng");

        assert_eq!(report.count("O: Acme OU: "), 2);
        assert_eq!(report.count("O:  OU: Eng"), 1);
        assert_eq!(report.count("O: Nobody OU: "), 0);
        assert!(report.failures().is_empty());
    }

    #[test]
    fn test_failure_bumps_counter_and_records_message() {
        let mut report = Report::new();
        report.record_failure(FailureKind::UrlParse, "not a url", "relative URL without a base");

        assert_eq!(report.count("failed_url_parse"), 1);
        assert_eq!(report.failure("not a url"), Some("relative URL without a base"));
    }

    #[test]
    fn test_failure_map_is_last_write_wins() {
        let mut report = Report::new();
        report.record_failure(FailureKind::TlsConnection, "example.com:443", "timeout");
        report.record_failure(FailureKind::Write, "example.com:443", "disk full");

        assert_eq!(report.failure("example.com:443"), Some("disk full"));
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.count("failed_tls_conn"), 1);
        assert_eq!(report.count("write_error"), 1);
    }

    #[test]
    fn test_counter_names() {
        assert_eq!(FailureKind::UrlParse.counter(), "failed_url_parse");
        assert_eq!(FailureKind::TlsConnection.counter(), "failed_tls_conn");
        assert_eq!(FailureKind::Write.counter(), "write_error");
        assert_eq!(FailureKind::Render.counter(), "failed_render");
    }

    #[test]
    fn test_display_layout() {
        let mut report = Report::new();
        report.record_success("O: Acme OU: Web");
        report.record_failure(FailureKind::UrlParse, "not a url", "bad");

        let expected = "Successful Connections\n\
                        O == Organization\n\
                        OU == Organizational Unit\n\
                        O: Acme OU: Web: 1\n\
                        failed_url_parse: 1\n\
                        \n\
                        Failures\n\
                        not a url: bad\n";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_display_empty_report() {
        let text = Report::new().to_string();
        assert!(text.starts_with("Successful Connections\n"));
        assert!(text.ends_with("\nFailures\n"));
    }
}
