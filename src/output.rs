//! Persisting rendered certificates, one text file per host.

use crate::error::{Error, Result};
use crate::resolve::HostPort;
use std::fs;
use std::path::{Path, PathBuf};

pub fn write_certificate(results_dir: &Path, host: &HostPort, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(results_dir)
        .map_err(|e| Error::Write(format!("Failed to create results directory: {}", e)))?;

    let path = results_dir.join(format!("{}.txt", host.file_stem()));
    fs::write(&path, text).map_err(|e| {
        Error::Write(format!(
            "Failed to write certificate to {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(path)
}
