//! Reading candidate URLs from input files.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

pub fn read_urls(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::FileOpen(format!("{}: {}", path.display(), e)))?;

    read_lines(file)
}

pub fn read_lines(reader: impl Read) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in BufReader::new(reader).lines() {
        urls.push(line?);
    }
    Ok(urls)
}
