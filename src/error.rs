use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to open URL file: {0}")]
    FileOpen(String),

    #[error("Failed to parse URL: {0}")]
    UrlParse(String),

    #[error("TLS connection failed: {0}")]
    TlsConnection(String),

    #[error("Failed to render certificate: {0}")]
    Render(String),

    #[error("{0}")]
    Write(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::UrlParse(err.to_string())
    }
}

impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Self {
        Error::TlsConnection(err.to_string())
    }
}

impl From<x509_parser::error::X509Error> for Error {
    fn from(err: x509_parser::error::X509Error) -> Self {
        Error::Render(err.to_string())
    }
}

impl From<x509_parser::nom::Err<x509_parser::error::X509Error>> for Error {
    fn from(err: x509_parser::nom::Err<x509_parser::error::X509Error>) -> Self {
        Error::Render(err.to_string())
    }
}

impl Error {
    pub fn detail(&self) -> String {
        match self {
            Error::Io(e) => e.to_string(),
            Error::FileOpen(m)
            | Error::UrlParse(m)
            | Error::TlsConnection(m)
            | Error::Render(m)
            | Error::Write(m)
            | Error::InvalidInput(m) => m.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
