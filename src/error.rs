// src/error.rs
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the bootstrap pipeline. Every stage fails fast: the
/// first error aborts the run and leaves already-written artifacts on disk
/// for inspection.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("cannot prepare directory {}: {source}", .path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} exists but is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("openssl {operation} failed for {artifact}: {detail}")]
    CryptoBackend {
        operation: String,
        artifact: String,
        detail: String,
    },

    #[error("CA \"{0}\" has not been generated yet")]
    MissingCa(String),

    #[error("certificate \"{0}\" has not been generated yet")]
    MissingCertificate(String),

    #[error("cannot write {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no master node registered; internal advertise address is unknown")]
    NoAdvertiseAddress,

    #[error("invalid service subnet \"{0}\"")]
    InvalidServiceSubnet(String),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
