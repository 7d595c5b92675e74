//! Error types for the simulation core
//!
//! Degenerate geometry is never an error here: solvers report it as an
//! infinite time-to-collision instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::state::{ObjectId, ObjectKind};
use crate::sim::tick::DriverMode;

/// Startup configuration failures. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by the engine and its collaborators
#[derive(Error, Debug)]
pub enum SimError {
    #[error("object {id} not found")]
    NotFound { id: ObjectId },

    #[error("object {id} is {found:?}, expected {expected:?}")]
    UnsupportedType {
        id: ObjectId,
        expected: ObjectKind,
        found: ObjectKind,
    },

    #[error("tick driver already claimed ({existing:?})")]
    DriverAlreadyClaimed { existing: DriverMode },

    #[error("tick driver belongs to engine {driver}, not engine {engine}")]
    ForeignDriver { driver: u64, engine: u64 },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type SimResult<T> = Result<T, SimError>;
