use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TissuegraphError {
    #[error("missing config file tissuegraph.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid species id: {0}")]
    InvalidSpeciesId(String),

    #[error("failed to read {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("no organ directive in dataset header of {0}")]
    MissingOrgan(String),

    #[error("{count} malformed record(s) in {path}")]
    MalformedRecords { path: String, count: usize },

    #[error("unsafe relationship type: {0:?}")]
    UnsafeRelationshipType(String),

    #[error("failed to ensure uniqueness index on :{label}({property}): {message}")]
    IndexCreation {
        label: String,
        property: String,
        message: String,
    },

    #[error("graph store request failed: {0}")]
    GraphHttp(String),

    #[error("batch commit failed with status {status}: {message}")]
    CommitFailed { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
