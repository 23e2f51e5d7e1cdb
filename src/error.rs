use std::path::PathBuf;

use thiserror::Error;

use crate::chain::Stage;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("cannot open vector stream {path}: {source}")]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write to vector stream {path} failed: {source}")]
    StreamWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stage {stage} failed: {reason}")]
    Primitive { stage: Stage, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown stage '{0}' (expected blake, keccak, cube1, lyra2, skein, cube2, bmw or 1..7)")]
    UnknownStage(String),
}

pub type Result<T> = std::result::Result<T, VectorError>;
