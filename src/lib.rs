//! Test-vector generator for a Lyra2REv2 hardware pipeline.
//!
//! Draws deterministic 80-byte blocks, runs each through the seven-stage
//! chain and writes the captured stage boundaries as byte-reversed hex lines
//! for the HDL testbenches.

pub mod capture;
pub mod chain;
pub mod config;
pub mod error;
pub mod generator;
pub mod hasher;
pub mod hexline;
pub mod input;
pub mod primitives;

pub use config::GeneratorConfig;
pub use error::{Result, VectorError};
pub use generator::{generate_vectors, RunSummary};
