//! TERRASMITH CORE - Shared error taxonomy and configuration
//!
//! This crate holds the pieces every other terrasmith crate needs:
//! the layered error enums (one per pipeline stage, folded into the
//! master [`TsError`]) and the on-disk TOML configuration.

pub mod config;
pub mod error;

pub use config::{AuthSection, Config, DefaultsSection, DEFAULT_MODEL_ID};
pub use error::{
    BridgeError, CompilationError, ConfigError, ExecError, ExtractionError, RejectionError,
    RunError, TsError, TsResult,
};
