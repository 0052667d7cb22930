//! Error types for terrasmith operations
//!
//! One enum per pipeline stage. Recoverable errors (`RejectionError`,
//! `BridgeError`) are consumed at the compiler boundary and converted into
//! the next strategy's attempt; everything else is terminal for the current
//! request.

use thiserror::Error;

/// A candidate document failed the DSL schema contract.
///
/// Always recoverable: the caller either falls back to the rule-based
/// extractor or counts it as a failed bridge attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RejectionError {
    #[error("required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("schema violation: {reason}")]
    Malformed { reason: String },
}

/// The fallback extractor found no usable signal in the input text.
/// Terminal for the current request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no hostname found in input")]
    NoHostname,

    #[error("extracted document failed validation: {0}")]
    SelfCheck(RejectionError),
}

/// The AI path failed. Recoverable via the fallback extractor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("request to {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("reply from {provider} contained no parsable JSON document: {reason}")]
    UnparseableReply { provider: String, reason: String },

    #[error("reply rejected by schema validator: {0}")]
    Rejected(RejectionError),
}

/// Both translation strategies are exhausted. Terminal; carries the causes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompilationError {
    #[error("AI translation failed ({bridge}); fallback extraction failed ({extraction})")]
    Exhausted {
        bridge: BridgeError,
        extraction: ExtractionError,
    },

    #[error("fallback extraction failed: {extraction}")]
    NoSignal { extraction: ExtractionError },
}

/// Run directory lifecycle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunError {
    /// A run directory with the same timestamp token already exists.
    /// Signals a clock or generation bug, never silently merged.
    #[error("run directory already exists: {path}")]
    Collision { path: String },

    #[error("no runs found under {root}")]
    NoRuns { root: String },

    #[error("run directory not found: {path}")]
    NotFound { path: String },

    #[error("I/O error at {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Terraform subprocess errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("terraform not found in PATH (install from https://terraform.io/downloads)")]
    BinaryMissing,

    #[error("terraform {command} failed with exit code {code}:\n{stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("terraform {command} was terminated by a signal")]
    Terminated { command: String },

    #[error("I/O error running terraform {command}: {reason}")]
    Io { command: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("invalid value for configuration field {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("failed to write config {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("cannot determine config directory (set HOME or TERRASMITH_CONFIG_DIR)")]
    NoConfigDir,
}

/// Master error type for all terrasmith errors.
#[derive(Debug, Clone, Error)]
pub enum TsError {
    #[error("schema error: {0}")]
    Rejection(#[from] RejectionError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("compilation error: {0}")]
    Compilation(#[from] CompilationError),

    #[error("run error: {0}")]
    Run(#[from] RunError),

    #[error("execution error: {0}")]
    Exec(#[from] ExecError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for terrasmith operations.
pub type TsResult<T> = Result<T, TsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_error_display_missing_field() {
        let err = RejectionError::RequiredFieldMissing {
            field: "intent".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("required field missing"));
        assert!(msg.contains("intent"));
    }

    #[test]
    fn test_compilation_error_display_carries_both_causes() {
        let err = CompilationError::Exhausted {
            bridge: BridgeError::Timeout {
                provider: "openai".to_string(),
                timeout_ms: 30_000,
            },
            extraction: ExtractionError::NoHostname,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("timed out after 30000ms"));
        assert!(msg.contains("no hostname found"));
    }

    #[test]
    fn test_run_error_display_collision() {
        let err = RunError::Collision {
            path: "/tmp/runs/20240101_000000_000".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("already exists"));
        assert!(msg.contains("20240101_000000_000"));
    }

    #[test]
    fn test_exec_error_display_command_failed() {
        let err = ExecError::CommandFailed {
            command: "plan".to_string(),
            code: 1,
            stdout: String::new(),
            stderr: "provider auth failed".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("terraform plan failed"));
        assert!(msg.contains("provider auth failed"));
    }

    #[test]
    fn test_ts_error_from_variants() {
        let rejection = TsError::from(RejectionError::Malformed {
            reason: "unknown field `region`".to_string(),
        });
        assert!(matches!(rejection, TsError::Rejection(_)));

        let extraction = TsError::from(ExtractionError::NoHostname);
        assert!(matches!(extraction, TsError::Extraction(_)));

        let bridge = TsError::from(BridgeError::Timeout {
            provider: "openai".to_string(),
            timeout_ms: 1,
        });
        assert!(matches!(bridge, TsError::Bridge(_)));

        let run = TsError::from(RunError::NoRuns {
            root: "terraform".to_string(),
        });
        assert!(matches!(run, TsError::Run(_)));

        let config = TsError::from(ConfigError::NoConfigDir);
        assert!(matches!(config, TsError::Config(_)));
    }
}
