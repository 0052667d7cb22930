//! Execution Orchestrator - terraform subprocess wrapper.
//!
//! Invoked against exactly one resolved run directory. Output is captured
//! and surfaced verbatim; the core never parses terraform's stdout beyond
//! its exit code contract (`plan -detailed-exitcode` exits 2 when changes
//! are present, which is success here).

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use terrasmith_core::ExecError;
use tracing::info;

const TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

pub struct TerraformRunner {
    work_dir: PathBuf,
    api_token: Option<String>,
}

impl TerraformRunner {
    /// `api_token` is injected into the subprocess environment when the
    /// ambient environment does not already carry one. It never appears in
    /// logs or error messages.
    pub fn new(work_dir: impl Into<PathBuf>, api_token: Option<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            api_token,
        }
    }

    pub fn init(&self) -> Result<String, ExecError> {
        self.run_captured("init", &["init", "-upgrade"])
    }

    pub fn plan(&self) -> Result<String, ExecError> {
        self.run_captured("plan", &["plan", "-detailed-exitcode"])
    }

    pub fn apply(&self, auto_approve: bool) -> Result<String, ExecError> {
        self.run_confirming("apply", auto_approve)
    }

    pub fn destroy(&self, auto_approve: bool) -> Result<String, ExecError> {
        self.run_confirming("destroy", auto_approve)
    }

    /// Installed terraform version, if the binary is reachable.
    pub fn version() -> Option<String> {
        let output = Command::new("terraform").arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("Terraform v"))
            .map(|v| v.trim().to_string())
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("terraform");
        cmd.args(args).current_dir(&self.work_dir);
        if std::env::var_os(TOKEN_ENV).is_none() {
            if let Some(token) = &self.api_token {
                cmd.env(TOKEN_ENV, token);
            }
        }
        cmd
    }

    fn run_captured(&self, name: &str, args: &[&str]) -> Result<String, ExecError> {
        info!(command = name, dir = %self.work_dir.display(), "running terraform");
        let output = self.command(args).output().map_err(|e| classify_spawn(name, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        match output.status.code() {
            Some(0) => Ok(stdout),
            // plan -detailed-exitcode: 2 means "changes present"
            Some(2) if name == "plan" => Ok(stdout),
            Some(code) => Err(ExecError::CommandFailed {
                command: name.to_string(),
                code,
                stdout,
                stderr,
            }),
            None => Err(ExecError::Terminated {
                command: name.to_string(),
            }),
        }
    }

    /// apply/destroy keep stdio inherited unless auto-approved, so
    /// terraform's own confirmation prompt reaches the user. The
    /// interactive path has nothing to capture and returns an empty string.
    fn run_confirming(&self, name: &str, auto_approve: bool) -> Result<String, ExecError> {
        if auto_approve {
            self.run_captured(name, &[name, "-auto-approve"])
        } else {
            info!(command = name, dir = %self.work_dir.display(), "running terraform interactively");
            let status = self
                .command(&[name])
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(|e| classify_spawn(name, e))?;
            match status.code() {
                Some(0) => Ok(String::new()),
                Some(code) => Err(ExecError::CommandFailed {
                    command: name.to_string(),
                    code,
                    stdout: String::new(),
                    stderr: "see terminal output above".to_string(),
                }),
                None => Err(ExecError::Terminated {
                    command: name.to_string(),
                }),
            }
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

fn classify_spawn(name: &str, err: std::io::Error) -> ExecError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ExecError::BinaryMissing
    } else {
        ExecError::Io {
            command: name.to_string(),
            reason: err.to_string(),
        }
    }
}
