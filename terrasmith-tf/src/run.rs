//! Run Manager - immutable, timestamp-named generation directories.
//!
//! A run is created exactly once per successful compilation and never
//! mutated afterwards. Directory names are UTC timestamp tokens whose
//! lexical order equals chronological order, so "latest run" is a pure
//! derivation over the run root: two independent processes can create runs
//! in the same session and a fresh scan still resolves the right one.

use crate::render::ArtifactSet;
use chrono::Utc;
use std::path::{Path, PathBuf};
use terrasmith_core::RunError;
use terrasmith_dsl::{Document, Intent};
use tracing::info;

/// `YYYYMMDD_HHMMSS_mmm`; millisecond resolution keeps independent
/// processes from colliding, and a collision is still reported, not merged.
const TOKEN_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

const WORKER_NAME_MAX: usize = 63;

/// Handle to one run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub token: String,
    pub path: PathBuf,
}

pub struct RunManager {
    root: PathBuf,
}

impl RunManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new run directory and persist the artifact set plus the
    /// variables file. Append-only: an existing directory with the same
    /// token fails loudly as a collision.
    pub fn create_run(
        &self,
        doc: &Document,
        artifacts: &ArtifactSet,
        account_id: &str,
    ) -> Result<Run, RunError> {
        let io_err = |path: &Path, e: std::io::Error| RunError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        std::fs::create_dir_all(&self.root).map_err(|e| io_err(&self.root, e))?;

        let token = Utc::now().format(TOKEN_FORMAT).to_string();
        let path = self.root.join(&token);
        match std::fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(RunError::Collision {
                    path: path.display().to_string(),
                })
            }
            Err(e) => return Err(io_err(&path, e)),
        }

        for artifact in &artifacts.files {
            let file_path = path.join(&artifact.rel_path);
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
            std::fs::write(&file_path, &artifact.contents).map_err(|e| io_err(&file_path, e))?;
        }

        let tfvars_path = path.join("terraform.tfvars");
        std::fs::write(&tfvars_path, tfvars(doc, account_id))
            .map_err(|e| io_err(&tfvars_path, e))?;

        info!(run = %token, path = %path.display(), "run created");
        Ok(Run { token, path })
    }

    /// Resolve the most recent run by re-scanning the run root.
    /// An empty (or missing) root is `NoRuns`, distinct from `NotFound`.
    pub fn latest_run(&self) -> Result<Run, RunError> {
        let no_runs = || RunError::NoRuns {
            root: self.root.display().to_string(),
        };

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(no_runs()),
            Err(e) => {
                return Err(RunError::Io {
                    path: self.root.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_run_token(name))
            .max()
            .map(|token| Run {
                path: self.root.join(&token),
                token,
            })
            .ok_or_else(no_runs)
    }

    /// Resolve an explicitly chosen run directory.
    pub fn resolve(path: &Path) -> Result<Run, RunError> {
        if path.is_dir() {
            Ok(Run {
                token: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: path.to_path_buf(),
            })
        } else {
            Err(RunError::NotFound {
                path: path.display().to_string(),
            })
        }
    }

    /// All run tokens under the root, oldest first.
    pub fn list_runs(&self) -> Result<Vec<Run>, RunError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RunError::Io {
                    path: self.root.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let mut tokens: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_run_token(name))
            .collect();
        tokens.sort();
        Ok(tokens
            .into_iter()
            .map(|token| Run {
                path: self.root.join(&token),
                token,
            })
            .collect())
    }
}

/// `YYYYMMDD_HHMMSS_mmm` shape check without pulling in a regex.
fn is_run_token(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 19
        && bytes[8] == b'_'
        && bytes[15] == b'_'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 8 | 15) || b.is_ascii_digit())
}

/// Variables file enumerating `zone_name`, `hostname`, `worker_name`,
/// `account_id`. Layout is read by the execution side and by CI scripts;
/// keep it stable.
pub fn tfvars(doc: &Document, account_id: &str) -> String {
    let worker_name = match (&doc.worker, doc.intent) {
        (Some(worker), Intent::CreateWorkerAndBindDomain) => worker.name.clone(),
        _ => default_worker_name(&doc.hostname),
    };

    let mut out = String::new();
    out.push_str(&format!("zone_name = \"{}\"\n", doc.zone_name));
    out.push_str(&format!("hostname = \"{}\"\n", doc.hostname));
    out.push_str(&format!("worker_name = \"{}\"\n", worker_name));
    out.push_str(&format!("account_id = \"{}\"\n", account_id));
    out
}

/// Hostname-derived worker name for non-worker intents.
fn default_worker_name(hostname: &str) -> String {
    let mut name: String = hostname.replace(['.', '_'], "-");
    name.truncate(WORKER_NAME_MAX);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render, RenderParams};
    use terrasmith_dsl::{Bindings, Routing};

    fn dns_doc() -> Document {
        Document {
            intent: Intent::CreateDnsRecord,
            zone_name: "example.com".to_string(),
            hostname: "www.example.com".to_string(),
            routing: Routing::default(),
            worker: None,
            bindings: Bindings::default(),
        }
    }

    fn artifacts() -> ArtifactSet {
        render(
            &dns_doc(),
            &RenderParams {
                account_id: "abc123".to_string(),
            },
        )
    }

    #[test]
    fn test_create_run_writes_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = RunManager::new(dir.path().join("terraform"));

        let run = manager
            .create_run(&dns_doc(), &artifacts(), "abc123")
            .expect("create");
        assert!(run.path.join("providers.tf").is_file());
        assert!(run.path.join("main.tf").is_file());
        assert!(run.path.join("src/worker.js").is_file());

        let tfvars = std::fs::read_to_string(run.path.join("terraform.tfvars")).expect("tfvars");
        assert!(tfvars.contains("zone_name = \"example.com\""));
        assert!(tfvars.contains("hostname = \"www.example.com\""));
        assert!(tfvars.contains("worker_name = \"www-example-com\""));
        assert!(tfvars.contains("account_id = \"abc123\""));
    }

    #[test]
    fn test_latest_run_is_lexical_maximum_regardless_of_creation_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = RunManager::new(dir.path());

        // Simulated runs created out of order by independent processes.
        for token in ["20240103_000000_000", "20240101_000000_000", "20240102_000000_000"] {
            std::fs::create_dir_all(dir.path().join(token)).expect("mkdir");
        }

        let latest = manager.latest_run().expect("latest");
        assert_eq!(latest.token, "20240103_000000_000");
    }

    #[test]
    fn test_empty_root_is_no_runs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = RunManager::new(dir.path());
        assert!(matches!(manager.latest_run(), Err(RunError::NoRuns { .. })));

        let missing = RunManager::new(dir.path().join("never-created"));
        assert!(matches!(missing.latest_run(), Err(RunError::NoRuns { .. })));
    }

    #[test]
    fn test_non_run_entries_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("zz-not-a-run")).expect("mkdir");
        std::fs::create_dir_all(dir.path().join("20240101_000000_000")).expect("mkdir");

        let manager = RunManager::new(dir.path());
        assert_eq!(manager.latest_run().expect("latest").token, "20240101_000000_000");
    }

    #[test]
    fn test_collision_fails_loudly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = RunManager::new(dir.path());
        let run = manager
            .create_run(&dns_doc(), &artifacts(), "abc123")
            .expect("create");

        // Recreating the same token must collide, not merge.
        let token = run.token.clone();
        let err = create_with_token(&manager, &token).expect_err("collision");
        assert!(matches!(err, RunError::Collision { .. }));
    }

    // Collision path needs a deterministic token; drive create_dir directly
    // the way create_run does.
    fn create_with_token(manager: &RunManager, token: &str) -> Result<(), RunError> {
        let path = manager.root().join(token);
        match std::fs::create_dir(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(RunError::Collision {
                path: path.display().to_string(),
            }),
            Err(e) => Err(RunError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let run_path = dir.path().join("20240101_000000_000");
        std::fs::create_dir_all(&run_path).expect("mkdir");

        let run = RunManager::resolve(&run_path).expect("resolve");
        assert_eq!(run.token, "20240101_000000_000");

        let err = RunManager::resolve(&dir.path().join("missing")).expect_err("not found");
        assert!(matches!(err, RunError::NotFound { .. }));
    }

    #[test]
    fn test_list_runs_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        for token in ["20240102_000000_000", "20240101_000000_000"] {
            std::fs::create_dir_all(dir.path().join(token)).expect("mkdir");
        }
        let runs = RunManager::new(dir.path()).list_runs().expect("list");
        let tokens: Vec<_> = runs.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(tokens, vec!["20240101_000000_000", "20240102_000000_000"]);
    }

    #[test]
    fn test_worker_intent_tfvars_uses_worker_name() {
        let doc = Document {
            intent: Intent::CreateWorkerAndBindDomain,
            zone_name: "example.com".to_string(),
            hostname: "api.example.com".to_string(),
            routing: Routing::default(),
            worker: Some(terrasmith_dsl::Worker {
                name: "api".to_string(),
                module: true,
                compatibility_date: "2024-01-01".to_string(),
            }),
            bindings: Bindings::default(),
        };
        assert!(tfvars(&doc, "abc123").contains("worker_name = \"api\""));
    }

    #[test]
    fn test_run_token_shape() {
        assert!(is_run_token("20240101_123456_789"));
        assert!(!is_run_token("20240101_123456"));
        assert!(!is_run_token("not_a_token_at_all!"));
        assert!(!is_run_token("20240101-123456-789"));
    }
}
