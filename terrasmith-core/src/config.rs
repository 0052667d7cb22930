//! Configuration loading and saving for terrasmith.
//!
//! TOML file at `$TERRASMITH_CONFIG_DIR/config.toml` (falling back to
//! `$HOME/.config/terrasmith/config.toml`). A missing file is an empty
//! config, not an error: the pipeline routes around missing credentials
//! instead of refusing to start.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Model used when the config does not name one.
pub const DEFAULT_MODEL_ID: &str = "gpt-4o-mini";

const CONFIG_FILE: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "TERRASMITH_CONFIG_DIR";

#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudflare_api_token: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default = "default_model_id")]
    pub model_id: String,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            account_id: None,
            zone_name: None,
            model_id: default_model_id(),
        }
    }
}

impl Config {
    /// Load from the default location. A missing file yields `Config::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_path(&Self::config_file()?)
    }

    /// Load from an explicit path. A missing file yields `Config::default()`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Persist to the default location with owner-only permissions.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_file()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Persist to an explicit path with owner-only permissions.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |e: std::io::Error| ConfigError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, contents).map_err(write_err)?;

        // Credentials live in this file; keep it owner-readable only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }

        Ok(())
    }

    /// Path of the config file, honoring the `TERRASMITH_CONFIG_DIR` override.
    pub fn config_file() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir).join(CONFIG_FILE));
        }
        let home = std::env::var_os("HOME").ok_or(ConfigError::NoConfigDir)?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("terrasmith")
            .join(CONFIG_FILE))
    }

    /// Whether the AI path can be attempted at all.
    pub fn has_openai_key(&self) -> bool {
        self.auth
            .openai_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Whether the provisioning side is fully configured.
    pub fn has_cloudflare_config(&self) -> bool {
        self.auth.cloudflare_api_token.is_some() && self.defaults.account_id.is_some()
    }

    /// Account id from config, falling back to `CLOUDFLARE_ACCOUNT_ID`.
    ///
    /// The value ends up inside quoted strings in generated files, so it is
    /// constrained to `[A-Za-z0-9_-]` here rather than escaped downstream.
    pub fn account_id(&self) -> Result<String, ConfigError> {
        let id = match &self.defaults.account_id {
            Some(id) => id.clone(),
            None => std::env::var("CLOUDFLARE_ACCOUNT_ID")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingRequired {
                    field: "defaults.account_id".to_string(),
                })?,
        };
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
            return Err(ConfigError::InvalidValue {
                field: "defaults.account_id".to_string(),
                reason: "must be non-empty and contain only letters, digits, '-' or '_'".to_string(),
            });
        }
        Ok(id)
    }
}

// Keys never appear in debug output or traces.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &self.auth.openai_api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "cloudflare_api_token",
                &self.auth.cloudflare_api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("account_id", &self.defaults.account_id)
            .field("zone_name", &self.defaults.zone_name)
            .field("model_id", &self.defaults.model_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::from_path(&dir.path().join("config.toml")).expect("load");
        assert_eq!(config, Config::default());
        assert!(!config.has_openai_key());
        assert!(!config.has_cloudflare_config());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.auth.openai_api_key = Some("sk-test".to_string());
        config.defaults.account_id = Some("abc123".to_string());
        config.save_to(&path).expect("save");

        let loaded = Config::from_path(&path).expect("load");
        assert_eq!(loaded, config);
        assert_eq!(loaded.defaults.model_id, DEFAULT_MODEL_ID);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).expect("save");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auth]\nopenai_api_key = \"k\"\nregion = \"us\"\n").expect("write");

        let err = Config::from_path(&path).expect_err("should reject unknown key");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let mut config = Config::default();
        config.auth.openai_api_key = Some("sk-secret-value".to_string());
        config.auth.cloudflare_api_token = Some("cf-secret-value".to_string());

        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret-value"));
        assert!(!debug.contains("cf-secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_account_id_accepts_hex_style_ids() {
        let mut config = Config::default();
        config.defaults.account_id = Some("023e105f4ecef8ad9ca31a8372d0c353".to_string());
        assert_eq!(
            config.account_id().expect("valid id"),
            "023e105f4ecef8ad9ca31a8372d0c353"
        );
    }

    #[test]
    fn test_account_id_rejects_quote_and_whitespace() {
        for bad in [r#"abc"123"#, "abc 123", "abc\\123", "${oops}", ""] {
            let mut config = Config::default();
            config.defaults.account_id = Some(bad.to_string());
            let err = config.account_id().expect_err("should reject");
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_empty_key_does_not_count_as_configured() {
        let mut config = Config::default();
        config.auth.openai_api_key = Some("   ".to_string());
        assert!(!config.has_openai_key());
    }
}
