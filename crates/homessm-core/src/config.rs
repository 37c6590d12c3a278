//! HomeSSM configuration file.
//!
//! The configuration is a small YAML document loaded once at startup:
//!
//! ```yaml
//! region: us-east-1
//! credentials:
//!   - accessKey: AKIAEXAMPLE
//!     secretKey: secret
//!     username: alice
//! keys:
//!   - alias: home
//!     key: <base64 of 32 bytes>
//! ```
//!
//! An empty `region` accepts requests signed for any region.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HomeSsmError, HomeSsmResult};

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSsmConfig {
    /// Region requests must be signed for; empty accepts any region.
    #[serde(default)]
    pub region: String,
    /// Static credentials allowed to call the API.
    #[serde(default)]
    pub credentials: Vec<CredentialConfig>,
    /// Externally supplied encryption keys. The first one is the default.
    #[serde(default)]
    pub keys: Vec<KeyConfig>,
}

/// One configured access key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialConfig {
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Owner label used in `LastModifiedUser` ARNs.
    #[serde(default)]
    pub username: String,
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("username", &self.username)
            .finish()
    }
}

/// One externally supplied encryption key.
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Opaque key identifier; generated when omitted.
    #[serde(default)]
    pub id: Option<String>,
    /// Alias, referenced by parameters as `alias/<alias>`.
    pub alias: String,
    /// Base64 encoding of 32 bytes of key material.
    pub key: String,
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("id", &self.id)
            .field("alias", &self.alias)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl HomeSsmConfig {
    /// Parse a configuration document from a YAML string and validate it.
    pub fn from_yaml_str(yaml: &str) -> HomeSsmResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> HomeSsmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| HomeSsmError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = serde_yaml::from_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Apply environment overrides on top of the file contents.
    ///
    /// Only `HOMESSM_REGION` is recognised.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("HOMESSM_REGION") {
            self.region = v;
        }
    }

    /// Check the semantic constraints the YAML schema cannot express.
    pub fn validate(&self) -> HomeSsmResult<()> {
        if self.credentials.is_empty() {
            return Err(HomeSsmError::Config(
                "at least one credential must be configured".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for cred in &self.credentials {
            if cred.access_key.len() < 4 {
                return Err(HomeSsmError::Config(format!(
                    "access key '{}' is shorter than 4 characters",
                    cred.access_key
                )));
            }
            // Authorization headers are parsed with whitespace stripped.
            if cred.access_key.chars().any(char::is_whitespace) {
                return Err(HomeSsmError::Config(format!(
                    "access key '{}' must not contain whitespace",
                    cred.access_key
                )));
            }
            if cred.secret_key.is_empty() {
                return Err(HomeSsmError::Config(format!(
                    "access key '{}' has an empty secret",
                    cred.access_key
                )));
            }
            if !seen.insert(cred.access_key.as_str()) {
                return Err(HomeSsmError::Config(format!(
                    "duplicate access key '{}'",
                    cred.access_key
                )));
            }
        }

        let mut aliases = HashSet::new();
        for key in &self.keys {
            if key.alias.is_empty() || key.alias.starts_with("alias/") {
                return Err(HomeSsmError::Config(format!(
                    "invalid key alias '{}' (give the bare alias, without 'alias/')",
                    key.alias
                )));
            }
            if !aliases.insert(key.alias.as_str()) {
                return Err(HomeSsmError::Config(format!(
                    "duplicate key alias '{}'",
                    key.alias
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
region: us-east-1
credentials:
  - accessKey: AKIAHOME
    secretKey: topsecret
    username: alice
keys:
  - id: 0d7d1c4e
    alias: home
    key: AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=
";

    #[test]
    fn test_should_parse_sample_config() {
        let config = HomeSsmConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.credentials.len(), 1);
        assert_eq!(config.credentials[0].access_key, "AKIAHOME");
        assert_eq!(config.credentials[0].username, "alice");
        assert_eq!(config.keys[0].alias, "home");
        assert_eq!(config.keys[0].id.as_deref(), Some("0d7d1c4e"));
    }

    #[test]
    fn test_should_default_missing_region_to_empty() {
        let config = HomeSsmConfig::from_yaml_str(
            "credentials:\n  - accessKey: AKIAHOME\n    secretKey: s\n",
        )
        .unwrap();
        assert!(config.region.is_empty());
        assert!(config.keys.is_empty());
    }

    #[test]
    fn test_should_reject_config_without_credentials() {
        let err = HomeSsmConfig::from_yaml_str("region: us-east-1\n").unwrap_err();
        assert!(matches!(err, HomeSsmError::Config(_)));
    }

    #[test]
    fn test_should_reject_duplicate_access_keys() {
        let yaml = "credentials:\n  - accessKey: AKIAHOME\n    secretKey: a\n  - accessKey: AKIAHOME\n    secretKey: b\n";
        assert!(HomeSsmConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_should_reject_short_access_key() {
        let yaml = "credentials:\n  - accessKey: AK\n    secretKey: a\n";
        assert!(HomeSsmConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_should_reject_duplicate_key_aliases() {
        let yaml = "credentials:\n  - accessKey: AKIAHOME\n    secretKey: a\nkeys:\n  - alias: k\n    key: x\n  - alias: k\n    key: y\n";
        assert!(HomeSsmConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_should_redact_secrets_in_debug_output() {
        let config = HomeSsmConfig::from_yaml_str(SAMPLE).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("AAAAAAAA"));
        assert!(debug.contains("AKIAHOME"));
    }

    #[test]
    fn test_should_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = HomeSsmConfig::load(&path).unwrap();
        assert_eq!(config.credentials[0].secret_key, "topsecret");
    }

    #[test]
    fn test_should_report_missing_file() {
        let err = HomeSsmConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, HomeSsmError::ReadConfig { .. }));
    }
}
