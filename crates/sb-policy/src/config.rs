// config.rs — Rate-limit and sensitivity configuration.
//
// Loaded from a YAML file of the shape:
//
//   rate_limits:
//     default: { window_seconds: 60, limit: 20 }
//     p0:      { window_seconds: 60, limit: 1 }
//   sensitivity:
//     requires_approval_tags: [financial, phi, credentials]
//
// The `default` rate limit is mandatory; per-severity entries (p0/p1/p2)
// override it. Tags listed under `requires_approval_tags` force the
// human-approval gate for any request carrying them.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PolicyError;

/// Environment variable naming the policy config file.
pub const POLICY_CONFIG_ENV: &str = "SWITCHBOARD_POLICY_CONFIG";

/// A sliding-window cap: at most `limit` requests per `window_seconds`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct RateLimit {
    pub window_seconds: u64,
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    rate_limits: HashMap<String, RateLimit>,
    #[serde(default)]
    sensitivity: RawSensitivity,
}

#[derive(Debug, Default, Deserialize)]
struct RawSensitivity {
    #[serde(default)]
    requires_approval_tags: Vec<String>,
}

/// Parsed policy configuration.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    rate_limits: HashMap<String, RateLimit>,
    approval_tags: HashSet<String>,
}

impl PolicyConfig {
    /// Load the config from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let raw_text = std::fs::read_to_string(path).map_err(|source| PolicyError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = serde_yaml::from_str(&raw_text)?;
        if !raw.rate_limits.contains_key("default") {
            return Err(PolicyError::MissingDefaultRateLimit {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            rate_limits: raw.rate_limits,
            approval_tags: raw.sensitivity.requires_approval_tags.into_iter().collect(),
        })
    }

    /// Load from `SWITCHBOARD_POLICY_CONFIG`, or fall back to the built-in
    /// defaults when the variable is unset.
    pub fn from_env() -> Result<Self, PolicyError> {
        match std::env::var(POLICY_CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }

    /// The rate limit for a severity key (`p0`/`p1`/`p2`), falling back to
    /// the `default` entry.
    pub fn rate_limit_for(&self, severity: &str) -> RateLimit {
        self.rate_limits
            .get(severity)
            .or_else(|| self.rate_limits.get("default"))
            .copied()
            .expect("config always carries a default rate limit")
    }

    /// Whether a sensitivity tag forces the approval gate.
    pub fn is_approval_tag(&self, tag: &str) -> bool {
        self.approval_tags.contains(tag)
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let mut rate_limits = HashMap::new();
        rate_limits.insert(
            "default".to_string(),
            RateLimit {
                window_seconds: 60,
                limit: 20,
            },
        );
        rate_limits.insert(
            "p0".to_string(),
            RateLimit {
                window_seconds: 60,
                limit: 1,
            },
        );
        rate_limits.insert(
            "p1".to_string(),
            RateLimit {
                window_seconds: 60,
                limit: 10,
            },
        );
        rate_limits.insert(
            "p2".to_string(),
            RateLimit {
                window_seconds: 60,
                limit: 30,
            },
        );
        let approval_tags = ["financial", "phi", "credentials"]
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            rate_limits,
            approval_tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cap_p0_tightest() {
        let config = PolicyConfig::default();
        assert_eq!(config.rate_limit_for("p0").limit, 1);
        assert_eq!(config.rate_limit_for("p2").limit, 30);
        assert!(config.is_approval_tag("financial"));
        assert!(!config.is_approval_tag("public"));
    }

    #[test]
    fn unknown_severity_falls_back_to_default() {
        let config = PolicyConfig::default();
        assert_eq!(
            config.rate_limit_for("p9"),
            config.rate_limit_for("default")
        );
    }

    #[test]
    fn loads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            "rate_limits:\n  default: {{window_seconds: 30, limit: 5}}\n  p0: {{window_seconds: 10, limit: 2}}\nsensitivity:\n  requires_approval_tags: [secret]\n"
        )
        .unwrap();

        let config = PolicyConfig::load(&path).unwrap();
        assert_eq!(config.rate_limit_for("p0").limit, 2);
        assert_eq!(config.rate_limit_for("p1").window_seconds, 30);
        assert!(config.is_approval_tag("secret"));
        assert!(!config.is_approval_tag("financial"));
    }

    #[test]
    fn missing_default_rate_limit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(
            &path,
            "rate_limits:\n  p0: {window_seconds: 10, limit: 2}\n",
        )
        .unwrap();

        let err = PolicyConfig::load(&path).unwrap_err();
        assert!(matches!(err, PolicyError::MissingDefaultRateLimit { .. }));
    }
}
