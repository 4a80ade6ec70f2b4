//! Client configuration.
//!
//! Values come from three layers: compiled-in defaults, an optional
//! `~/.dsweb/config.toml`, and command line flags (highest precedence).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Directory under the home directory holding client files.
const CONFIG_DIR: &str = ".dsweb";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_REST_URL: &str = "http://localhost/MC/api/v02/";
pub const DEFAULT_PUBSUB_URL: &str = "ws://localhost:8443/deepstream";
pub const DEFAULT_ROLE: &str = "participant";
pub const DEFAULT_ROUTING_KEY: &str = "DS01";
pub const DEFAULT_INTERVENTION_PASSWORD: &str = "123";
pub const DEFAULT_PENDING_DELAY_MS: u64 = 100;
pub const DEFAULT_PENDING_CLEAR_MS: u64 = 2000;

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the REST backend; always ends with `/`.
    pub rest_url: String,
    /// Endpoint of the pub/sub server (informational for the local broker).
    pub pubsub_url: String,
    /// Enables debug-level logging for this crate.
    pub debug: bool,
    /// Role sent on registration and login.
    pub role: String,
    /// Routing key used when the page location does not name one.
    pub default_routing_key: String,
    /// Shared secret of the intervention.
    pub intervention_password: String,
    /// Value of the `user` header on REST calls.
    pub rest_user: Option<String>,
    /// Value of the `token` header on REST calls.
    pub rest_token: Option<String>,
    /// Delay before the pending indicator is shown.
    pub pending_delay: Duration,
    /// Delay (from acceptance) before the pending indicator is cleared.
    pub pending_clear: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.to_string(),
            pubsub_url: DEFAULT_PUBSUB_URL.to_string(),
            debug: false,
            role: DEFAULT_ROLE.to_string(),
            default_routing_key: DEFAULT_ROUTING_KEY.to_string(),
            intervention_password: DEFAULT_INTERVENTION_PASSWORD.to_string(),
            rest_user: None,
            rest_token: None,
            pending_delay: Duration::from_millis(DEFAULT_PENDING_DELAY_MS),
            pending_clear: Duration::from_millis(DEFAULT_PENDING_CLEAR_MS),
        }
    }
}

/// On-disk representation; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct ConfigFile {
    rest_url: Option<String>,
    pubsub_url: Option<String>,
    debug: Option<bool>,
    role: Option<String>,
    default_routing_key: Option<String>,
    intervention_password: Option<String>,
    rest_user: Option<String>,
    rest_token: Option<String>,
    pending_delay_ms: Option<u64>,
    pending_clear_ms: Option<u64>,
}

/// Overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rest_url: Option<String>,
    pub debug: bool,
    pub rest_user: Option<String>,
    pub rest_token: Option<String>,
}

impl Config {
    /// Load the configuration: defaults, then the config file (if any), then `overrides`.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = Self::default();

        let file = match path {
            Some(p) => Some(Self::read_file(p)?),
            None => match default_path() {
                Some(p) if p.exists() => Some(Self::read_file(&p)?),
                _ => None,
            },
        };
        if let Some(file) = file {
            config.apply_file(file);
        }

        config.apply_overrides(overrides);
        config.rest_url = normalize_base_url(&config.rest_url);
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.rest_url {
            self.rest_url = v;
        }
        if let Some(v) = file.pubsub_url {
            self.pubsub_url = v;
        }
        if let Some(v) = file.debug {
            self.debug = v;
        }
        if let Some(v) = file.role {
            self.role = v;
        }
        if let Some(v) = file.default_routing_key {
            self.default_routing_key = v;
        }
        if let Some(v) = file.intervention_password {
            self.intervention_password = v;
        }
        if file.rest_user.is_some() {
            self.rest_user = file.rest_user;
        }
        if file.rest_token.is_some() {
            self.rest_token = file.rest_token;
        }
        if let Some(ms) = file.pending_delay_ms {
            self.pending_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.pending_clear_ms {
            self.pending_clear = Duration::from_millis(ms);
        }
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(ref v) = overrides.rest_url {
            self.rest_url.clone_from(v);
        }
        if overrides.debug {
            self.debug = true;
        }
        if overrides.rest_user.is_some() {
            self.rest_user.clone_from(&overrides.rest_user);
        }
        if overrides.rest_token.is_some() {
            self.rest_token.clone_from(&overrides.rest_token);
        }
    }
}

/// Default config file location (`~/.dsweb/config.toml`).
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Ensure the base URL ends with a slash so commands can be appended.
fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rest_url, DEFAULT_REST_URL);
        assert_eq!(config.default_routing_key, "DS01");
        assert_eq!(config.role, "participant");
        assert_eq!(config.pending_delay, Duration::from_millis(100));
        assert_eq!(config.pending_clear, Duration::from_millis(2000));
    }

    #[test]
    fn test_file_then_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
rest-url = "https://example.org/MC/api/v02"
default-routing-key = "ZZ01"
rest-token = "from-file"
pending-delay-ms = 5
"#
        )
        .unwrap();

        let overrides = Overrides {
            rest_token: Some("from-flag".to_string()),
            debug: true,
            ..Overrides::default()
        };
        let config = Config::load(Some(file.path()), &overrides).unwrap();

        assert_eq!(config.rest_url, "https://example.org/MC/api/v02/");
        assert_eq!(config.default_routing_key, "ZZ01");
        assert_eq!(config.rest_token.as_deref(), Some("from-flag"));
        assert_eq!(config.pending_delay, Duration::from_millis(5));
        assert!(config.debug);
        assert_eq!(config.intervention_password, DEFAULT_INTERVENTION_PASSWORD);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing), &Overrides::default()).is_err());
    }
}
