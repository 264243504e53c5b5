//! Tool configuration
//!
//! Settings are read once at startup from a TOML file and then passed around
//! by reference; nothing mutates them afterwards. Every field has a default,
//! so a missing file or a partial file is fine.
//!
//! ```toml
//! passwd_file = "/etc/dovecot/users"
//! vmail_base_dir = "/srv/mail"
//! hash_scheme = "BLF-CRYPT"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Location checked when no config path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "/etc/mail-mgmt/config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailConfig {
    /// Dovecot passwd-file holding `user:hash` lines
    pub passwd_file: PathBuf,
    /// Root of the virtual mailbox tree
    pub vmail_base_dir: PathBuf,
    /// systemd unit reloaded after every change
    pub dovecot_service: String,
    pub vmail_user: String,
    pub vmail_group: String,
    /// Scheme passed to `doveadm pw -s`
    pub hash_scheme: String,
    pub doveadm_cmd: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            passwd_file: PathBuf::from("/etc/dovecot/users"),
            vmail_base_dir: PathBuf::from("/var/vmail"),
            dovecot_service: "dovecot".to_string(),
            vmail_user: "vmail".to_string(),
            vmail_group: "vmail".to_string(),
            hash_scheme: "SHA512-CRYPT".to_string(),
            doveadm_cmd: "doveadm".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    Missing(PathBuf),
    #[error("config field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

impl MailConfig {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
    /// used when present and the built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::Missing(path.to_path_buf()).into());
            }
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok((Self::default(), ConfigSource::Defaults));
                }
                default
            }
        };

        let config = Self::load_from_path(&path)?;
        Ok((config, ConfigSource::File(path)))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing config at {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating config at {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.entries() {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(name));
            }
        }
        Ok(())
    }

    /// Field names and rendered values, in declaration order
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("passwd_file", self.passwd_file.display().to_string()),
            ("vmail_base_dir", self.vmail_base_dir.display().to_string()),
            ("dovecot_service", self.dovecot_service.clone()),
            ("vmail_user", self.vmail_user.clone()),
            ("vmail_group", self.vmail_group.clone()),
            ("hash_scheme", self.hash_scheme.clone()),
            ("doveadm_cmd", self.doveadm_cmd.clone()),
        ]
    }

    /// `user:group` argument for chown
    pub fn vmail_owner(&self) -> String {
        format!("{}:{}", self.vmail_user, self.vmail_group)
    }
}
