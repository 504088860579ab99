// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! User configuration layout.
//!
//! Specify the layout of the declared intent that drives artifact synthesis.
//! A user configuration is normally stored as an env-style file, i.e., plain
//! `KEY=value` lines, so the very same file can be handed to the container
//! runtime. A TOML file carrying the same fields is accepted as well.
//!
//! # Env-Style Layout
//!
//! | Key                         | Field                   | Required |
//! |-----------------------------|-------------------------|----------|
//! | `GITHUB_TOKEN`              | `access_token`          | yes      |
//! | `REPOS`                     | `repositories`          | no       |
//! | `GF_SERVER_DOMAIN`          | `domain`                | no       |
//! | `GF_SERVER_ROOT_URL`        | `root_url`              | no       |
//! | `GITHUB_API_URL`            | `api_url`               | no       |
//! | `GF_AUTH_ANONYMOUS_ENABLED` | `anonymous_access`      | no       |
//! | `GF_SERVER_ENFORCE_DOMAIN`  | `enforce_domain`        | no       |
//! | `ALLOW_DOMAIN_MISMATCH`     | `allow_domain_mismatch` | no       |
//! | `EMBED_TOKEN`               | `embed_token`           | no       |
//!
//! Unknown keys are ignored. A missing access token is not a load error, it
//! is reported by [`validate`](crate::validate::validate) instead.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

pub const TOKEN_KEY: &str = "GITHUB_TOKEN";
pub const REPOS_KEY: &str = "REPOS";
pub const DOMAIN_KEY: &str = "GF_SERVER_DOMAIN";
pub const ROOT_URL_KEY: &str = "GF_SERVER_ROOT_URL";
pub const API_URL_KEY: &str = "GITHUB_API_URL";
pub const ANONYMOUS_KEY: &str = "GF_AUTH_ANONYMOUS_ENABLED";
pub const ENFORCE_DOMAIN_KEY: &str = "GF_SERVER_ENFORCE_DOMAIN";
pub const ALLOW_MISMATCH_KEY: &str = "ALLOW_DOMAIN_MISMATCH";
pub const EMBED_TOKEN_KEY: &str = "EMBED_TOKEN";

const KNOWN_KEYS: [&str; 9] = [
    TOKEN_KEY,
    REPOS_KEY,
    DOMAIN_KEY,
    ROOT_URL_KEY,
    API_URL_KEY,
    ANONYMOUS_KEY,
    ENFORCE_DOMAIN_KEY,
    ALLOW_MISMATCH_KEY,
    EMBED_TOKEN_KEY,
];

/// Declared intent for a single synthesis run.
///
/// Loaded once, then passed explicitly into every operation. Nothing in this
/// crate keeps a process-wide copy around.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UserConfig {
    /// Personal access token for the hosting API.
    pub access_token: String,

    /// Monitored repositories in `owner/name` form, as declared.
    pub repositories: Vec<String>,

    /// Public hostname of the dashboard server.
    pub domain: Option<String>,

    /// Public root URL of the dashboard server.
    pub root_url: Option<String>,

    /// Base URL of a self-hosted API instance.
    pub api_url: Option<String>,

    /// Let anonymous visitors view dashboards.
    pub anonymous_access: bool,

    /// Make the dashboard server redirect to `domain`.
    pub enforce_domain: bool,

    /// Permit `root_url` to point at a host other than `domain`.
    pub allow_domain_mismatch: bool,

    /// Write the literal token into the datasource instead of an environment
    /// reference.
    pub embed_token: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            repositories: Vec::new(),
            domain: None,
            root_url: None,
            api_url: None,
            anonymous_access: true,
            enforce_domain: true,
            allow_domain_mismatch: false,
            embed_token: false,
        }
    }
}

impl UserConfig {
    /// Build configuration from env-style key/value pairs.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::InvalidFlag`] if a boolean key holds garbage.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    ) -> Result<Self> {
        let mut config = Self::default();
        config.apply_pairs(pairs)?;
        Ok(config)
    }

    /// Overlay env-style key/value pairs on top of current settings.
    ///
    /// Later pairs win. Empty values clear optional fields.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::InvalidFlag`] if a boolean key holds garbage.
    pub fn apply_pairs(
        &mut self,
        pairs: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    ) -> Result<()> {
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                TOKEN_KEY => self.access_token = value.to_string(),
                REPOS_KEY => self.repositories = split_list(value),
                DOMAIN_KEY => self.domain = non_empty(value),
                ROOT_URL_KEY => self.root_url = non_empty(value),
                API_URL_KEY => self.api_url = non_empty(value),
                ANONYMOUS_KEY => self.anonymous_access = parse_flag(key, value)?,
                ENFORCE_DOMAIN_KEY => self.enforce_domain = parse_flag(key, value)?,
                ALLOW_MISMATCH_KEY => self.allow_domain_mismatch = parse_flag(key, value)?,
                EMBED_TOKEN_KEY => self.embed_token = parse_flag(key, value)?,
                _ => continue,
            }
        }

        Ok(())
    }

    /// Parse TOML configuration.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Deserialize`] if TOML is malformed.
    pub fn from_toml(data: &str) -> Result<Self> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }

    /// Load configuration from process environment, then overlay file.
    ///
    /// Values in the file win over exported variables, so a freshly written
    /// file is never shadowed by a stale shell export. A missing file is
    /// fine, the process environment alone may carry the whole
    /// configuration. Files ending in `.toml` are parsed as TOML, anything
    /// else as env-style.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file exists but cannot be read.
    /// - Return [`ConfigError::EnvFile`] or [`ConfigError::Deserialize`] if
    ///   file content is malformed.
    /// - Return [`ConfigError::InvalidFlag`] if a boolean key holds garbage.
    #[instrument(skip(path), level = "debug")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config =
            Self::from_pairs(std::env::vars().filter(|(key, _)| KNOWN_KEYS.contains(&key.as_str())))?;

        match read_to_string(path) {
            Ok(data) if path.extension().is_some_and(|ext| ext == "toml") => {
                debug!("load toml configuration from {:?}", path.display());
                config = config.overlay_toml(&data)?;
            }
            Ok(data) => {
                debug!("load env configuration from {:?}", path.display());
                config.apply_pairs(env_pairs(&data)?)?;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no configuration at {:?}, using environment", path.display());
            }
            Err(err) => {
                return Err(ConfigError::Read {
                    source: err,
                    path: path.to_path_buf(),
                })
            }
        }

        Ok(config)
    }

    /// Overlay fields present in TOML data on top of current settings.
    fn overlay_toml(&self, data: &str) -> Result<Self> {
        let mut table = toml::Table::try_from(self)?;
        table.extend(data.parse::<toml::Table>()?);
        Ok(table.try_into()?)
    }

    /// Repositories with case-insensitive duplicates removed.
    ///
    /// Keeps the first-seen spelling of each entry and the declared order.
    pub fn unique_repositories(&self) -> Vec<String> {
        dedup_case_insensitive(self.repositories.iter().map(String::as_str))
    }

    /// Owners of monitored repositories.
    ///
    /// Same dedup rules as [`Self::unique_repositories`].
    pub fn organizations(&self) -> Vec<String> {
        let repositories = self.unique_repositories();
        dedup_case_insensitive(
            repositories
                .iter()
                .filter_map(|repo| repo.split_once('/').map(|(owner, _)| owner)),
        )
    }
}

fn env_pairs(data: &str) -> Result<Vec<(String, String)>> {
    Ok(dotenvy::from_read_iter(data.as_bytes()).collect::<Result<Vec<_>, _>>()?)
}

impl FromStr for UserConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Self::from_pairs(env_pairs(data)?)
    }
}

impl Display for UserConfig {
    /// Render as env-style file content.
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        writeln!(fmt, "# Access token for the GitHub API (required)")?;
        writeln!(fmt, "{TOKEN_KEY}={}", self.access_token)?;
        writeln!(fmt)?;
        writeln!(fmt, "# Repositories to monitor (comma separated)")?;
        writeln!(fmt, "{REPOS_KEY}=\"{}\"", self.repositories.join(", "))?;
        writeln!(fmt)?;
        writeln!(fmt, "# Dashboard server settings")?;
        writeln!(fmt, "{ROOT_URL_KEY}={}", self.root_url.as_deref().unwrap_or_default())?;
        writeln!(fmt, "{DOMAIN_KEY}={}", self.domain.as_deref().unwrap_or_default())?;
        writeln!(fmt, "{ENFORCE_DOMAIN_KEY}={}", self.enforce_domain)?;
        writeln!(fmt, "{ALLOW_MISMATCH_KEY}={}", self.allow_domain_mismatch)?;
        writeln!(fmt, "{ANONYMOUS_KEY}={}", self.anonymous_access)?;
        if let Some(api_url) = &self.api_url {
            writeln!(fmt)?;
            writeln!(fmt, "# Self-hosted API instance")?;
            writeln!(fmt, "{API_URL_KEY}={api_url}")?;
        }
        if self.embed_token {
            writeln!(fmt, "{EMBED_TOKEN_KEY}=true")?;
        }

        Ok(())
    }
}

/// Name of a [`UserConfig`] field.
///
/// Used to tag validation errors and ownership table entries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigField {
    AccessToken,
    Repositories,
    Domain,
    RootUrl,
    ApiUrl,
    AnonymousAccess,
    EnforceDomain,
}

impl Display for ConfigField {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let key = match self {
            Self::AccessToken => TOKEN_KEY,
            Self::Repositories => REPOS_KEY,
            Self::Domain => DOMAIN_KEY,
            Self::RootUrl => ROOT_URL_KEY,
            Self::ApiUrl => API_URL_KEY,
            Self::AnonymousAccess => ANONYMOUS_KEY,
            Self::EnforceDomain => ENFORCE_DOMAIN_KEY,
        };
        fmt.write_str(key)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn dedup_case_insensitive<'a>(entries: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.to_lowercase()))
        .map(ToString::to_string)
        .collect()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file exists but cannot be read.
    #[error("failed to read configuration file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Env-style configuration is malformed.
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),

    /// TOML configuration is malformed.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Settings cannot be laid out as TOML for overlaying.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Boolean setting holds something other than a boolean.
    #[error("invalid boolean {value:?} for {key}")]
    InvalidFlag { key: String, value: String },
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
