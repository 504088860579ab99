// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Provisioning artifact representation.
//!
//! An __artifact__ is a structured configuration document consumed by the
//! dashboard runtime, e.g., a datasource definition, a dashboard, or the
//! server settings file. Artifacts are synthesized from a base template and
//! the user configuration, then written into a destination directory that
//! the container stack mounts at startup.
//!
//! # Artifact Layout
//!
//! Every artifact lives at a fixed path relative to either the templates
//! directory or the destination directory. The path alone determines the
//! artifact's kind and its document format:
//!
//! | Kind                | Relative path                                      |
//! |---------------------|----------------------------------------------------|
//! | Datasource          | `provisioning/datasources/datasource.yaml`         |
//! | Dashboard provider  | `provisioning/dashboards/dashboard.yaml`           |
//! | Access control      | `provisioning/access-control/api-permissions.yaml` |
//! | Dashboard           | `dashboards/*.json`                                |
//! | Server settings     | `grafana.ini`                                      |
//! | Compose stack       | `docker-compose.yml`                               |
//!
//! # Documents
//!
//! YAML and JSON artifacts are both held in memory as a [`serde_json::Value`]
//! tree with insertion order preserved. Thus, a merge never reorders fields
//! that it does not own. INI artifacts are held as raw lines, see
//! [`ini::IniDocument`].

pub mod field;
pub mod ini;

use crate::artifact::ini::IniDocument;

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

pub const DATASOURCE_PATH: &str = "provisioning/datasources/datasource.yaml";
pub const DASHBOARD_PROVIDER_PATH: &str = "provisioning/dashboards/dashboard.yaml";
pub const ACCESS_CONTROL_PATH: &str = "provisioning/access-control/api-permissions.yaml";
pub const DASHBOARDS_DIR: &str = "dashboards";
pub const SERVER_SETTINGS_PATH: &str = "grafana.ini";
pub const COMPOSE_PATH: &str = "docker-compose.yml";

/// Kind of provisioning artifact.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    Datasource,
    DashboardProvider,
    AccessControl,
    Dashboard,
    ServerSettings,
    Compose,
}

impl ArtifactKind {
    /// Determine artifact kind from path relative to artifact root.
    pub fn classify(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let kind = if path == Path::new(DATASOURCE_PATH) {
            Self::Datasource
        } else if path == Path::new(DASHBOARD_PROVIDER_PATH) {
            Self::DashboardProvider
        } else if path == Path::new(ACCESS_CONTROL_PATH) {
            Self::AccessControl
        } else if path == Path::new(SERVER_SETTINGS_PATH) {
            Self::ServerSettings
        } else if path == Path::new(COMPOSE_PATH) {
            Self::Compose
        } else if path.parent() == Some(Path::new(DASHBOARDS_DIR))
            && path.extension().is_some_and(|ext| ext == "json")
        {
            Self::Dashboard
        } else {
            return None;
        };

        Some(kind)
    }

    /// Document format of artifact kind.
    pub fn format(&self) -> Format {
        match self {
            Self::Dashboard => Format::Json,
            Self::ServerSettings => Format::Ini,
            Self::Datasource | Self::DashboardProvider | Self::AccessControl | Self::Compose => {
                Format::Yaml
            }
        }
    }
}

impl Display for ArtifactKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Datasource => "datasource",
            Self::DashboardProvider => "dashboard provider",
            Self::AccessControl => "access control",
            Self::Dashboard => "dashboard",
            Self::ServerSettings => "server settings",
            Self::Compose => "compose stack",
        };
        fmt.write_str(name)
    }
}

/// Document format of an artifact.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Ini,
}

impl Display for Format {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Ini => "INI",
        };
        fmt.write_str(name)
    }
}

/// Parsed artifact document.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// YAML or JSON document tree.
    Tree(Value),

    /// Line-preserving INI document.
    Ini(IniDocument),
}

impl Document {
    /// Parse document text in given format.
    ///
    /// # Errors
    ///
    /// - Return [`DocumentError::Yaml`] or [`DocumentError::Json`] if text is
    ///   not valid in its format.
    pub fn parse(format: Format, text: &str) -> Result<Self> {
        let document = match format {
            Format::Yaml => Self::Tree(serde_yaml::from_str(text)?),
            Format::Json => Self::Tree(serde_json::from_str(text)?),
            Format::Ini => Self::Ini(IniDocument::from(text)),
        };

        Ok(document)
    }

    /// Render document in given format.
    ///
    /// Rendering is deterministic: the same document always yields the same
    /// bytes.
    ///
    /// # Errors
    ///
    /// - Return [`DocumentError::Yaml`] or [`DocumentError::Json`] if tree
    ///   cannot be serialized.
    /// - Return [`DocumentError::FormatMismatch`] if document does not fit
    ///   the format.
    pub fn render(&self, format: Format) -> Result<String> {
        match (self, format) {
            (Self::Tree(value), Format::Yaml) => Ok(serde_yaml::to_string(value)?),
            (Self::Tree(value), Format::Json) => {
                let mut text = serde_json::to_string_pretty(value)?;
                text.push('\n');
                Ok(text)
            }
            (Self::Ini(ini), Format::Ini) => Ok(ini.to_string()),
            (_, format) => Err(DocumentError::FormatMismatch(format)),
        }
    }
}

/// Base document for one artifact shipped with the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactTemplate {
    pub kind: ArtifactKind,

    /// Path relative to template root.
    pub path: PathBuf,

    /// Raw template text.
    pub source: String,
}

impl ArtifactTemplate {
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Synthesized artifact ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,

    /// Path relative to destination root.
    pub path: PathBuf,

    /// Rendered document text.
    pub contents: String,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// SHA-256 digest of rendered contents.
    pub fn digest(&self) -> String {
        digest(self.contents.as_bytes())
    }
}

/// Hex encoded SHA-256 digest of raw bytes.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Document parsing and rendering error types.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// YAML cannot be parsed or rendered.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// JSON cannot be parsed or rendered.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Document kind does not match the requested format.
    #[error("document cannot be rendered as {0}")]
    FormatMismatch(Format),
}

/// Friendly result alias :3
type Result<T, E = DocumentError> = std::result::Result<T, E>;
