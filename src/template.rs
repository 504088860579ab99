// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Artifact templates.
//!
//! Templates are the base documents that synthesis starts from when the
//! destination directory does not hold an artifact yet. They come from one of
//! two places:
//!
//! 1. A template directory on disk, usually a clone of a template repository
//!    placed at `$XDG_DATA_HOME/dashwright/template`.
//! 2. The builtin template set compiled into this crate.
//!
//! Both follow the same relative layout as the destination directory. Every
//! artifact kind is required, and at least one dashboard must exist. The
//! builtin set can be scaffolded into a directory so users have something to
//! customize.

use crate::{
    artifact::{
        Artifact, ArtifactKind, ArtifactTemplate, ACCESS_CONTROL_PATH, COMPOSE_PATH,
        DASHBOARDS_DIR, DASHBOARD_PROVIDER_PATH, DATASOURCE_PATH, SERVER_SETTINGS_PATH,
    },
    write::{write_artifacts, Persist, WriteSummary},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read_dir, read_to_string},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Where templates are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Template set compiled into the binary.
    Builtin,

    /// Template directory on disk.
    Dir(PathBuf),
}

impl TemplateSource {
    /// Load every template from source.
    ///
    /// # Errors
    ///
    /// - Return [`TemplateError`] if a template directory is incomplete or
    ///   unreadable.
    pub fn load(&self) -> Result<Vec<ArtifactTemplate>> {
        match self {
            Self::Builtin => Ok(builtin_templates()),
            Self::Dir(dir) => load_templates(dir),
        }
    }
}

impl Display for TemplateSource {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Builtin => fmt.write_str("builtin templates"),
            Self::Dir(dir) => write!(fmt, "{:?}", dir.display()),
        }
    }
}

const BUILTIN: [(&str, &str); 7] = [
    (
        DATASOURCE_PATH,
        include_str!("../templates/provisioning/datasources/datasource.yaml"),
    ),
    (
        DASHBOARD_PROVIDER_PATH,
        include_str!("../templates/provisioning/dashboards/dashboard.yaml"),
    ),
    (
        ACCESS_CONTROL_PATH,
        include_str!("../templates/provisioning/access-control/api-permissions.yaml"),
    ),
    (
        "dashboards/github-organization.json",
        include_str!("../templates/dashboards/github-organization.json"),
    ),
    (
        "dashboards/github.json",
        include_str!("../templates/dashboards/github.json"),
    ),
    (SERVER_SETTINGS_PATH, include_str!("../templates/grafana.ini")),
    (COMPOSE_PATH, include_str!("../templates/docker-compose.yml")),
];

/// Builtin template set.
///
/// Ordered by kind, dashboards sorted by file name.
pub fn builtin_templates() -> Vec<ArtifactTemplate> {
    BUILTIN
        .iter()
        .filter_map(|(path, source)| {
            ArtifactKind::classify(path).map(|kind| ArtifactTemplate::new(kind, *path, *source))
        })
        .collect()
}

/// Load templates from directory.
///
/// Templates are ordered by kind, dashboards sorted by file name. This is the
/// same order [`builtin_templates`] uses.
///
/// # Errors
///
/// - Return [`TemplateError::Missing`] listing every required template that
///   does not exist.
/// - Return [`TemplateError::Read`] if a template exists but cannot be read.
#[instrument(skip(dir), level = "debug")]
pub fn load_templates(dir: impl AsRef<Path>) -> Result<Vec<ArtifactTemplate>> {
    let dir = dir.as_ref();
    debug!("load templates from {:?}", dir.display());

    let mut paths = vec![
        PathBuf::from(DATASOURCE_PATH),
        PathBuf::from(DASHBOARD_PROVIDER_PATH),
        PathBuf::from(ACCESS_CONTROL_PATH),
    ];
    let dashboards = list_dashboards(dir)?;
    let no_dashboards = dashboards.is_empty();
    paths.extend(dashboards);
    paths.push(PathBuf::from(SERVER_SETTINGS_PATH));
    paths.push(PathBuf::from(COMPOSE_PATH));

    let mut templates = Vec::with_capacity(paths.len());
    let mut missing = Vec::new();
    if no_dashboards {
        missing.push(Path::new(DASHBOARDS_DIR).join("*.json"));
    }

    for path in paths {
        let full_path = dir.join(&path);
        match read_to_string(&full_path) {
            Ok(source) => {
                // INVARIANT: Every listed path is a known artifact path.
                if let Some(kind) = ArtifactKind::classify(&path) {
                    templates.push(ArtifactTemplate::new(kind, path, source));
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => missing.push(path),
            Err(err) => {
                return Err(TemplateError::Read {
                    source: err,
                    path: full_path,
                })
            }
        }
    }

    if !missing.is_empty() {
        return Err(TemplateError::Missing {
            dir: dir.to_path_buf(),
            paths: missing,
        });
    }

    Ok(templates)
}

/// Scaffold builtin template set into directory.
///
/// Existing files holding the same bytes are left alone. Existing files with
/// different contents are replaced.
#[instrument(skip(persist, dir), level = "debug")]
pub fn scaffold(persist: &impl Persist, dir: impl AsRef<Path>) -> WriteSummary {
    info!("scaffold builtin templates into {:?}", dir.as_ref().display());
    let artifacts = builtin_templates()
        .into_iter()
        .map(|template| Artifact::new(template.kind, template.path, template.source))
        .collect::<Vec<_>>();
    write_artifacts(persist, dir, &artifacts)
}

fn list_dashboards(dir: &Path) -> Result<Vec<PathBuf>> {
    let full_path = dir.join(DASHBOARDS_DIR);
    let entries = match read_dir(&full_path) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(TemplateError::Read {
                source: err,
                path: full_path,
            })
        }
    };

    let mut dashboards = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| TemplateError::Read {
            source: err,
            path: full_path.clone(),
        })?;
        let path = Path::new(DASHBOARDS_DIR).join(entry.file_name());
        if ArtifactKind::classify(&path) == Some(ArtifactKind::Dashboard) {
            dashboards.push(path);
        }
    }
    dashboards.sort();

    Ok(dashboards)
}

/// Template loading error types.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Required templates do not exist.
    #[error("missing templates in {:?}: {}", dir.display(), display_paths(paths))]
    Missing { dir: PathBuf, paths: Vec<PathBuf> },

    /// Template exists but cannot be read.
    #[error("failed to read template {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Friendly result alias :3
type Result<T, E = TemplateError> = std::result::Result<T, E>;
