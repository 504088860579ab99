// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Structural inspection of provisioning artifacts.
//!
//! A digest comparison only says whether an artifact matches what synthesis
//! would produce. Inspection asks whether the artifacts on disk can serve
//! the monitoring dashboards at all. It looks for the GitHub datasource,
//! the stock dashboards, a home dashboard, a time range on every
//! dashboard, and panels that point at datasources nobody provisioned.
//!
//! Findings are warnings. They never fail a run.

use crate::artifact::{Artifact, ArtifactKind, Document, DATASOURCE_PATH, SERVER_SETTINGS_PATH};

use serde_json::Value;
use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Plugin type of the GitHub datasource.
pub const DATASOURCE_TYPE: &str = "grafana-github-datasource";

/// Dashboards every installation ships.
pub const REQUIRED_DASHBOARDS: [&str; 2] =
    ["dashboards/github.json", "dashboards/github-organization.json"];

/// Datasource identifiers the dashboard server defines on its own.
const BUILTIN_DATASOURCES: [&str; 4] = ["grafana", "-- Grafana --", "-- Mixed --", "-- Dashboard --"];

/// Structural problem found in a set of artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralWarning {
    /// No datasource entry of the GitHub plugin type.
    NoGithubDatasource,

    /// Stock dashboard absent.
    MissingDashboard(PathBuf),

    /// Server settings do not name a home dashboard.
    NoHomeDashboard,

    /// Dashboard lacks a `time.from`/`time.to` range.
    NoTimeRange(PathBuf),

    /// Panel references a datasource that is not provisioned.
    UnknownDatasource { path: PathBuf, uid: String },

    /// Artifact does not parse in its format.
    Unparsable { path: PathBuf, reason: String },
}

impl Display for StructuralWarning {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NoGithubDatasource => {
                write!(fmt, "{DATASOURCE_PATH}: no {DATASOURCE_TYPE} entry")
            }
            Self::MissingDashboard(path) => write!(fmt, "{}: missing", path.display()),
            Self::NoHomeDashboard => write!(
                fmt,
                "{SERVER_SETTINGS_PATH}: dashboards.default_home_dashboard_path not set"
            ),
            Self::NoTimeRange(path) => write!(fmt, "{}: no time range", path.display()),
            Self::UnknownDatasource { path, uid } => {
                write!(fmt, "{}: unknown datasource uid {uid:?}", path.display())
            }
            Self::Unparsable { path, reason } => write!(fmt, "{}: {reason}", path.display()),
        }
    }
}

/// Inspect artifacts as they sit on disk.
///
/// Pass every artifact that exists. Absent stock dashboards and an absent
/// datasource or settings file are reported as such.
#[instrument(skip(artifacts), level = "debug")]
pub fn inspect(artifacts: &[Artifact]) -> Vec<StructuralWarning> {
    let mut warnings = Vec::new();
    let mut datasources = None;
    let mut home_dashboard = false;
    let mut dashboards = Vec::new();

    for artifact in artifacts {
        let document = match Document::parse(artifact.kind.format(), &artifact.contents) {
            Ok(document) => document,
            Err(error) => {
                warnings.push(StructuralWarning::Unparsable {
                    path: artifact.path.clone(),
                    reason: error.to_string(),
                });
                continue;
            }
        };

        match (artifact.kind, document) {
            (ArtifactKind::Datasource, Document::Tree(tree)) => datasources = Some(tree),
            (ArtifactKind::Dashboard, Document::Tree(tree)) => {
                dashboards.push((artifact.path.as_path(), tree))
            }
            (ArtifactKind::ServerSettings, Document::Ini(ini)) => {
                home_dashboard = ini
                    .get("dashboards", "default_home_dashboard_path")
                    .is_some_and(|path| !path.is_empty());
            }
            _ => {}
        }
    }

    let provisioned = datasources.as_ref().map(provisioned_uids);
    if !datasources.as_ref().is_some_and(has_github_datasource) {
        warnings.push(StructuralWarning::NoGithubDatasource);
    }

    for required in REQUIRED_DASHBOARDS {
        if !dashboards.iter().any(|(path, _)| *path == Path::new(required)) {
            warnings.push(StructuralWarning::MissingDashboard(required.into()));
        }
    }

    if !home_dashboard {
        warnings.push(StructuralWarning::NoHomeDashboard);
    }

    for (path, dashboard) in &dashboards {
        if !has_time_range(dashboard) {
            warnings.push(StructuralWarning::NoTimeRange(path.to_path_buf()));
        }

        // INVARIANT: Only judge references when datasources are known.
        let Some(provisioned) = &provisioned else {
            continue;
        };

        let variables = datasource_variables(dashboard);
        let mut seen = HashSet::new();
        let mut uids = Vec::new();
        referenced_uids(dashboard, &mut uids);
        for uid in uids {
            if provisioned.contains(uid)
                || BUILTIN_DATASOURCES.contains(&uid)
                || is_variable_reference(uid, &variables)
                || !seen.insert(uid)
            {
                continue;
            }

            warnings.push(StructuralWarning::UnknownDatasource {
                path: path.to_path_buf(),
                uid: uid.to_string(),
            });
        }
    }

    debug!("{} structural warnings", warnings.len());
    warnings
}

fn datasource_entries(tree: &Value) -> impl Iterator<Item = &Value> {
    tree.get("datasources")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn has_github_datasource(tree: &Value) -> bool {
    datasource_entries(tree)
        .any(|entry| entry.get("type").and_then(Value::as_str) == Some(DATASOURCE_TYPE))
}

fn provisioned_uids(tree: &Value) -> HashSet<String> {
    datasource_entries(tree)
        .filter_map(|entry| entry.get("uid").and_then(Value::as_str))
        .map(str::to_owned)
        .collect()
}

fn has_time_range(dashboard: &Value) -> bool {
    let time = &dashboard["time"];
    time.get("from").is_some() && time.get("to").is_some()
}

/// Names of dashboard variables of type `datasource`.
fn datasource_variables(dashboard: &Value) -> HashSet<&str> {
    dashboard["templating"]["list"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|var| var.get("type").and_then(Value::as_str) == Some("datasource"))
        .filter_map(|var| var.get("name").and_then(Value::as_str))
        .collect()
}

fn is_variable_reference(uid: &str, variables: &HashSet<&str>) -> bool {
    let Some(name) = uid.strip_prefix('$') else {
        return false;
    };
    let name = name
        .strip_prefix('{')
        .and_then(|name| name.strip_suffix('}'))
        .unwrap_or(name);

    variables.contains(name)
}

/// Collect every `datasource.uid` below node, in document order.
fn referenced_uids<'a>(node: &'a Value, out: &mut Vec<&'a str>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "datasource" {
                    if let Some(uid) = child.get("uid").and_then(Value::as_str) {
                        out.push(uid);
                    }
                }
                referenced_uids(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                referenced_uids(item, out);
            }
        }
        _ => {}
    }
}
