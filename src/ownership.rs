// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Field ownership table.
//!
//! Synthesis never patches documents by convention. Instead, every field the
//! user configuration controls is declared up front in [`OWNERSHIP`], mapping
//! an artifact kind and field path to the configuration field that owns it.
//! Any field not listed here belongs to the template or to whoever edited
//! the artifact by hand, and synthesis leaves it alone.
//!
//! # Rules
//!
//! - An owned value of `None` removes the field from the artifact.
//! - For YAML and JSON artifacts, an entry only applies when the parent of
//!   its path exists in the template. Thus, a dashboard without a
//!   `repository` variable simply does not own one.
//! - For INI artifacts, a path is `section.key` and always applies.

use crate::{
    artifact::{
        field::{FieldPath, Segment},
        ArtifactKind,
    },
    config::{ConfigField, UserConfig, TOKEN_KEY},
};

use serde_json::{json, Value};

/// Default shown by the repository filter when no repository is configured.
pub const REPOSITORY_SENTINEL: &str = "select a repository";

/// Default shown by the organization filter when no repository is configured.
pub const ORGANIZATION_SENTINEL: &str = "select an organization";

/// Name of the GitHub entry in the datasource artifact.
pub const DATASOURCE_NAME: &str = "GitHub";

/// Role granted to anonymous viewers.
pub const ANONYMOUS_ROLE: &str = "restricted_viewer";

/// One row of the ownership table.
#[derive(Debug, Copy, Clone)]
pub struct Ownership {
    pub kind: ArtifactKind,
    pub path: FieldPath,
    pub owner: ConfigField,
    value: fn(&UserConfig) -> Option<Value>,
}

impl Ownership {
    /// Desired value of owned field under given configuration.
    pub fn value(&self, config: &UserConfig) -> Option<Value> {
        (self.value)(config)
    }
}

macro_rules! variable_path {
    ($name:literal, $member:literal) => {
        FieldPath(&[
            Segment::Key("templating"),
            Segment::Key("list"),
            Segment::Named($name),
            Segment::Key($member),
        ])
    };
}

/// Ownership table of every configuration-driven artifact field.
pub const OWNERSHIP: &[Ownership] = &[
    Ownership {
        kind: ArtifactKind::Datasource,
        path: FieldPath(&[
            Segment::Key("datasources"),
            Segment::Named(DATASOURCE_NAME),
            Segment::Key("secureJsonData"),
            Segment::Key("accessToken"),
        ]),
        owner: ConfigField::AccessToken,
        value: access_token,
    },
    Ownership {
        kind: ArtifactKind::Datasource,
        path: FieldPath(&[
            Segment::Key("datasources"),
            Segment::Named(DATASOURCE_NAME),
            Segment::Key("jsonData"),
            Segment::Key("githubUrl"),
        ]),
        owner: ConfigField::ApiUrl,
        value: |config: &UserConfig| config.api_url.clone().map(Value::String),
    },
    Ownership {
        kind: ArtifactKind::Dashboard,
        path: variable_path!("repository", "options"),
        owner: ConfigField::Repositories,
        value: |config: &UserConfig| Some(variable_options(&repository_choices(config))),
    },
    Ownership {
        kind: ArtifactKind::Dashboard,
        path: variable_path!("repository", "query"),
        owner: ConfigField::Repositories,
        value: |config: &UserConfig| Some(variable_query(&repository_choices(config))),
    },
    Ownership {
        kind: ArtifactKind::Dashboard,
        path: variable_path!("repository", "current"),
        owner: ConfigField::Repositories,
        value: |config: &UserConfig| {
            Some(variable_current(&repository_choices(config), REPOSITORY_SENTINEL))
        },
    },
    Ownership {
        kind: ArtifactKind::Dashboard,
        path: variable_path!("organization", "options"),
        owner: ConfigField::Repositories,
        value: |config: &UserConfig| Some(variable_options(&organization_choices(config))),
    },
    Ownership {
        kind: ArtifactKind::Dashboard,
        path: variable_path!("organization", "query"),
        owner: ConfigField::Repositories,
        value: |config: &UserConfig| Some(variable_query(&organization_choices(config))),
    },
    Ownership {
        kind: ArtifactKind::Dashboard,
        path: variable_path!("organization", "current"),
        owner: ConfigField::Repositories,
        value: |config: &UserConfig| {
            Some(variable_current(&organization_choices(config), ORGANIZATION_SENTINEL))
        },
    },
    Ownership {
        kind: ArtifactKind::AccessControl,
        path: FieldPath(&[
            Segment::Key("roles"),
            Segment::Named(ANONYMOUS_ROLE),
            Segment::Key("permissions"),
        ]),
        owner: ConfigField::AnonymousAccess,
        value: anonymous_permissions,
    },
    Ownership {
        kind: ArtifactKind::ServerSettings,
        path: FieldPath(&[Segment::Key("server"), Segment::Key("root_url")]),
        owner: ConfigField::RootUrl,
        value: |config: &UserConfig| config.root_url.clone().map(Value::String),
    },
    Ownership {
        kind: ArtifactKind::ServerSettings,
        path: FieldPath(&[Segment::Key("server"), Segment::Key("domain")]),
        owner: ConfigField::Domain,
        value: |config: &UserConfig| config.domain.clone().map(Value::String),
    },
    Ownership {
        kind: ArtifactKind::ServerSettings,
        path: FieldPath(&[Segment::Key("server"), Segment::Key("enforce_domain")]),
        owner: ConfigField::EnforceDomain,
        value: |config: &UserConfig| Some(Value::Bool(config.enforce_domain)),
    },
    Ownership {
        kind: ArtifactKind::ServerSettings,
        path: FieldPath(&[Segment::Key("auth.anonymous"), Segment::Key("enabled")]),
        owner: ConfigField::AnonymousAccess,
        value: |config: &UserConfig| Some(Value::Bool(config.anonymous_access)),
    },
];

/// Ownership table rows for one artifact kind.
pub fn owned_fields(kind: ArtifactKind) -> impl Iterator<Item = &'static Ownership> {
    OWNERSHIP.iter().filter(move |entry| entry.kind == kind)
}

fn access_token(config: &UserConfig) -> Option<Value> {
    let token = if config.embed_token {
        config.access_token.clone()
    } else {
        format!("${{{TOKEN_KEY}}}")
    };

    Some(Value::String(token))
}

/// Dashboard variable choice: label shown to viewers, value sent in queries.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Choice {
    text: String,
    value: String,
}

/// Repository choices label `owner/name` but query by name alone, since panel
/// targets pass owner separately.
fn repository_choices(config: &UserConfig) -> Vec<Choice> {
    config
        .unique_repositories()
        .into_iter()
        .map(|repository| {
            let value = repository
                .rsplit_once('/')
                .map_or(repository.as_str(), |(_, name)| name)
                .to_string();
            Choice { text: repository, value }
        })
        .collect()
}

fn organization_choices(config: &UserConfig) -> Vec<Choice> {
    config
        .organizations()
        .into_iter()
        .map(|organization| Choice {
            text: organization.clone(),
            value: organization,
        })
        .collect()
}

fn variable_options(choices: &[Choice]) -> Value {
    Value::Array(
        choices
            .iter()
            .enumerate()
            .map(|(idx, choice)| {
                json!({"selected": idx == 0, "text": choice.text, "value": choice.value})
            })
            .collect(),
    )
}

/// Custom variable query in `text : value` form, collapsed when both agree.
fn variable_query(choices: &[Choice]) -> Value {
    let entries = choices
        .iter()
        .map(|choice| {
            if choice.text == choice.value {
                choice.text.clone()
            } else {
                format!("{} : {}", choice.text, choice.value)
            }
        })
        .collect::<Vec<_>>();

    Value::String(entries.join(","))
}

fn variable_current(choices: &[Choice], sentinel: &str) -> Value {
    match choices.first() {
        Some(first) => json!({"selected": true, "text": first.text, "value": first.value}),
        None => json!({"selected": false, "text": sentinel, "value": ""}),
    }
}

fn anonymous_permissions(config: &UserConfig) -> Option<Value> {
    if !config.anonymous_access {
        return Some(json!([]));
    }

    Some(json!([
        {"action": "dashboards:read", "scope": "dashboards:*"},
        {"action": "datasources:read", "scope": "datasources:*"},
    ]))
}
