// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive setup.
//!
//! Walk the user through the handful of inputs the synthesizer needs, then
//! save them as an env-style configuration file. Three modes exist:
//!
//! - __basic__: only token and repositories are asked for, the server runs
//!   on `http://localhost:3000`.
//! - __advanced__: also asks for server URL and domain.
//! - __enterprise__: also asks whether the server should enforce its domain.
//!
//! A token or repository list already present in the loaded configuration
//! can be reused instead of being typed again.

use crate::{
    config::UserConfig,
    validate::{is_hostname, is_repository, is_token},
    write::{write_file, Persist, WriteError, WriteStatus},
};

use inquire::{validator::Validation, Confirm, Password, Select, Text};
use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
};
use tracing::{info, instrument, warn};
use url::Url;

/// Env key recording which setup mode produced a configuration file.
pub const SETUP_MODE_KEY: &str = "SETUP_MODE";

const DEFAULT_ROOT_URL: &str = "http://localhost:3000";
const DEFAULT_DOMAIN: &str = "localhost";

/// Depth of interactive setup.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SetupMode {
    Basic,
    Advanced,
    Enterprise,
}

impl SetupMode {
    pub const ALL: [SetupMode; 3] = [Self::Basic, Self::Advanced, Self::Enterprise];

    /// Short name stored in configuration file.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Enterprise => "enterprise",
        }
    }
}

impl Display for SetupMode {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Basic => fmt.write_str("basic       simple setup on localhost"),
            Self::Advanced => fmt.write_str("advanced    custom server URL and domain"),
            Self::Enterprise => fmt.write_str("enterprise  production setup with domain enforcement"),
        }
    }
}

/// Run interactive setup.
///
/// Values in `current` are offered for reuse. Settings the prompts do not
/// cover are carried over from `current` as they are.
///
/// # Errors
///
/// - Return [`SetupError::Prompt`] if the user cancels or the terminal
///   cannot be prompted.
#[instrument(skip(current), level = "debug")]
pub fn run_setup(current: &UserConfig) -> Result<(UserConfig, SetupMode)> {
    let mode = Select::new("Choose configuration mode", SetupMode::ALL.to_vec()).prompt()?;
    let access_token = prompt_token(&current.access_token)?;
    let repositories = prompt_repositories(&current.repositories)?;

    let mut config = UserConfig {
        access_token,
        repositories,
        ..current.clone()
    };
    prompt_server(mode, &mut config)?;
    info!("organizations detected: {}", config.organizations().join(", "));

    Ok((config, mode))
}

/// Save configuration produced by setup.
///
/// # Errors
///
/// - Return [`SetupError::Write`] if file cannot be written atomically.
#[instrument(skip(persist, path, config), level = "debug")]
pub fn save_env_file(
    persist: &impl Persist,
    path: impl AsRef<Path>,
    config: &UserConfig,
    mode: SetupMode,
) -> Result<WriteStatus> {
    let status = write_file(persist, path.as_ref(), render_env_file(config, mode).as_bytes())?;
    info!("configuration saved to {:?}", path.as_ref().display());
    Ok(status)
}

/// Render env-style configuration file recording setup mode.
pub fn render_env_file(config: &UserConfig, mode: SetupMode) -> String {
    format!(
        "# GitHub dashboard configuration\n\n{config}\n# Configuration mode used\n{SETUP_MODE_KEY}={}\n",
        mode.name()
    )
}

/// Default domain for server URL.
///
/// Local URLs map to `localhost`, anything else to the URL's host.
pub fn default_domain_for(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(ToString::to_string))
        .filter(|host| !host.is_empty() && !host.contains("localhost"))
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string())
}

/// Last six characters of token, for display.
pub fn token_hint(token: &str) -> String {
    let tail = token.chars().rev().take(6).collect::<Vec<_>>();
    format!("...{}", tail.into_iter().rev().collect::<String>())
}

fn prompt_token(current: &str) -> Result<String> {
    if !current.is_empty() {
        let reuse = Confirm::new(&format!("Token found ({}). Use this one?", token_hint(current)))
            .with_default(false)
            .prompt()?;
        if reuse {
            return Ok(current.to_string());
        }
    }

    let token = Password::new("GitHub token")
        .without_confirmation()
        .with_help_message("create one at https://github.com/settings/tokens with repo, read:org, read:user")
        .with_validator(|input: &str| {
            if input.trim().len() < 20 {
                Ok(Validation::Invalid("token too short, check if it was copied completely".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;
    let token = token.trim().to_string();
    if !is_token(&token) {
        warn!("token format might be incorrect, proceeding anyway");
    }

    Ok(token)
}

fn prompt_repositories(current: &[String]) -> Result<Vec<String>> {
    if !current.is_empty() {
        let reuse = Confirm::new(&format!("Repositories found: {}. Use these?", current.join(", ")))
            .with_default(false)
            .prompt()?;
        if reuse {
            return Ok(current.to_vec());
        }
    }

    let mut repositories = Vec::new();
    let mut seen = HashSet::new();
    loop {
        let repo = Text::new(&format!("Repository #{}", repositories.len() + 1))
            .with_help_message("owner/name, e.g., docker/buildx, leave empty to finish")
            .with_validator(|input: &str| {
                let input = input.trim();
                if input.is_empty() || is_repository(input) {
                    Ok(Validation::Valid)
                } else {
                    Ok(Validation::Invalid("expected owner/name".into()))
                }
            })
            .prompt()?;
        let repo = repo.trim().to_string();

        if repo.is_empty() {
            if repositories.is_empty() {
                warn!("add at least one repository");
                continue;
            }
            break;
        }

        if !seen.insert(repo.to_lowercase()) {
            warn!("{repo} already added");
            continue;
        }

        info!("added {repo}");
        repositories.push(repo);
    }

    Ok(repositories)
}

fn prompt_server(mode: SetupMode, config: &mut UserConfig) -> Result<()> {
    if mode == SetupMode::Basic {
        config.root_url = Some(DEFAULT_ROOT_URL.into());
        config.domain = Some(DEFAULT_DOMAIN.into());
        config.enforce_domain = true;
        return Ok(());
    }

    let root_url = Text::new("Server URL")
        .with_default(DEFAULT_ROOT_URL)
        .with_validator(|input: &str| match Url::parse(input.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
                Ok(Validation::Valid)
            }
            _ => Ok(Validation::Invalid("expected absolute http(s) URL".into())),
        })
        .prompt()?;
    let root_url = root_url.trim().to_string();

    let default_domain = default_domain_for(&root_url);
    let domain = Text::new("Domain")
        .with_default(&default_domain)
        .with_validator(|input: &str| {
            if is_hostname(input.trim()) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("expected hostname".into()))
            }
        })
        .prompt()?;

    config.enforce_domain = match mode {
        SetupMode::Enterprise => Confirm::new("Enforce domain for security?")
            .with_default(true)
            .prompt()?,
        _ => true,
    };
    config.root_url = Some(root_url);
    config.domain = Some(domain.trim().to_string());

    Ok(())
}

/// Interactive setup error types.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Prompt was cancelled or failed.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),

    /// Configuration file cannot be saved.
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Friendly result alias :3
type Result<T, E = SetupError> = std::result::Result<T, E>;
