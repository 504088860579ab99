// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Template repository cloning.
//!
//! Templates can be kept in a git repository of their own so teams can share
//! customized dashboards. Cloning such a repository produces a template
//! directory that [`crate::template::load_templates`] can read.
//!
//! Progress of a clone is drawn through a progress bar. Credentials are
//! prompted for on demand, with the progress bar suspended while the user
//! types.

use auth_git2::{GitAuthenticator, Prompter};
use git2::{build::RepoBuilder, Config, FetchOptions, RemoteCallbacks, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{info, instrument};

/// Minimum delay between progress bar redraws.
const REDRAW_INTERVAL: Duration = Duration::from_millis(10);

/// Branch to check out after cloning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BranchTarget {
    /// Whatever the remote's HEAD points at.
    #[default]
    Default,

    /// Named branch.
    Named(String),
}

impl From<Option<String>> for BranchTarget {
    fn from(branch: Option<String>) -> Self {
        branch.map_or(Self::Default, Self::Named)
    }
}

/// Clone template repository into target directory.
///
/// The target directory must not exist yet, or be empty.
///
/// # Errors
///
/// - Return [`RemoteError::NotEmpty`] if target directory already holds
///   files.
/// - Return [`RemoteError::Git2`] if the clone fails.
/// - Return [`RemoteError::IndicatifStyleTemplate`] if progress bar style is
///   invalid.
#[instrument(skip(url, path, branch, bar), level = "debug")]
pub fn clone_template(
    url: impl AsRef<str>,
    path: impl AsRef<Path>,
    branch: &BranchTarget,
    bar: ProgressBar,
) -> Result<Repository> {
    let (url, path) = (url.as_ref(), path.as_ref());
    ensure_vacant(path)?;

    info!("clone {url:?} into {:?}", path.display());
    bar.set_style(
        ProgressStyle::with_template("{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]")?
            .progress_chars("-Cco."),
    );
    bar.set_message(url.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));

    let authenticator =
        GitAuthenticator::default().set_prompter(ClonePrompter { bar: bar.clone() });
    let config = Config::open_default()?;

    let mut last_redraw = Instant::now();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(authenticator.credentials(&config));
    callbacks.transfer_progress(|stats| {
        if last_redraw.elapsed() >= REDRAW_INTERVAL {
            last_redraw = Instant::now();
            bar.set_length(stats.total_objects() as u64);
            bar.set_position(stats.received_objects() as u64);
        }
        true
    });

    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(callbacks);
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch);
    if let BranchTarget::Named(branch) = branch {
        builder.branch(branch);
    }

    // INVARIANT: Clear progress bar whether or not the clone succeeded.
    let result = builder.clone(url, path);
    bar.finish_and_clear();

    Ok(result?)
}

fn ensure_vacant(path: &Path) -> Result<()> {
    let occupied = path
        .read_dir()
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if occupied {
        return Err(RemoteError::NotEmpty(path.to_path_buf()));
    }

    Ok(())
}

/// Credential prompter that hides the progress bar while the user types.
#[derive(Debug, Clone)]
struct ClonePrompter {
    bar: ProgressBar,
}

impl ClonePrompter {
    fn ask_secret(&self, label: &str) -> Option<String> {
        self.bar
            .suspend(|| Password::new(label).without_confirmation().prompt().ok())
    }
}

impl Prompter for ClonePrompter {
    fn prompt_username_password(&mut self, url: &str, _config: &Config) -> Option<(String, String)> {
        info!("credentials required for {url}");
        let username = self.bar.suspend(|| Text::new("username").prompt().ok())?;
        let password = self.ask_secret("password")?;
        Some((username, password))
    }

    fn prompt_password(&mut self, username: &str, url: &str, _config: &Config) -> Option<String> {
        info!("password required for {username} at {url}");
        self.ask_secret("password")
    }

    fn prompt_ssh_key_passphrase(&mut self, ssh_key_path: &Path, _config: &Config) -> Option<String> {
        info!("passphrase required for {:?}", ssh_key_path.display());
        self.ask_secret("passphrase")
    }
}

/// Template clone error types.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Target directory already holds files.
    #[error("refusing to clone into non-empty directory {:?}", .0.display())]
    NotEmpty(PathBuf),

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
type Result<T, E = RemoteError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn branch_target_from_option() {
        assert_eq!(BranchTarget::from(None), BranchTarget::Default);
        assert_eq!(
            BranchTarget::from(Some("main".to_string())),
            BranchTarget::Named("main".into())
        );
    }

    #[test]
    fn refuse_non_empty_target() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("keep.txt"), "keep")?;

        let result = clone_template(
            "file:///does/not/matter",
            dir.path(),
            &BranchTarget::Default,
            ProgressBar::hidden(),
        );
        assert!(matches!(result, Err(RemoteError::NotEmpty(_))));

        Ok(())
    }

    #[test]
    fn failed_clone_clears_progress_bar() -> anyhow::Result<()> {
        let remote = tempfile::tempdir()?;
        let target = tempfile::tempdir()?;
        let bar = ProgressBar::hidden();

        let result = clone_template(
            remote.path().join("missing.git").to_string_lossy(),
            target.path().join("template"),
            &BranchTarget::Default,
            bar.clone(),
        );
        assert!(matches!(result, Err(RemoteError::Git2(_))));
        assert!(bar.is_finished());

        Ok(())
    }
}
