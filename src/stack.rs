// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Container stack control.
//!
//! The dashboard server runs as a compose stack defined by the
//! `docker-compose.yml` artifact. Starting and stopping it is delegated to
//! the `docker compose` binary, pointed at the destination directory and the
//! configuration file so `${GITHUB_TOKEN}` references resolve.

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::Command,
};
use tracing::{info, instrument};

/// Stack operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StackAction {
    /// Start stack detached.
    Up,

    /// Stop and remove stack.
    Down,
}

/// Build arguments for `docker` binary.
pub fn compose_args(
    action: StackAction,
    project_dir: impl AsRef<Path>,
    env_file: Option<&Path>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "compose".into(),
        "--project-directory".into(),
        project_dir.as_ref().as_os_str().to_os_string(),
    ];

    if let Some(env_file) = env_file {
        args.push("--env-file".into());
        args.push(env_file.as_os_str().to_os_string());
    }

    match action {
        StackAction::Up => args.extend(["up".into(), "-d".into()]),
        StackAction::Down => args.push("down".into()),
    }

    args
}

/// Run stack action through `docker compose`.
///
/// # Errors
///
/// - Return [`StackError::Syscall`] if `docker` cannot be spawned or exits
///   with failure.
#[instrument(skip(project_dir, env_file), level = "debug")]
pub fn run_stack(
    action: StackAction,
    project_dir: impl AsRef<Path>,
    env_file: Option<&Path>,
) -> Result<()> {
    info!("docker compose {action:?} in {:?}", project_dir.as_ref().display());
    syscall_interactive("docker", compose_args(action, project_dir, env_file))
}

fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<()> {
    let status = Command::new(cmd.as_ref()).args(args).spawn()?.wait()?;
    if !status.success() {
        return Err(StackError::Syscall(std::io::Error::other(format!(
            "command {:?} failed with {status}",
            cmd.as_ref()
        ))));
    }

    Ok(())
}

/// Stack control error types.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// External binary cannot be run or fails.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),
}

/// Friendly result alias :3
type Result<T, E = StackError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn up_runs_detached_with_env_file() {
        let args = compose_args(StackAction::Up, "out", Some(Path::new(".env")));
        let expect = vec![
            "compose",
            "--project-directory",
            "out",
            "--env-file",
            ".env",
            "up",
            "-d",
        ];
        assert_eq!(strings(args), expect);
    }

    #[test]
    fn down_without_env_file() {
        let args = compose_args(StackAction::Down, "out", None);
        assert_eq!(strings(args), vec!["compose", "--project-directory", "out", "down"]);
    }
}
