// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for the template checkout, the user
//! configuration file, and the provisioning destination.

use std::path::PathBuf;

/// Default name of the env-style user configuration file.
pub const DEFAULT_CONFIG_FILE: &str = ".env";

/// Determine default absolute path to template checkout directory.
///
/// Uses XDG Base Directory path `$XDG_DATA_HOME/dashwright/template` as the
/// default absolute path for a cloned template. Does not check if the path
/// returned actually exists.
///
/// # Errors
///
/// - Return [`PathError::NoWayHome`] if data directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_template_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("dashwright").join("template"))
        .ok_or(PathError::NoWayHome)
}

/// Perform shell expansion on user supplied path.
///
/// Expands `~` and environment variables like `$HOME` or `${DEST}`.
///
/// # Errors
///
/// - Return [`PathError::ShellExpansion`] if a referenced variable is unset.
pub fn expand_path(raw: impl AsRef<str>) -> Result<PathBuf> {
    Ok(PathBuf::from(shellexpand::full(raw.as_ref())?.into_owned()))
}

/// Path resolution error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum PathError {
    /// No way to determine user's data directory.
    ///
    /// # See Also
    ///
    /// - [`dirs::data_dir`](https://docs.rs/dirs/latest/dirs/fn.data_dir.html)
    #[error("cannot determine absolute path to user's data directory")]
    NoWayHome,

    /// Failed to perform shell expansion on path.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

/// Friendly result alias :3
pub type Result<T, E = PathError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("DEST", "/srv/grafana")])]
    fn expand_environment_variable() -> anyhow::Result<()> {
        let result = expand_path("${DEST}/provisioning")?;
        assert_eq!(result, PathBuf::from("/srv/grafana/provisioning"));

        Ok(())
    }

    #[sealed_test]
    fn expand_unset_variable_fails() {
        std::env::remove_var("NOT_SET_ANYWHERE");
        let result = expand_path("$NOT_SET_ANYWHERE/foo");
        assert!(matches!(result, Err(PathError::ShellExpansion(_))));
    }
}
