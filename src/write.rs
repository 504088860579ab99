// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Atomic artifact persistence.
//!
//! Every artifact is first written to a hidden sibling file named
//! `.<file_name>.tmp`, flushed to disk, then renamed over its destination.
//! A reader of the destination directory thus only ever sees the old file or
//! the complete new one.
//!
//! Artifacts are independent of each other. When one fails, its temporary
//! file is removed and its previous contents stay in place, but the rest of
//! the batch still goes through. Each outcome lands in the [`WriteSummary`].

use crate::artifact::{digest, Artifact, ArtifactKind};

use std::{
    fs::{self, OpenOptions},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Layer of indirection for staging and committing file contents.
pub trait Persist {
    /// Write full contents into temporary file.
    ///
    /// # Errors
    ///
    /// - Return [`io::Error`] if contents cannot be written and flushed.
    fn stage(&self, temp: &Path, contents: &[u8]) -> io::Result<()>;

    /// Move staged temporary file over its destination.
    ///
    /// # Errors
    ///
    /// - Return [`io::Error`] if rename fails.
    fn commit(&self, temp: &Path, path: &Path) -> io::Result<()>;
}

/// Persist through temporary file, fsync, and rename.
#[derive(Debug, Default, Copy, Clone)]
pub struct AtomicFile;

impl Persist for AtomicFile {
    fn stage(&self, temp: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp)?;
        file.write_all(contents)?;
        file.sync_all()
    }

    fn commit(&self, temp: &Path, path: &Path) -> io::Result<()> {
        fs::rename(temp, path)
    }
}

/// Result of writing one artifact that did not fail.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// New bytes were committed.
    Written,

    /// Destination already held identical bytes.
    Unchanged,
}

/// Outcome of writing one artifact.
#[derive(Debug)]
pub struct WriteRecord {
    pub kind: ArtifactKind,

    /// Path relative to destination root.
    pub path: PathBuf,
    pub result: Result<WriteStatus>,
}

/// Outcome of writing a batch of artifacts.
#[derive(Debug, Default)]
pub struct WriteSummary {
    pub records: Vec<WriteRecord>,
}

impl WriteSummary {
    /// Check if every artifact made it to disk.
    pub fn is_success(&self) -> bool {
        self.records.iter().all(|record| record.result.is_ok())
    }
}

/// Write artifacts into destination directory.
///
/// Artifacts whose bytes already match the destination file are left alone.
/// A failed artifact never affects its siblings.
#[instrument(skip(persist, dest, artifacts), level = "debug")]
pub fn write_artifacts(
    persist: &impl Persist,
    dest: impl AsRef<Path>,
    artifacts: &[Artifact],
) -> WriteSummary {
    let dest = dest.as_ref();
    let records = artifacts
        .iter()
        .map(|artifact| {
            let result = write_one(persist, dest, artifact);
            match &result {
                Ok(WriteStatus::Written) => info!("write {:?}", artifact.path.display()),
                Ok(WriteStatus::Unchanged) => debug!("{:?} unchanged", artifact.path.display()),
                Err(error) => warn!("{error}"),
            }

            WriteRecord {
                kind: artifact.kind,
                path: artifact.path.clone(),
                result,
            }
        })
        .collect();

    WriteSummary { records }
}

/// Path of temporary sibling used while staging target.
pub fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.tmp"))
}

fn write_one(persist: &impl Persist, dest: &Path, artifact: &Artifact) -> Result<WriteStatus> {
    write_file(persist, dest.join(&artifact.path), artifact.contents.as_bytes())
}

/// Atomically write one file.
///
/// Creates missing parent directories. A file already holding `contents`
/// is left alone.
///
/// # Errors
///
/// - Return [`WriteError::Read`] if existing file cannot be read.
/// - Return [`WriteError::CreateDir`] if parent directory cannot be created.
/// - Return [`WriteError::Persist`] if contents cannot be staged or
///   committed. The temporary file is removed and the previous file stays.
pub fn write_file(
    persist: &impl Persist,
    target: impl AsRef<Path>,
    contents: &[u8],
) -> Result<WriteStatus> {
    let target = target.as_ref();
    match fs::read(target) {
        Ok(bytes) if digest(&bytes) == digest(contents) => return Ok(WriteStatus::Unchanged),
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(WriteError::Read {
                source: err,
                path: target.to_path_buf(),
            })
        }
    }

    if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| WriteError::CreateDir {
            source: err,
            path: parent.to_path_buf(),
        })?;
    }

    let temp = temp_path(target);
    let persisted = persist
        .stage(&temp, contents)
        .and_then(|_| persist.commit(&temp, target));
    if let Err(err) = persisted {
        // INVARIANT: Never leave partial temporary file behind.
        match fs::remove_file(&temp) {
            Ok(_) => debug!("removed {:?}", temp.display()),
            Err(cleanup) if cleanup.kind() == ErrorKind::NotFound => {}
            Err(cleanup) => warn!("cannot remove {:?}: {cleanup}", temp.display()),
        }

        return Err(WriteError::Persist {
            source: err,
            path: target.to_path_buf(),
        });
    }

    Ok(WriteStatus::Written)
}

/// Artifact write error types.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Existing destination file cannot be read.
    #[error("failed to read {:?}", path.display())]
    Read {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// Parent directory cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// Contents cannot be staged or committed.
    #[error("failed to write {:?}", path.display())]
    Persist {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = WriteError> = std::result::Result<T, E>;
