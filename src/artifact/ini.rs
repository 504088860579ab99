// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Line-preserving INI editing.
//!
//! The dashboard server reads its settings from an INI file that users like
//! to annotate and tweak by hand. Instead of parsing that file into a map and
//! printing it back out, which would lose comments, spacing, and ordering,
//! the file is kept as raw lines. Edits touch only the line holding the
//! target key. Everything else is left byte-for-byte as it was.
//!
//! # Layout
//!
//! - `[section]` lines open a section. Section names may contain dots, e.g.,
//!   `[auth.anonymous]`, and the header may carry a trailing comment.
//! - `key = value` lines set a key within the current section.
//! - Lines starting with `;` or `#` are comments.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// INI document editor.
///
/// # Invariant
///
/// - Lines that are not edited keep their exact text.
/// - Setting a key to its current value does not mark the document changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IniDocument {
    lines: Vec<String>,
    trailing_newline: bool,
    changed: bool,
}

impl IniDocument {
    /// Check if any edit changed the document.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Check if section exists.
    pub fn has_section(&self, section: &str) -> bool {
        self.section_header(section).is_some()
    }

    /// Get current value of key within section.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let (start, end) = self.section_bounds(section)?;
        self.lines[start..end]
            .iter()
            .find_map(|line| parse_entry(line).filter(|(name, _)| *name == key))
            .map(|(_, value)| value)
    }

    /// Set key within section.
    ///
    /// Replaces the existing line for the key. If the key is absent, a new
    /// line is inserted after the last entry of the section. If the section
    /// is absent, it is appended to the end of the document.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        if self.get(section, key) == Some(value) {
            return;
        }

        let line = format!("{key} = {value}");
        match self.section_bounds(section) {
            Some((start, end)) => {
                let existing = (start..end)
                    .find(|idx| parse_entry(&self.lines[*idx]).is_some_and(|(name, _)| name == key));
                match existing {
                    Some(idx) => self.lines[idx] = line,
                    None => {
                        let last = (start..end)
                            .rev()
                            .find(|idx| !self.lines[*idx].trim().is_empty())
                            .map_or(start, |idx| idx + 1);
                        self.lines.insert(last, line);
                    }
                }
            }
            None => {
                if self.lines.last().is_some_and(|last| !last.trim().is_empty()) {
                    self.lines.push(String::new());
                }
                self.lines.push(format!("[{section}]"));
                self.lines.push(line);
            }
        }

        self.changed = true;
    }

    /// Remove key from section.
    pub fn remove(&mut self, section: &str, key: &str) {
        let Some((start, end)) = self.section_bounds(section) else {
            return;
        };

        let existing =
            (start..end).find(|idx| parse_entry(&self.lines[*idx]).is_some_and(|(name, _)| name == key));
        if let Some(idx) = existing {
            self.lines.remove(idx);
            self.changed = true;
        }
    }

    fn section_header(&self, section: &str) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| parse_header(line) == Some(section))
    }

    /// Range of lines after section header up to the next header.
    fn section_bounds(&self, section: &str) -> Option<(usize, usize)> {
        let start = self.section_header(section)? + 1;
        let end = self.lines[start..]
            .iter()
            .position(|line| parse_header(line).is_some())
            .map_or(self.lines.len(), |offset| start + offset);

        Some((start, end))
    }
}

impl Display for IniDocument {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.lines.join("\n"))?;
        if self.trailing_newline && !self.lines.is_empty() {
            fmt.write_str("\n")?;
        }

        Ok(())
    }
}

impl From<&str> for IniDocument {
    fn from(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_owned).collect(),
            trailing_newline: content.is_empty() || content.ends_with('\n'),
            changed: false,
        }
    }
}

impl From<String> for IniDocument {
    fn from(content: String) -> Self {
        Self::from(content.as_str())
    }
}

fn parse_header(line: &str) -> Option<&str> {
    let (name, tail) = line.trim().strip_prefix('[')?.split_once(']')?;
    let tail = tail.trim_start();
    if !(tail.is_empty() || tail.starts_with(';') || tail.starts_with('#')) {
        return None;
    }

    Some(name.trim())
}

fn parse_entry(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.starts_with(';') || trimmed.starts_with('#') || trimmed.starts_with('[') {
        return None;
    }

    trimmed
        .split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
}
