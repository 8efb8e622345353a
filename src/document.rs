//! File-backed `[section]` / `key = value` documents.
//!
//! Both `~/.aws/config` and `~/.aws/credentials` are handled through
//! [`ConfigDocument`]: load the whole file, inspect or mutate it in memory,
//! then [`ConfigDocument::save`] it back over the original. A document is owned
//! by one operation at a time and nothing is visible on disk before `save`.
//!
//! Parsing is delegated to `configparser`, configured so that:
//!
//! - section and key names keep their case
//! - sections and keys keep their file order
//! - a literal `[default]` section round-trips like any other section
//! - `#` and `;` inside a value are part of the value (`credential_process`
//!   commands, SSO URLs with fragments), only whole-line comments are comments
//!
//! Saving renders the AWS CLI layout: `key = value`, one blank line between
//! sections. Whole-line comments are dropped on save; `configparser` does not
//! keep them.

use std::{
    fs,
    path::{Path, PathBuf},
};

use configparser::ini::{Ini, IniDefault, WriteOptions};
use log::debug;

use crate::error::{CoreError, CoreResult};

/// Holds keys that appear before the first section header. A section header is
/// a single line, so no real section can carry this name.
const PREAMBLE_SECTION: &str = "\n";

/// Layout used when writing a document back: `key = value`, four-space
/// continuation indent, one blank line between sections.
fn write_options() -> WriteOptions {
    WriteOptions::new_with_params(true, 4, 1)
}

/// An AWS config or credentials file held in memory.
///
/// The document owns both the parsed sections and the path it was read from,
/// so a [`ConfigDocument::save`] always goes back to the same file.
pub struct ConfigDocument {
    /// File the document was loaded from and is saved to
    path: PathBuf,
    /// Parsed sections, in file order
    ini: Ini,
}

impl ConfigDocument {
    /// Reads and parses the file at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the config or credentials file. It is kept as the
    ///   target of later saves.
    ///
    /// # Returns
    ///
    /// * `Ok(ConfigDocument)` - The whole file parsed into sections
    /// * `Err(CoreError::DocumentLoadFailed)` - The file is missing, unreadable,
    ///   or malformed (e.g. a `[` header without `]`); the error names the file
    pub fn load(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|e| CoreError::DocumentLoadFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::parse(path, &text)
    }

    /// Like [`ConfigDocument::load`], but a file that does not exist yet yields
    /// an empty document that will be created on save.
    pub fn load_or_empty(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        if path.exists() {
            Self::load(path)
        } else {
            debug!("{} does not exist, starting from an empty document", path.display());
            Ok(Self::empty(path))
        }
    }

    /// A document with no sections, backed by `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ini: new_ini(),
        }
    }

    /// Parses `text` as the content of the file at `path`.
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> CoreResult<Self> {
        let path = path.into();
        let mut ini = new_ini();
        ini.read(text.to_string())
            .map_err(|reason| CoreError::DocumentLoadFailed {
                path: path.clone(),
                reason,
            })?;
        Ok(Self { path, ini })
    }

    /// File this document is saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a `[section]` with exactly this name exists (case-sensitive).
    pub fn has_section(&self, section: &str) -> bool {
        section != PREAMBLE_SECTION && self.ini.get_map_ref().contains_key(section)
    }

    /// Value of `key` in `section`. A key written without a value reads as `""`.
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get_map_ref()
            .get(section)?
            .get(key)
            .map(|value| value.clone().unwrap_or_default())
    }

    /// Adds an empty section named `section`.
    ///
    /// Names that cannot be written back as a `[section]` header are rejected
    /// with [`CoreError::SectionCreateFailed`]. Creating a section that already
    /// exists leaves it untouched.
    pub fn create_section(&mut self, section: &str) -> CoreResult<()> {
        let writable = !section.trim().is_empty()
            && !section.contains(['[', ']', '\n', '\r'])
            && section.trim() == section;
        if !writable {
            return Err(CoreError::SectionCreateFailed {
                profile: section.to_string(),
            });
        }
        self.ini
            .get_mut_map()
            .entry(section.to_string())
            .or_default();
        Ok(())
    }

    /// Sets `key` in an existing `section` and returns the previous value.
    ///
    /// An existing key keeps its position; a new key is appended after the
    /// section's other keys.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> Option<String> {
        self.ini
            .set(section, key, Some(value.to_string()))
            .flatten()
    }

    /// Renders the document in the AWS CLI layout.
    pub fn to_text(&self) -> String {
        self.ini.pretty_writes(&write_options())
    }

    /// Overwrites the backing file with the current content.
    ///
    /// The whole file is rewritten; whole-line comments from the original file
    /// are not carried over.
    ///
    /// # Errors
    ///
    /// * `CoreError::PersistFailed` - The file could not be written. The
    ///   in-memory document is unchanged by the failure.
    pub fn save(&self) -> CoreResult<()> {
        fs::write(&self.path, self.to_text()).map_err(|source| CoreError::PersistFailed {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
impl ConfigDocument {
    /// Section names in file order.
    pub fn sections(&self) -> Vec<String> {
        self.ini
            .get_map_ref()
            .keys()
            .filter(|name| name.as_str() != PREAMBLE_SECTION)
            .cloned()
            .collect()
    }

    /// Key/value pairs of `section` in file order.
    pub fn entries(&self, section: &str) -> Option<Vec<(String, String)>> {
        let keys = self.ini.get_map_ref().get(section)?;
        Some(
            keys.iter()
                .map(|(key, value)| (key.clone(), value.clone().unwrap_or_default()))
                .collect(),
        )
    }
}

fn new_ini() -> Ini {
    let mut defaults = IniDefault::default();
    defaults.default_section = PREAMBLE_SECTION.to_string();
    defaults.case_sensitive = true;
    // `#` and `;` are legal inside AWS values
    defaults.enable_inline_comments = false;
    Ini::new_from_defaults(defaults)
}
