//! Errors raised while resolving MFA serials and persisting session credentials.
//!
//! Every failure is returned to the caller as a distinct variant; nothing in the
//! resolver or the credentials writer recovers, retries, or logs on its own.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result alias for the resolver and the credentials writer.
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The backing file could not be opened or parsed.
    #[error("Unable to open file: {} ({reason})", .path.display())]
    DocumentLoadFailed { path: PathBuf, reason: String },

    #[error("Unable to find profile: {profile}")]
    ProfileNotFound { profile: String },

    /// `max_depth` profiles were examined without finding a serial.
    #[error(
        "Exceeded profile referencing (max of {max_depth} references allowed). Last checked profile: {profile}"
    )]
    ChainTooLong { profile: String, max_depth: usize },

    /// `profile` points back at a profile already visited in `chain`.
    #[error("Circular reference of profiles detected ({profile}), chain: {}", .chain.join(" -> "))]
    CircularReference { profile: String, chain: Vec<String> },

    #[error("Blank source_profile specification found in: {profile}")]
    BlankSourceProfile { profile: String },

    #[error("Unable to find either mfa_serial or source_profile for profile {profile}")]
    MissingSerialAndSource { profile: String },

    #[error("Failed to set up section for profile: {profile}")]
    SectionCreateFailed { profile: String },

    #[error("Failed to save values to {}", .path.display())]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
