//! Writes temporary session credentials into the AWS credentials file.
//!
//! The destination profile receives three keys and nothing else is touched.
//! Given an existing `[mfa]` with a `region`, the update produces:
//!
//! ```ini
//! [mfa]
//! region = us-east-1
//! aws_access_key_id = ASIA...
//! aws_secret_access_key = ...
//! aws_session_token = ...
//! ```
//!
//! Other sections, and other keys of the destination section, keep their
//! values and order, including values that contain `#` or `;`. The file is
//! rewritten in the `key = value` layout and whole-line comments are not
//! kept. The expiration returned by STS is reported to the user by the caller
//! and is not written to the file.

use log::debug;

use crate::{credentials::SessionCredentials, document::ConfigDocument, error::CoreResult};

pub const ACCESS_KEY_ID_KEY: &str = "aws_access_key_id";
pub const SECRET_ACCESS_KEY_KEY: &str = "aws_secret_access_key";
pub const SESSION_TOKEN_KEY: &str = "aws_session_token";

/// Upserts `credentials` under `[profile]` and saves the document.
///
/// The update runs in three steps:
/// 1. Creates `[profile]` when the document has no such section
/// 2. Sets `aws_access_key_id`, `aws_secret_access_key` and
///    `aws_session_token`, overwriting each in place when present and
///    appending it otherwise
/// 3. Writes the whole document back to its file
///
/// Calling this twice with the same credentials leaves the same key/value
/// pairs as calling it once.
///
/// # Arguments
///
/// * `document` - The credentials file, loaded by the caller
/// * `profile` - Destination section name, used verbatim (no `profile `
///   prefix in the credentials file)
/// * `credentials` - Session credentials from STS; `expiration` is ignored
///
/// # Returns
///
/// * `Ok(())` - The file on disk holds the new credentials
/// * `Err(CoreError::SectionCreateFailed)` - `profile` cannot be written as a
///   section header; nothing was changed
/// * `Err(CoreError::PersistFailed)` - The file could not be written. The
///   in-memory document keeps the new values and is not rolled back.
///
/// # File Layout
///
/// The saved file uses `key = value` with one blank line between sections.
/// Whole-line comments in the original file are not preserved.
pub fn upsert_credentials(
    document: &mut ConfigDocument,
    profile: &str,
    credentials: &SessionCredentials,
) -> CoreResult<()> {
    // The credentials file uses plain profile names, unlike ~/.aws/config
    if !document.has_section(profile) {
        debug!("Creating section [{profile}] in {}", document.path().display());
        document.create_section(profile)?;
    }

    let fields = [
        (ACCESS_KEY_ID_KEY, credentials.access_key_id.as_str()),
        (SECRET_ACCESS_KEY_KEY, credentials.secret_access_key.as_str()),
        (SESSION_TOKEN_KEY, credentials.session_token.as_str()),
    ];
    for (key, value) in fields {
        match document.set(profile, key, value) {
            Some(_) => debug!("Updated {key} in [{profile}]"),
            None => debug!("Added {key} to [{profile}]"),
        }
    }

    // Nothing reaches disk before this point
    document.save()
}
