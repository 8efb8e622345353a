//! MFA serial lookup in the AWS config file.
//!
//! A profile either names its MFA device directly through `mfa_serial`, or
//! points at another profile through `source_profile`, which is followed until
//! a serial is found:
//!
//! ```ini
//! [default]
//! mfa_serial = arn:aws:iam::123456789012:mfa/alice
//!
//! [profile work]
//! source_profile = default
//! ```
//!
//! Resolving `profile work` yields alice's device. Chains are bounded by
//! [`ResolverOptions::max_depth`] and a profile reached twice is reported as a
//! circular reference.

use log::debug;

use crate::{
    document::ConfigDocument,
    error::{CoreError, CoreResult},
    profile::config_section_name,
};

pub const MFA_SERIAL_KEY: &str = "mfa_serial";
pub const SOURCE_PROFILE_KEY: &str = "source_profile";

/// Maximum number of `source_profile` references followed by default.
pub const DEFAULT_MAX_DEPTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Number of profiles that may be examined before giving up. A depth of 1
    /// only looks at the starting profile and never follows `source_profile`.
    pub max_depth: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolverOptions {
    /// Options that ignore `source_profile` entirely.
    pub fn without_chaining() -> Self {
        Self { max_depth: 1 }
    }
}

/// Resolves the MFA serial for `start`, following `source_profile` references.
///
/// `start` is a section name as stored in the config document, i.e. already
/// passed through [`config_section_name`] by the caller. Values of
/// `source_profile` are transformed the same way before they are looked up.
///
/// When a section carries both keys, `mfa_serial` wins.
///
/// # Arguments
///
/// * `document` - The parsed `~/.aws/config`
/// * `start` - Section name to start from, e.g. `default` or `profile work`
/// * `options` - Depth limit; [`ResolverOptions::without_chaining`] only looks
///   at `start`
///
/// # Returns
///
/// * `Ok(String)` - The `mfa_serial` value of the first profile in the chain
///   that has one, exactly as written
/// * `Err(CoreError)` - Resolution failed; the error names the profile where
///   it stopped
///
/// # Errors
///
/// - [`CoreError::ChainTooLong`] once `max_depth` profiles were examined
///   without finding a serial; names the last profile examined
/// - [`CoreError::ProfileNotFound`] when a profile in the chain has no section
/// - [`CoreError::BlankSourceProfile`] when `source_profile` is empty
/// - [`CoreError::CircularReference`] when the next profile was already visited
/// - [`CoreError::MissingSerialAndSource`] when a section has neither key
///
/// # Ordering
///
/// The depth check runs before the section lookup, and the cycle check only
/// compares the next profile against profiles already left behind. A profile
/// naming itself is therefore reported one step later, with the profile
/// appearing twice in the chain.
pub fn resolve_mfa_serial(
    document: &ConfigDocument,
    start: &str,
    options: ResolverOptions,
) -> CoreResult<String> {
    // Profiles already examined, in order. Owned by this call only.
    let mut visited: Vec<String> = Vec::with_capacity(options.max_depth);
    let mut current = start.to_string();

    loop {
        // Depth first, so the limit counts profiles examined, not found
        if visited.len() >= options.max_depth {
            return Err(CoreError::ChainTooLong {
                profile: visited.last().cloned().unwrap_or(current),
                max_depth: options.max_depth,
            });
        }

        if !document.has_section(&current) {
            return Err(CoreError::ProfileNotFound { profile: current });
        }

        if let Some(serial) = document.get(&current, MFA_SERIAL_KEY) {
            debug!("Found {MFA_SERIAL_KEY} in [{current}] after {} reference(s)", visited.len());
            return Ok(serial);
        }

        let Some(source) = document.get(&current, SOURCE_PROFILE_KEY) else {
            return Err(CoreError::MissingSerialAndSource { profile: current });
        };

        // Blank is judged before the prefix is applied
        let source = source.trim();
        if source.is_empty() {
            return Err(CoreError::BlankSourceProfile { profile: current });
        }
        let next = config_section_name(source);

        if visited.contains(&next) {
            visited.push(current.clone());
            return Err(CoreError::CircularReference {
                profile: current,
                chain: visited,
            });
        }

        debug!("[{current}] has no {MFA_SERIAL_KEY}, following {SOURCE_PROFILE_KEY} to [{next}]");
        visited.push(current);
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> ConfigDocument {
        ConfigDocument::parse("config", text).unwrap()
    }

    /// `profile p1` -> `profile p2` -> ... -> `profile p{len}`, the last one
    /// holding `mfa_serial` when `serial_at_end` is set.
    fn chain(len: usize, serial_at_end: bool) -> ConfigDocument {
        let mut text = String::new();
        for i in 1..=len {
            text.push_str(&format!("[profile p{i}]\n"));
            if i < len {
                text.push_str(&format!("source_profile = p{}\n", i + 1));
            } else if serial_at_end {
                text.push_str("mfa_serial = arn:aws:iam::123:mfa/end\n");
            } else {
                text.push_str(&format!("source_profile = p{}\n", i + 1));
            }
        }
        doc(&text)
    }

    #[test]
    fn source_profile_default_resolves() {
        let d = doc("\
[profile work]
source_profile = default

[default]
mfa_serial = arn:aws:iam::123:mfa/alice
");
        let serial = resolve_mfa_serial(&d, "profile work", ResolverOptions::default()).unwrap();
        assert_eq!(serial, "arn:aws:iam::123:mfa/alice");
    }

    #[test]
    fn serial_takes_precedence_over_source() {
        let d = doc("\
[profile a]
mfa_serial = arn:aws:iam::1:mfa/a
source_profile = b
");
        let serial = resolve_mfa_serial(&d, "profile a", ResolverOptions::default()).unwrap();
        assert_eq!(serial, "arn:aws:iam::1:mfa/a");
    }

    #[test]
    fn missing_start_profile() {
        let d = doc("[default]\nregion = us-east-1\n");
        let err = resolve_mfa_serial(&d, "profile ghost", ResolverOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::ProfileNotFound { profile } if profile == "profile ghost"));
    }

    #[test]
    fn missing_referenced_profile() {
        let d = doc("[profile a]\nsource_profile = b\n");
        let err = resolve_mfa_serial(&d, "profile a", ResolverOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::ProfileNotFound { profile } if profile == "profile b"));
    }

    #[test]
    fn neither_key_present() {
        let d = doc("[profile a]\nregion = us-east-1\n");
        let err = resolve_mfa_serial(&d, "profile a", ResolverOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::MissingSerialAndSource { profile } if profile == "profile a"));
    }

    #[test]
    fn blank_source_profile() {
        let d = doc("[profile a]\nsource_profile =\n");
        let err = resolve_mfa_serial(&d, "profile a", ResolverOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::BlankSourceProfile { profile } if profile == "profile a"));
    }

    #[test]
    fn two_profile_cycle() {
        let d = doc("\
[profile p1]
source_profile = p2

[profile p2]
source_profile = p1
");
        let err = resolve_mfa_serial(&d, "profile p1", ResolverOptions::default()).unwrap_err();
        match err {
            CoreError::CircularReference { profile, chain } => {
                assert_eq!(profile, "profile p2");
                assert_eq!(chain, vec!["profile p1", "profile p2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_reference_is_caught_on_following_step() {
        let d = doc("[profile loop]\nsource_profile = loop\n");
        let err = resolve_mfa_serial(&d, "profile loop", ResolverOptions::default()).unwrap_err();
        match err {
            CoreError::CircularReference { profile, chain } => {
                assert_eq!(profile, "profile loop");
                assert_eq!(chain, vec!["profile loop", "profile loop"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn six_profile_chain_succeeds() {
        let serial = resolve_mfa_serial(&chain(6, true), "profile p1", ResolverOptions::default());
        assert_eq!(serial.unwrap(), "arn:aws:iam::123:mfa/end");
    }

    #[test]
    fn seven_profile_chain_is_too_long() {
        let err = resolve_mfa_serial(&chain(7, true), "profile p1", ResolverOptions::default())
            .unwrap_err();
        match err {
            CoreError::ChainTooLong { profile, max_depth } => {
                assert_eq!(profile, "profile p6");
                assert_eq!(max_depth, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn open_ended_chain_stops_at_depth() {
        let err = resolve_mfa_serial(&chain(7, false), "profile p1", ResolverOptions::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::ChainTooLong { .. }));
    }

    #[test]
    fn without_chaining_only_reads_start() {
        let d = doc("\
[profile work]
source_profile = default

[default]
mfa_serial = arn:aws:iam::123:mfa/alice
");
        let err = resolve_mfa_serial(&d, "profile work", ResolverOptions::without_chaining())
            .unwrap_err();
        assert!(matches!(err, CoreError::ChainTooLong { profile, .. } if profile == "profile work"));

        let serial = resolve_mfa_serial(&d, "default", ResolverOptions::without_chaining()).unwrap();
        assert_eq!(serial, "arn:aws:iam::123:mfa/alice");
    }

    #[test]
    fn zero_depth_fails_on_start() {
        let d = doc("[default]\nmfa_serial = x\n");
        let err = resolve_mfa_serial(&d, "default", ResolverOptions { max_depth: 0 }).unwrap_err();
        assert!(matches!(err, CoreError::ChainTooLong { profile, .. } if profile == "default"));
    }

    #[test]
    fn each_call_starts_with_a_fresh_chain() {
        let d = doc("\
[profile a]
source_profile = b

[profile b]
mfa_serial = arn:aws:iam::1:mfa/b
");
        for _ in 0..3 {
            let serial = resolve_mfa_serial(&d, "profile a", ResolverOptions::default()).unwrap();
            assert_eq!(serial, "arn:aws:iam::1:mfa/b");
        }
    }
}
