//! Profile names as they appear in the AWS config file.

/// Name of the profile that is stored without the `profile ` prefix.
pub const DEFAULT_PROFILE: &str = "default";

/// Maps a profile name to its section name in `~/.aws/config`.
///
/// `default` is stored bare, every other profile lives under `[profile <name>]`.
/// The credentials file does not use this convention.
pub fn config_section_name(profile: &str) -> String {
    if profile.eq_ignore_ascii_case(DEFAULT_PROFILE) {
        profile.to_string()
    } else {
        format!("profile {profile}")
    }
}

/// Whether `profile` names the default profile.
pub fn is_default(profile: &str) -> bool {
    profile.eq_ignore_ascii_case(DEFAULT_PROFILE)
}
