//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// AWS MFA session credential updater.
///
/// Looks up the MFA device of `--base-profile` in `~/.aws/config`, following
/// `source_profile` references, exchanges a one-time passcode for temporary
/// credentials and writes them to the `--auth-profile` section of
/// `~/.aws/credentials`.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Profile to read the MFA serial from
    #[arg(short, long, env = "AWS_MFA_BASE_PROFILE", default_value = "default")]
    pub base_profile: String,

    /// Profile to write the session credentials to; `default` is refused.
    /// Existing credentials in this profile are overwritten
    #[arg(short, long, env = "AWS_MFA_AUTH_PROFILE", default_value = "mfa")]
    pub auth_profile: String,

    /// One-time passcode; prompted for when missing or malformed
    #[arg(long)]
    pub otp: Option<String>,

    /// Home directory holding `.aws/` [default: current user's home]
    #[arg(long)]
    pub homedir: Option<PathBuf>,

    /// Path to AWS config file [default: <homedir>/.aws/config]
    #[arg(long, env = "AWS_CONFIG_FILE")]
    pub config_path: Option<PathBuf>,

    /// Path to AWS credentials file [default: <homedir>/.aws/credentials]
    #[arg(short, long, env = "AWS_SHARED_CREDENTIALS_FILE")]
    pub credentials_path: Option<PathBuf>,

    /// Session duration in seconds (900-129600)
    #[arg(
        short,
        long,
        env = "AWS_SESSION_DURATION",
        value_parser = clap::value_parser!(u32).range(900..=129600)
    )]
    pub duration: Option<u32>,

    /// Only read `mfa_serial` from the base profile itself
    #[arg(long)]
    pub no_chain: bool,

    /// Profile whose credentials sign the STS request [default: provider chain]
    #[arg(long)]
    pub credentials_profile: Option<String>,

    /// Read `aws sts get-session-token` JSON output from this file instead of calling STS
    #[arg(long, conflicts_with = "otp")]
    pub sts_json: Option<PathBuf>,

    /// 1Password account for automatic MFA token retrieval
    #[arg(long, env = "AWS_MFA_UPDATER_OP_ACCOUNT")]
    pub op_account: Option<String>,

    /// 1Password item name containing the TOTP
    #[arg(long, env = "AWS_MFA_UPDATER_OP_ITEM_NAME")]
    pub op_item_name: Option<String>,
}

/// Locations of the two AWS files.
#[derive(Debug, PartialEq, Eq)]
pub struct AwsPaths {
    pub config: PathBuf,
    pub credentials: PathBuf,
}

impl Args {
    /// Explicit paths win over `--homedir`, which wins over the user's home.
    pub fn aws_paths(&self) -> Result<AwsPaths> {
        let aws_dir = || -> Result<PathBuf> {
            self.homedir
                .clone()
                .or_else(dirs::home_dir)
                .map(|home| home.join(".aws"))
                .context("Could not determine home directory")
        };

        let config = match &self.config_path {
            Some(path) => path.clone(),
            None => aws_dir()?.join("config"),
        };
        let credentials = match &self.credentials_path {
            Some(path) => path.clone(),
            None => aws_dir()?.join("credentials"),
        };
        Ok(AwsPaths {
            config,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(homedir: &str) -> Args {
        Args {
            base_profile: "default".to_string(),
            auth_profile: "mfa".to_string(),
            otp: None,
            homedir: Some(PathBuf::from(homedir)),
            config_path: None,
            credentials_path: None,
            duration: None,
            no_chain: false,
            credentials_profile: None,
            sts_json: None,
            op_account: None,
            op_item_name: None,
        }
    }

    #[test]
    fn paths_derive_from_homedir() {
        assert_eq!(
            args("/home/alice").aws_paths().unwrap(),
            AwsPaths {
                config: PathBuf::from("/home/alice/.aws/config"),
                credentials: PathBuf::from("/home/alice/.aws/credentials"),
            }
        );
    }

    #[test]
    fn profile_defaults() {
        let args = Args::try_parse_from(["aws-mfa-update", "--otp", "123456"]).unwrap();
        assert_eq!(args.auth_profile, "mfa");
        assert_eq!(args.otp.as_deref(), Some("123456"));
        assert!(!args.no_chain);
    }

    #[test]
    fn sts_json_conflicts_with_otp() {
        assert!(
            Args::try_parse_from(["aws-mfa-update", "--otp", "123456", "--sts-json", "out.json"])
                .is_err()
        );
    }

    #[test]
    fn explicit_paths_override_homedir() {
        let args = Args::try_parse_from([
            "aws-mfa-update",
            "--homedir",
            "/home/alice",
            "--config-path",
            "/etc/aws/config",
            "--credentials-path",
            "/tmp/creds",
        ])
        .unwrap();

        let paths = args.aws_paths().unwrap();
        assert_eq!(paths.config, PathBuf::from("/etc/aws/config"));
        assert_eq!(paths.credentials, PathBuf::from("/tmp/creds"));
    }

    #[test]
    fn duration_is_range_checked() {
        assert!(Args::try_parse_from(["aws-mfa-update", "--duration", "899"]).is_err());
        assert!(Args::try_parse_from(["aws-mfa-update", "--duration", "129601"]).is_err());
        let args = Args::try_parse_from(["aws-mfa-update", "--duration", "3600"]).unwrap();
        assert_eq!(args.duration, Some(3600));
    }
}
