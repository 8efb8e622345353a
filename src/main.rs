//! AWS MFA session credential updater
//!
//! Refreshes temporary AWS credentials gated behind MFA and stores them in a
//! dedicated profile of the shared credentials file.
//!
//! The program performs the following operations:
//! 1. Parses command-line arguments and environment overrides
//! 2. Resolves the MFA serial of the base profile from `~/.aws/config`,
//!    following `source_profile` references
//! 3. Obtains a one-time passcode (flag, 1Password, or interactive prompt)
//! 4. Exchanges serial and passcode for session credentials through STS
//! 5. Upserts the credentials into the auth profile of `~/.aws/credentials`

use std::fs;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use log::info;

mod cli;
mod credentials;
mod document;
mod error;
mod otp;
mod profile;
mod resolver;
mod updater;

use cli::Args;
use credentials::{SessionCredentials, StsSessionIssuer};
use document::ConfigDocument;
use resolver::{ResolverOptions, resolve_mfa_serial};

#[tokio::main]
async fn main() -> Result<()> {
    // INFO by default, RUST_LOG overrides.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    ensure!(
        !profile::is_default(&args.auth_profile),
        "Refusing to overwrite the default profile's credentials; use a dedicated auth profile"
    );

    let paths = args.aws_paths()?;
    let base_section = profile::config_section_name(&args.base_profile);
    let options = if args.no_chain {
        ResolverOptions::without_chaining()
    } else {
        ResolverOptions::default()
    };

    let config = ConfigDocument::load(&paths.config).context("Failed to get the MFA serial")?;
    let serial = resolve_mfa_serial(&config, &base_section, options)
        .context("Failed to get the MFA serial")?;
    info!("Using MFA device {serial} from [{base_section}]");

    let session = match &args.sts_json {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Unable to read {}", path.display()))?;
            SessionCredentials::from_sts_json(&json)?
        }
        None => {
            let otp = otp::acquire_otp(args.otp, args.op_account, args.op_item_name)
                .context("Failed to get a reasonable OTP")?;
            info!(
                "Fetching credentials - Duration: {}",
                args.duration
                    .map_or_else(|| "STS default".to_string(), |d| format!("{d}s"))
            );
            StsSessionIssuer::new(args.credentials_profile, args.duration)
                .get_session_token(&serial, &otp)
                .await?
        }
    };

    let mut store = ConfigDocument::load_or_empty(&paths.credentials)
        .context("Unable to set the MFA credentials")?;
    updater::upsert_credentials(&mut store, &args.auth_profile, &session)
        .context("Unable to set the MFA credentials")?;

    info!(
        "MFA credentials set for profile [{}] using profile [{base_section}]",
        args.auth_profile
    );
    info!("Success! Credentials expire at: {}", session.expiration);

    Ok(())
}
