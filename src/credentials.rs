use std::fmt;

use anyhow::{Context, Result};
use aws_sdk_sts::{Client, types};
use aws_smithy_types::date_time::Format;
use serde::Deserialize;

/// Temporary credentials returned by STS `GetSessionToken`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSessionTokenOutput {
    credentials: SessionCredentials,
}

impl SessionCredentials {
    /// Parses the output of `aws sts get-session-token`.
    pub fn from_sts_json(json: &str) -> Result<Self> {
        let output: GetSessionTokenOutput =
            serde_json::from_str(json).context("Failed to parse STS JSON response")?;
        Ok(output.credentials)
    }

    fn from_sts(credentials: &types::Credentials) -> Result<Self> {
        Ok(Self {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: credentials.expiration().fmt(Format::DateTime)?,
        })
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Exchanges an MFA serial and one-time passcode for session credentials.
pub struct StsSessionIssuer {
    /// Profile the STS client authenticates with; the default provider chain
    /// is used when unset.
    profile: Option<String>,
    /// Session duration in seconds; STS picks its default when unset.
    duration: Option<u32>,
}

impl StsSessionIssuer {
    pub fn new(profile: Option<String>, duration: Option<u32>) -> Self {
        Self { profile, duration }
    }

    pub async fn get_session_token(&self, serial: &str, otp: &str) -> Result<SessionCredentials> {
        let mut loader = aws_config::from_env();
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        let output = Client::new(&config)
            .get_session_token()
            .set_duration_seconds(self.duration.map(|d| d as i32))
            .serial_number(serial)
            .token_code(otp)
            .send()
            .await
            .context("Unable to run STS GetSessionToken")?;

        let credentials = output.credentials().context("No credentials returned")?;
        SessionCredentials::from_sts(credentials)
    }
}
