//! One-time passcode acquisition.
//!
//! Sources are tried in order: the passcode given on the command line, the
//! 1Password CLI when an account and item are configured, then an interactive
//! prompt.

use std::{
    io::{BufRead, Write},
    process::Command,
};

use anyhow::{Result, bail};
use log::{info, warn};

/// Number of prompts before giving up on the user.
pub const MAX_PROMPT_ATTEMPTS: usize = 5;

/// AWS MFA codes are exactly six ASCII digits.
pub fn is_valid_otp(otp: &str) -> bool {
    otp.len() == 6 && otp.bytes().all(|b| b.is_ascii_digit())
}

/// Returns a well-formed passcode from the first source that yields one.
pub fn acquire_otp(
    supplied: Option<String>,
    op_account: Option<String>,
    op_item_name: Option<String>,
) -> Result<String> {
    if let Some(otp) = supplied {
        if is_valid_otp(&otp) {
            return Ok(otp);
        }
        warn!("Supplied OTP doesn't look right, falling back");
    }

    if let (Some(account), Some(item)) = (op_account, op_item_name) {
        if let Some(otp) = otp_from_1password(&account, &item) {
            info!("Retrieved MFA token from 1Password");
            return Ok(otp);
        }
        warn!("Failed to get token from 1Password, falling back to manual input");
    }

    let stdin = std::io::stdin();
    prompt_otp(&mut stdin.lock(), &mut std::io::stdout())
}

fn otp_from_1password(account: &str, item: &str) -> Option<String> {
    let output = Command::new("op")
        .args(["item", "get", "--account", account, item, "--otp"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let otp = String::from_utf8_lossy(&output.stdout).trim().to_string();
    is_valid_otp(&otp).then_some(otp)
}

/// Prompts on `output` and reads lines from `input` until a valid passcode is
/// entered, at most [`MAX_PROMPT_ATTEMPTS`] times.
pub fn prompt_otp<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    for _ in 0..MAX_PROMPT_ATTEMPTS {
        write!(output, "Enter OTP: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("Failed to read the OTP: input closed");
        }

        let otp = line.trim_end_matches(['\r', '\n']);
        if is_valid_otp(otp) {
            return Ok(otp.to_string());
        }
        warn!("OTP doesn't look right (should be a six-digit code), try again...");
    }
    bail!("OTP retried too many times")
}
