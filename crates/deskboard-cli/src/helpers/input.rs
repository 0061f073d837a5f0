//! Interactive input: passphrases and long text bodies.

use std::io::{self, IsTerminal, Read};

use dialoguer::Password;

use crate::errors::CliError;

/// Environment variable holding the store passphrase.
pub const PASSPHRASE_ENV: &str = "DESKBOARD_PASSPHRASE";

/// Passphrase from DESKBOARD_PASSPHRASE, if set and not blank.
pub fn env_passphrase() -> Option<String> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Prompt for the store passphrase.
pub fn prompt_passphrase(interactive: bool) -> anyhow::Result<String> {
    if !interactive {
        return Err(CliError::auth_failed_with_hint(
            "No passphrase provided and no TTY available.",
            format!("Hint: Set {}.", PASSPHRASE_ENV),
        )
        .into());
    }
    Password::new()
        .with_prompt("Passphrase")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Passphrase for a new store, confirmed when prompted.
pub fn prompt_new_passphrase(interactive: bool) -> anyhow::Result<String> {
    if let Some(value) = env_passphrase() {
        return Ok(value);
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No passphrase provided and no TTY available. Set {}.",
            PASSPHRASE_ENV
        ))
        .into());
    }
    Password::new()
        .with_prompt("New passphrase")
        .with_confirmation("Confirm passphrase", "Passphrases do not match")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Read a text body from the flag, or from stdin when it is piped.
///
/// Returns an empty string when neither is available.
pub fn read_body(body: Option<&str>) -> anyhow::Result<String> {
    if let Some(value) = body {
        return Ok(value.to_string());
    }
    if io::stdin().is_terminal() {
        return Ok(String::new());
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    Ok(buffer.trim_end().to_string())
}
