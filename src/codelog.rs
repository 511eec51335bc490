/// Append-only log of periodically generated codes.
///
/// A scheduler runs `pki-totp log-code` every minute; each run appends
/// `YYYY-MM-DD HH:MM:SS - 2FA Code: NNNNNN` (UTC). The HTTP layer reads the
/// last entry back for `/latest-2fa`.
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::crypto::totp::TotpCode;
use crate::error::{PkiError, Result};

const CODE_MARKER: &str = "2FA Code:";

pub fn format_line(code: &TotpCode, at: DateTime<Utc>) -> String {
    format!("{} - {CODE_MARKER} {code}", at.format("%Y-%m-%d %H:%M:%S"))
}

pub fn append_code(path: &Path, code: &TotpCode, at: DateTime<Utc>) -> Result<String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let line = format_line(code, at);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(line)
}

/// The code on the last non-empty line of the log.
pub fn latest_code(path: &Path) -> Result<String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PkiError::CodeLogUnavailable(format!(
                "{} not found",
                path.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };

    let last = contents
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| PkiError::CodeLogUnavailable("log is empty".into()))?;

    let code = last.rsplit(':').next().unwrap_or_default().trim();
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PkiError::CodeLogUnavailable("Failed to read last OTP".into()));
    }
    Ok(code.to_owned())
}
