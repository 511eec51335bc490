/// RFC 6238 TOTP engine (HMAC-SHA1) on top of `totp_rs`.
///
/// Verification accepts the current step and `window` steps either side.
/// Each extra step of tolerance is another guess per attempt against a
/// 10^digits space, so the window is capped at [`MAX_WINDOW`].
use serde::Serialize;
use subtle::ConstantTimeEq;
use totp_rs::{Algorithm, TOTP};

use crate::error::{PkiError, Result};
use crate::store::Seed;

pub const DEFAULT_PERIOD: u64 = 30;
pub const DEFAULT_DIGITS: u32 = 6;
pub const DEFAULT_WINDOW: u8 = 1;

/// Upper bound on the verification window, in steps either side.
pub const MAX_WINDOW: u8 = 2;

/// Engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotpConfig {
    /// Step length in seconds.
    pub period: u64,
    /// Code width, 6 to 8.
    pub digits: u32,
    /// Accepted clock skew in steps either side of the current one.
    pub window: u8,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            digits: DEFAULT_DIGITS,
            window: DEFAULT_WINDOW,
        }
    }
}

impl TotpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(PkiError::Config("TOTP period must be positive".into()));
        }
        if !(6..=8).contains(&self.digits) {
            return Err(PkiError::Config(format!(
                "TOTP digits must be between 6 and 8, got {}",
                self.digits
            )));
        }
        if self.window > MAX_WINDOW {
            return Err(PkiError::Config(format!(
                "TOTP window must be at most {MAX_WINDOW}, got {}",
                self.window
            )));
        }
        Ok(())
    }
}

/// A fixed-width decimal code. Leading zeros are significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TotpCode(String);

impl TotpCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TotpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A code together with the seconds left in its step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedCode {
    pub code: TotpCode,
    pub valid_for: u64,
}

#[derive(Debug, Clone)]
pub struct TotpEngine {
    config: TotpConfig,
}

impl Default for TotpEngine {
    fn default() -> Self {
        Self {
            config: TotpConfig::default(),
        }
    }
}

impl TotpEngine {
    pub fn new(config: TotpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TotpConfig {
        &self.config
    }

    pub fn step_index(&self, now: u64) -> u64 {
        now / self.config.period
    }

    pub fn time_remaining(&self, now: u64) -> u64 {
        self.config.period - now % self.config.period
    }

    pub fn code_at_step(&self, seed: &Seed, step: u64) -> TotpCode {
        let totp = build_totp(seed.as_bytes(), &self.config);
        TotpCode(totp.generate(step.saturating_mul(self.config.period)))
    }

    pub fn generate(&self, seed: &Seed, now: u64) -> GeneratedCode {
        GeneratedCode {
            code: self.code_at_step(seed, self.step_index(now)),
            valid_for: self.time_remaining(now),
        }
    }

    /// Check `submitted` against the steps around `now`.
    ///
    /// An empty code is a caller error, not a failed verification.
    pub fn verify(&self, seed: &Seed, submitted: &str, now: u64) -> Result<bool> {
        if submitted.trim().is_empty() {
            return Err(PkiError::MissingCode);
        }
        Ok(self.matching_offset(seed, submitted, now).is_some())
    }

    /// Offset in steps of the first window position whose code matches.
    /// Every position is computed and compared so timing does not reveal which.
    fn matching_offset(&self, seed: &Seed, submitted: &str, now: u64) -> Option<i64> {
        let current = self.step_index(now);
        let window = i64::from(self.config.window);
        let mut matched = None;

        for offset in -window..=window {
            let Some(step) = current.checked_add_signed(offset) else {
                continue;
            };
            let expected = self.code_at_step(seed, step);
            let equal = expected.as_str().len() == submitted.len()
                && bool::from(expected.as_str().as_bytes().ct_eq(submitted.as_bytes()));
            if equal && matched.is_none() {
                matched = Some(offset);
            }
        }

        if let Some(offset) = matched {
            tracing::debug!(offset, "TOTP code accepted");
        }
        matched
    }

    /// `otpauth://` URI for enrolling the seed in an authenticator app.
    ///
    /// Label and issuer are percent-encoded. Neither may contain `:`.
    pub fn provisioning_uri(&self, seed: &Seed, issuer: &str, account: &str) -> Result<String> {
        let totp = TOTP::new(
            Algorithm::SHA1,
            self.config.digits as usize,
            0,
            self.config.period,
            seed.as_bytes().to_vec(),
            Some(issuer.to_owned()),
            account.to_owned(),
        )
        .map_err(|e| PkiError::Encoding(format!("cannot build otpauth URI: {e}")))?;
        Ok(totp.get_url())
    }
}

/// A `totp_rs` instance for `key`. Skew is zero; the window is applied by
/// [`TotpEngine::verify`] so it stays capped and constant-time.
fn build_totp(key: &[u8], config: &TotpConfig) -> TOTP {
    TOTP::new_unchecked(
        Algorithm::SHA1,
        config.digits as usize,
        0,
        config.period,
        key.to_vec(),
        None,
        String::new(),
    )
}
