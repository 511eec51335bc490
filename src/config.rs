/// Runtime configuration, from flags or `PKI_TOTP_*` environment variables.
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::crypto::keys::{FileKeySource, KeyRing};
use crate::crypto::totp::{TotpConfig, TotpEngine, DEFAULT_DIGITS, DEFAULT_PERIOD, DEFAULT_WINDOW};
use crate::error::Result;
use crate::service::TotpService;
use crate::store::FileSeedStore;

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Directory holding `<name>.pem` key files
    #[arg(long, global = true, env = "PKI_TOTP_KEY_DIR", default_value = "keys")]
    pub key_dir: PathBuf,

    /// Name of this side's RSA private key
    #[arg(long, global = true, env = "PKI_TOTP_PRIVATE_KEY", default_value = "student_private")]
    pub private_key: String,

    /// Name of the counterparty's RSA public key, used to seal attestations
    #[arg(
        long,
        global = true,
        env = "PKI_TOTP_COUNTERPARTY_KEY",
        default_value = "instructor_public"
    )]
    pub counterparty_key: String,

    /// Where the unwrapped seed is stored
    #[arg(long, global = true, env = "PKI_TOTP_SEED_PATH", default_value = "data/seed.txt")]
    pub seed_path: PathBuf,

    /// Append-only log written by `log-code`
    #[arg(long, global = true, env = "PKI_TOTP_CODE_LOG", default_value = "cron/last_code.txt")]
    pub code_log: PathBuf,

    /// TOTP step length in seconds
    #[arg(long, global = true, env = "PKI_TOTP_PERIOD", default_value_t = DEFAULT_PERIOD)]
    pub period: u64,

    /// TOTP code width
    #[arg(long, global = true, env = "PKI_TOTP_DIGITS", default_value_t = DEFAULT_DIGITS)]
    pub digits: u32,

    /// Steps of clock skew accepted either side when verifying
    #[arg(long, global = true, env = "PKI_TOTP_WINDOW", default_value_t = DEFAULT_WINDOW)]
    pub window: u8,
}

/// Which keys a command needs loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    None,
    Own,
    OwnAndCounterparty,
}

impl Config {
    pub fn totp(&self) -> TotpConfig {
        TotpConfig {
            period: self.period,
            digits: self.digits,
            window: self.window,
        }
    }

    pub fn key_source(&self) -> FileKeySource {
        FileKeySource::new(&self.key_dir)
    }

    pub fn seed_store(&self) -> FileSeedStore {
        FileSeedStore::new(&self.seed_path)
    }

    pub fn load_keys(&self, usage: KeyUsage) -> Result<Option<KeyRing>> {
        let counterparty = match usage {
            KeyUsage::None => return Ok(None),
            KeyUsage::Own => None,
            KeyUsage::OwnAndCounterparty => Some(self.counterparty_key.as_str()),
        };
        KeyRing::load(&self.key_source(), &self.private_key, counterparty).map(Some)
    }

    pub fn build_service(&self, usage: KeyUsage) -> Result<TotpService> {
        let engine = TotpEngine::new(self.totp())?;
        let keys = self.load_keys(usage)?;
        Ok(TotpService::new(Arc::new(self.seed_store()), engine, keys))
    }
}
