/// The four operations exposed to a transport (HTTP, CLI):
/// unwrap-seed, generate-code, verify-code and produce-attestation.
///
/// Failure policy:
/// - Everything that can go wrong while turning an encrypted seed into seed
///   bytes is reported as `DecryptionFailed`, with no further detail.
/// - Caller input (empty code, malformed commit id) is checked before any key
///   or seed is touched.
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::attestation::{self, Attestation};
use crate::crypto::keys::KeyRing;
use crate::crypto::totp::{GeneratedCode, TotpEngine};
use crate::crypto::{encoding, envelope};
use crate::error::{PkiError, Result};
use crate::store::{SeedStore, SEED_LEN};

/// Hex text length of a delivered seed.
const SEED_HEX_LEN: usize = SEED_LEN * 2;

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct TotpService {
    store: Arc<dyn SeedStore>,
    engine: TotpEngine,
    keys: Option<Arc<KeyRing>>,
    clock: Arc<dyn Clock>,
}

impl TotpService {
    pub fn new(store: Arc<dyn SeedStore>, engine: TotpEngine, keys: Option<KeyRing>) -> Self {
        Self {
            store,
            engine,
            keys: keys.map(Arc::new),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn engine(&self) -> &TotpEngine {
        &self.engine
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    fn keys(&self) -> Result<&KeyRing> {
        self.keys
            .as_deref()
            .ok_or_else(|| PkiError::KeyLoad("no private key loaded".into()))
    }

    /// Decrypt a base64 RSA-OAEP seed envelope and make it the live seed.
    ///
    /// The plaintext must be exactly 64 hex characters.
    pub fn unwrap_seed(&self, encrypted_seed: &str) -> Result<()> {
        let keys = self.keys()?;
        let seed = self.decrypt_seed(encrypted_seed, keys).map_err(|e| {
            warn!("seed envelope rejected");
            e
        })?;

        self.store.provision(&seed).map_err(|e| match e {
            PkiError::InvalidSeedLength { .. } => PkiError::DecryptionFailed,
            other => other,
        })?;

        info!("seed unwrapped and stored");
        Ok(())
    }

    fn decrypt_seed(&self, encrypted_seed: &str, keys: &KeyRing) -> Result<Zeroizing<Vec<u8>>> {
        let ciphertext =
            encoding::base64_decode(encrypted_seed).map_err(|_| PkiError::DecryptionFailed)?;
        let plaintext = envelope::unwrap_exact(&ciphertext, &keys.own_private, SEED_HEX_LEN)?;
        let seed_hex =
            std::str::from_utf8(plaintext.as_bytes()).map_err(|_| PkiError::DecryptionFailed)?;
        let seed = encoding::hex_to_bytes(seed_hex).map_err(|_| PkiError::DecryptionFailed)?;
        Ok(Zeroizing::new(seed))
    }

    pub fn generate_code(&self) -> Result<GeneratedCode> {
        let seed = self.store.current()?;
        Ok(self.engine.generate(&seed, self.now()))
    }

    pub fn verify_code(&self, code: &str) -> Result<bool> {
        if code.trim().is_empty() {
            return Err(PkiError::MissingCode);
        }
        let seed = self.store.current()?;
        self.engine.verify(&seed, code, self.now())
    }

    /// Sign `commit_id` with the own key and seal it for the counterparty.
    pub fn produce_attestation(&self, commit_id: &str) -> Result<Attestation> {
        attestation::CommitId::parse(commit_id)?;
        let keys = self.keys()?;
        attestation::produce(commit_id, &keys.own_private, keys.counterparty()?)
    }

    pub fn provisioning_uri(&self, issuer: &str, account: &str) -> Result<String> {
        let seed = self.store.current()?;
        self.engine.provisioning_uri(&seed, issuer, account)
    }
}
