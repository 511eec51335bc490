/// Seed storage: exactly one live seed, replaced wholesale on each provision.
///
/// Backends:
/// - `FileSeedStore`: base-32 text at a rest path, swapped in by atomic rename
/// - `MemorySeedStore`: a single slot behind a read/write lock
pub mod file;
pub mod memory;

pub use file::FileSeedStore;
pub use memory::MemorySeedStore;

use crate::crypto::encoding;
use crate::crypto::sensitive::SensitiveBytes32;
use crate::error::{PkiError, Result};

/// Raw seed length in bytes (64 hex characters).
pub const SEED_LEN: usize = 32;

/// A provisioned TOTP secret. Zeroized on drop.
#[derive(Clone, Debug)]
pub struct Seed(SensitiveBytes32);

impl Seed {
    /// Accept exactly [`SEED_LEN`] bytes. Nothing is truncated or padded.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        SensitiveBytes32::from_slice(bytes)
            .map(Self)
            .ok_or(PkiError::InvalidSeedLength {
                expected: SEED_LEN,
                actual: bytes.len(),
            })
    }

    pub fn from_base32(text: &str) -> Result<Self> {
        let bytes = zeroize::Zeroizing::new(encoding::base32_to_bytes(text)?);
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        self.0.as_bytes()
    }

    pub fn to_base32(&self) -> String {
        encoding::bytes_to_base32(self.as_bytes())
    }
}

/// Holder of the single live seed.
///
/// `provision` validates before touching storage and replaces the previous
/// value in one step; readers see either the old seed or the new one.
pub trait SeedStore: Send + Sync {
    fn provision(&self, raw_seed: &[u8]) -> Result<()>;

    fn current(&self) -> Result<Seed>;
}
