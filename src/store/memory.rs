/// In-process seed store: one slot, swapped under a write lock.
use parking_lot::RwLock;

use super::{Seed, SeedStore};
use crate::error::{PkiError, Result};

#[derive(Debug, Default)]
pub struct MemorySeedStore {
    slot: RwLock<Option<Seed>>,
}

impl MemorySeedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeedStore for MemorySeedStore {
    fn provision(&self, raw_seed: &[u8]) -> Result<()> {
        let seed = Seed::from_slice(raw_seed)?;
        *self.slot.write() = Some(seed);
        tracing::info!("seed provisioned in memory");
        Ok(())
    }

    fn current(&self) -> Result<Seed> {
        self.slot.read().clone().ok_or(PkiError::NotProvisioned)
    }
}
