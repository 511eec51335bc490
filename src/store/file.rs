/// File-backed seed store.
///
/// The seed is kept as base-32 text. A provision writes a fresh temp file in
/// the target directory and renames it over the old one, so concurrent
/// readers never open a partially written value.
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::{Seed, SeedStore};
use crate::error::{PkiError, Result};

#[derive(Debug, Clone)]
pub struct FileSeedStore {
    path: PathBuf,
}

impl FileSeedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl SeedStore for FileSeedStore {
    fn provision(&self, raw_seed: &[u8]) -> Result<()> {
        let seed = Seed::from_slice(raw_seed)?;
        let text = Zeroizing::new(seed.to_base32());

        let dir = self.dir();
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| PkiError::Io(e.error))?;

        info!(path = %self.path.display(), "seed provisioned");
        Ok(())
    }

    fn current(&self) -> Result<Seed> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => Zeroizing::new(text),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(PkiError::NotProvisioned),
            Err(e) => return Err(e.into()),
        };

        Seed::from_base32(&text).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "stored seed failed to decode");
            PkiError::CorruptSeed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_then_current() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSeedStore::new(dir.path().join("data/seed.txt"));

        store.provision(&[0xABu8; 32]).unwrap();
        assert_eq!(store.current().unwrap().as_bytes(), &[0xABu8; 32]);

        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(on_disk, Seed::from_slice(&[0xABu8; 32]).unwrap().to_base32());
    }

    #[test]
    fn test_not_provisioned() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSeedStore::new(dir.path().join("seed.txt"));
        assert!(matches!(store.current(), Err(PkiError::NotProvisioned)));
    }

    #[test]
    fn test_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSeedStore::new(dir.path().join("seed.txt"));
        store.provision(&[1u8; 32]).unwrap();
        store.provision(&[2u8; 32]).unwrap();
        assert_eq!(store.current().unwrap().as_bytes(), &[2u8; 32]);
    }

    #[test]
    fn test_bad_length_leaves_previous_seed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSeedStore::new(dir.path().join("seed.txt"));
        store.provision(&[1u8; 32]).unwrap();

        assert!(matches!(
            store.provision(&[2u8; 31]),
            Err(PkiError::InvalidSeedLength { actual: 31, .. })
        ));
        assert!(matches!(
            store.provision(&[2u8; 33]),
            Err(PkiError::InvalidSeedLength { actual: 33, .. })
        ));
        assert_eq!(store.current().unwrap().as_bytes(), &[1u8; 32]);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.txt");
        std::fs::write(&path, "not base32 at all!").unwrap();
        let store = FileSeedStore::new(&path);
        assert!(matches!(store.current(), Err(PkiError::CorruptSeed)));
    }

    #[test]
    fn test_accepts_unpadded_text_with_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.txt");
        let text = Seed::from_slice(&[9u8; 32]).unwrap().to_base32();
        std::fs::write(&path, format!("{}\n", text.trim_end_matches('='))).unwrap();
        let store = FileSeedStore::new(&path);
        assert_eq!(store.current().unwrap().as_bytes(), &[9u8; 32]);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSeedStore::new(dir.path().join("seed.txt"));
        for i in 0..5u8 {
            store.provision(&[i; 32]).unwrap();
        }
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_seed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSeedStore::new(dir.path().join("seed.txt"));
        store.provision(&[0u8; 32]).unwrap();

        std::thread::scope(|scope| {
            for writer in 1..=4u8 {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..25 {
                        store.provision(&[writer; 32]).unwrap();
                    }
                });
            }
            for _ in 0..4 {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..100 {
                        let seed = store.current().unwrap();
                        let first = seed.as_bytes()[0];
                        assert!(seed.as_bytes().iter().all(|b| *b == first));
                    }
                });
            }
        });
    }
}
