use thiserror::Error;

#[derive(Error, Debug)]
pub enum PkiError {
    /// Any failure while unwrapping an envelope. Carries no detail on purpose.
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Seed must decode to exactly {expected} bytes, got {actual}")]
    InvalidSeedLength { expected: usize, actual: usize },

    #[error("Seed not decrypted yet")]
    NotProvisioned,

    #[error("Stored seed is unreadable")]
    CorruptSeed,

    #[error("Missing code")]
    MissingCode,

    #[error("Commit id must be a 40-character hex string")]
    InvalidCommitId,

    #[error("Key load failed: {0}")]
    KeyLoad(String),

    #[error("Plaintext of {len} bytes exceeds the {max}-byte envelope limit")]
    PlaintextTooLong { len: usize, max: usize },

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Malformed signature")]
    MalformedSignature,

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Code log unavailable: {0}")]
    CodeLogUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PkiError>;
