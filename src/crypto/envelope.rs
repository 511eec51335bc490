/// RSA-OAEP envelope used to deliver the seed and to seal attestation signatures.
///
/// Parameters are fixed: SHA-256 for both the OAEP digest and MGF1, empty label.
/// Every unwrap failure collapses to `PkiError::DecryptionFailed` so callers
/// cannot tell a wrong key from bad padding or a wrong plaintext length.
/// Decryption is blinded to keep timing independent of the private exponent.
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::crypto::sensitive::SensitiveVec;
use crate::error::{PkiError, Result};

/// SHA-256 output length.
const HASH_LEN: usize = 32;

/// OAEP overhead: two hash lengths plus the 0x00 and 0x01 marker bytes.
pub const OAEP_OVERHEAD: usize = 2 * HASH_LEN + 2;

fn padding() -> Oaep {
    Oaep::new::<Sha256>()
}

/// Largest plaintext that fits under `key`.
pub fn max_plaintext_len(key: &impl PublicKeyParts) -> usize {
    key.size().saturating_sub(OAEP_OVERHEAD)
}

/// Encrypt `plaintext` for the holder of `public`.
///
/// Over-long plaintext is rejected before any encryption is attempted.
pub fn wrap(plaintext: &[u8], public: &RsaPublicKey) -> Result<Vec<u8>> {
    let max = max_plaintext_len(public);
    if plaintext.len() > max {
        return Err(PkiError::PlaintextTooLong {
            len: plaintext.len(),
            max,
        });
    }

    public
        .encrypt(&mut OsRng, padding(), plaintext)
        .map_err(|e| PkiError::Encryption(e.to_string()))
}

/// Decrypt an envelope with `private`.
pub fn unwrap(ciphertext: &[u8], private: &RsaPrivateKey) -> Result<SensitiveVec> {
    private
        .decrypt_blinded(&mut OsRng, padding(), ciphertext)
        .map(SensitiveVec::new)
        .map_err(|_| PkiError::DecryptionFailed)
}

/// Decrypt and require exactly `expected_len` plaintext bytes.
pub fn unwrap_exact(
    ciphertext: &[u8],
    private: &RsaPrivateKey,
    expected_len: usize,
) -> Result<SensitiveVec> {
    let plaintext = unwrap(ciphertext, private)?;
    if plaintext.len() != expected_len {
        return Err(PkiError::DecryptionFailed);
    }
    Ok(plaintext)
}
