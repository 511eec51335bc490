/// RSA-PSS signatures: SHA-256 digest, MGF1-SHA-256, maximum salt length.
///
/// Salts are fresh per call, so re-signing the same message produces
/// different bytes. Compare signatures by verifying them, never byte-wise.
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::{PkiError, Result};

const HASH_LEN: usize = 32;

/// Largest salt the key allows: `emLen - hLen - 2`, `emLen = ceil((modBits - 1) / 8)`.
pub fn max_salt_len(key: &impl PublicKeyParts) -> usize {
    let mod_bits = key.n().bits();
    let em_len = mod_bits.saturating_sub(1).div_ceil(8);
    em_len.saturating_sub(HASH_LEN + 2)
}

fn padding(key: &impl PublicKeyParts) -> Pss {
    Pss::new_with_salt::<Sha256>(max_salt_len(key))
}

/// Sign `message` with `private`.
pub fn sign(message: &[u8], private: &RsaPrivateKey) -> Result<Vec<u8>> {
    let digest = Sha256::digest(message);
    private
        .sign_with_rng(&mut OsRng, padding(private), &digest)
        .map_err(|e| PkiError::Signing(e.to_string()))
}

/// Check `signature` over `message` against `public`.
///
/// Any mismatch, including wrong-length or garbage signatures, is `Ok(false)`.
/// Only an empty signature is rejected as malformed input.
pub fn verify(message: &[u8], signature: &[u8], public: &RsaPublicKey) -> Result<bool> {
    if signature.is_empty() {
        return Err(PkiError::MalformedSignature);
    }

    let digest = Sha256::digest(message);
    Ok(public.verify(padding(public), &digest, signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::test_keys::{OTHER, SIGNER};

    #[test]
    fn test_sign_verify_roundtrip() {
        let message = b"3f786850e387550fdab836ed7e6dc881de23001b";
        let signature = sign(message, &SIGNER).unwrap();
        assert_eq!(signature.len(), SIGNER.size());
        assert!(verify(message, &signature, &SIGNER.to_public_key()).unwrap());
    }

    #[test]
    fn test_resigning_differs_but_both_verify() {
        let public = SIGNER.to_public_key();
        let s1 = sign(b"message", &SIGNER).unwrap();
        let s2 = sign(b"message", &SIGNER).unwrap();
        assert_ne!(s1, s2);
        assert!(verify(b"message", &s1, &public).unwrap());
        assert!(verify(b"message", &s2, &public).unwrap());
    }

    #[test]
    fn test_mutated_signature_is_false() {
        let public = SIGNER.to_public_key();
        let signature = sign(b"message", &SIGNER).unwrap();
        for index in [0, signature.len() / 2, signature.len() - 1] {
            let mut mutated = signature.clone();
            mutated[index] ^= 0x01;
            assert!(!verify(b"message", &mutated, &public).unwrap());
        }
    }

    #[test]
    fn test_wrong_message_or_key_is_false() {
        let signature = sign(b"original", &SIGNER).unwrap();
        assert!(!verify(b"tampered", &signature, &SIGNER.to_public_key()).unwrap());
        assert!(!verify(b"original", &signature, &OTHER.to_public_key()).unwrap());
    }

    #[test]
    fn test_malformed_signature_bytes_are_false() {
        let public = SIGNER.to_public_key();
        assert!(!verify(b"message", &[0xAB; 7], &public).unwrap());
        assert!(!verify(b"message", &vec![0xFF; 512], &public).unwrap());
    }

    #[test]
    fn test_empty_signature_is_error() {
        assert!(matches!(
            verify(b"message", &[], &SIGNER.to_public_key()),
            Err(PkiError::MalformedSignature)
        ));
    }

    #[test]
    fn test_max_salt_len() {
        // 1024-bit modulus: emLen = 128, salt = 128 - 32 - 2.
        assert_eq!(max_salt_len(&*SIGNER), 94);
        assert_eq!(max_salt_len(&*OTHER), 222);
    }
}
