/// Deterministic conversions between hex, raw bytes, base-32 and base64.
///
/// Base-32 is the RFC 4648 alphabet that authenticator apps expect. Output is
/// padded; input may be padded or not, in either case.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use data_encoding::{BASE32, BASE32_NOPAD};

use crate::error::{PkiError, Result};

pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>> {
    hex::decode(text.trim()).map_err(|e| PkiError::Encoding(format!("invalid hex: {e}")))
}

pub fn bytes_to_base32(bytes: &[u8]) -> String {
    BASE32.encode(bytes)
}

pub fn base32_to_bytes(text: &str) -> Result<Vec<u8>> {
    let normalized = text.trim().trim_end_matches('=').to_ascii_uppercase();
    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|e| PkiError::Encoding(format!("invalid base32: {e}")))
}

pub fn hex_to_base32(text: &str) -> Result<String> {
    Ok(bytes_to_base32(&hex_to_bytes(text)?))
}

pub fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn base64_decode(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| PkiError::Encoding(format!("invalid base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_base32() {
        let encoded = bytes_to_base32(&[0u8; 32]);
        assert_eq!(encoded, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA====");
        assert_eq!(base32_to_bytes(&encoded).unwrap(), vec![0u8; 32]);
    }

    #[test]
    fn test_base32_accepts_unpadded_lowercase() {
        let decoded = base32_to_bytes("gezdgnbvgy3tqojqgezdgnbvgy3tqojq\n").unwrap();
        assert_eq!(decoded, b"12345678901234567890");
    }

    #[test]
    fn test_hex_to_base32() {
        let hex_seed = "3132333435363738393031323334353637383930";
        assert_eq!(hex_to_base32(hex_seed).unwrap(), "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
    }

    #[test]
    fn test_hex_is_case_insensitive() {
        assert_eq!(hex_to_bytes("ABcd").unwrap(), vec![0xAB, 0xCD]);
        assert_eq!(bytes_to_hex(&[0xAB, 0xCD]), "abcd");
    }

    #[test]
    fn test_invalid_inputs_are_encoding_errors() {
        assert!(matches!(hex_to_bytes("zz"), Err(PkiError::Encoding(_))));
        assert!(matches!(hex_to_bytes("abc"), Err(PkiError::Encoding(_))));
        assert!(matches!(base32_to_bytes("189!"), Err(PkiError::Encoding(_))));
        assert!(matches!(base64_decode("not base64!"), Err(PkiError::Encoding(_))));
    }

    #[test]
    fn test_base64_single_line() {
        let encoded = base64_encode(&[0xFF; 300]);
        assert!(!encoded.contains('\n'));
        assert_eq!(base64_decode(&encoded).unwrap(), vec![0xFF; 300]);
    }
}
