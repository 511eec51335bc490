/// Wrappers for secret material that is automatically zeroized on drop.
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 32-byte sensitive value that is zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SensitiveBytes32([u8; 32]);

impl SensitiveBytes32 {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != 32 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Some(Self(bytes))
    }
}

impl AsRef<[u8]> for SensitiveBytes32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SensitiveBytes32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SensitiveBytes32(..)")
    }
}

/// A variable-length sensitive buffer that is zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SensitiveVec(Vec<u8>);

impl SensitiveVec {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SensitiveVec {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SensitiveVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SensitiveVec({} bytes)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_bytes32_from_slice() {
        assert!(SensitiveBytes32::from_slice(&[0u8; 32]).is_some());
        assert!(SensitiveBytes32::from_slice(&[0u8; 31]).is_none());
        assert!(SensitiveBytes32::from_slice(&[0u8; 33]).is_none());
    }

    #[test]
    fn test_debug_does_not_leak() {
        let key = SensitiveBytes32::new([0xAA; 32]);
        assert!(!format!("{key:?}").contains("170"));
        let v = SensitiveVec::new(b"secret".to_vec());
        assert_eq!(format!("{v:?}"), "SensitiveVec(6 bytes)");
    }

    #[test]
    fn test_sensitive_vec() {
        let v = SensitiveVec::new(vec![1, 2, 3]);
        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
        assert_eq!(v.as_bytes(), &[1, 2, 3]);
    }
}
