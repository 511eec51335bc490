/// Commit attestation: sign-then-encrypt.
///
/// The commit id is signed with the holder's private key (RSA-PSS), then the
/// signature is sealed for one recipient (RSA-OAEP) and base64-encoded.
/// Only the recipient can read the signature, and once read it proves who
/// approved the commit. Encrypting first and signing the ciphertext would let
/// any observer verify that the holder signed something, so the order is fixed.
///
/// Attestations carry no nonce or timestamp. A captured attestation for a
/// commit can be replayed for that same commit.
use std::str::FromStr;

use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crypto::{encoding, envelope, sign};
use crate::error::{PkiError, Result};

/// Length of a full SHA-1 git object id in hex.
pub const COMMIT_ID_LEN: usize = 40;

/// A validated 40-character hex commit id, kept exactly as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitId(String);

impl CommitId {
    pub fn parse(text: &str) -> Result<Self> {
        if text.len() != COMMIT_ID_LEN || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PkiError::InvalidCommitId);
        }
        Ok(Self(text.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CommitId {
    type Err = PkiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Output of [`produce`]: the commit id and the sealed signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub commit_id: String,
    /// Base64 of the RSA-OAEP ciphertext of the RSA-PSS signature.
    pub encrypted_signature: String,
}

/// Sign `commit_id` with `signer` and seal the signature for `recipient`.
pub fn produce(
    commit_id: &str,
    signer: &RsaPrivateKey,
    recipient: &RsaPublicKey,
) -> Result<Attestation> {
    let commit = CommitId::parse(commit_id)?;

    // The signature is as long as the signer's modulus; it must fit the envelope.
    let signature_len = signer.size();
    let max = envelope::max_plaintext_len(recipient);
    if signature_len > max {
        return Err(PkiError::PlaintextTooLong {
            len: signature_len,
            max,
        });
    }

    let signature = sign::sign(commit.as_str().as_bytes(), signer)?;
    let sealed = envelope::wrap(&signature, recipient)?;

    info!(commit = commit.as_str(), "attestation produced");
    Ok(Attestation {
        commit_id: commit.0,
        encrypted_signature: encoding::base64_encode(&sealed),
    })
}

/// Recipient side: unseal the signature and check it against the commit id.
pub fn open(
    attestation: &Attestation,
    recipient: &RsaPrivateKey,
    signer: &RsaPublicKey,
) -> Result<bool> {
    let commit = CommitId::parse(&attestation.commit_id)?;
    let sealed = encoding::base64_decode(&attestation.encrypted_signature)
        .map_err(|_| PkiError::DecryptionFailed)?;
    let signature = envelope::unwrap(&sealed, recipient)?;
    sign::verify(commit.as_str().as_bytes(), signature.as_bytes(), signer)
}
