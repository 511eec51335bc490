/// Cryptographic building blocks.
///
/// - `encoding`: hex / base-32 / base64 conversions
/// - `envelope`: RSA-OAEP (SHA-256) wrap and unwrap
/// - `sign`: RSA-PSS (SHA-256, max salt) signatures
/// - `totp`: RFC 6238 code generation and verification
/// - `keys`: PEM key loading
pub mod encoding;
pub mod envelope;
pub mod keys;
pub mod sensitive;
pub mod sign;
pub mod totp;
