/// Field-level encryption for contractor bank details
///
/// BSB and account numbers are stored as `base64(nonce || ciphertext)` using
/// AES-256-GCM with a fresh 96-bit nonce per value. The 32-byte key comes from
/// configuration as 64 hex characters.
///
/// # Example
///
/// ```
/// use docketly_shared::crypto::{mask, FieldCipher};
///
/// let cipher = FieldCipher::from_hex_key(&"11".repeat(32)).unwrap();
/// let stored = cipher.encrypt("12345678").unwrap();
/// assert_ne!(stored, "12345678");
/// assert_eq!(cipher.decrypt(&stored).unwrap(), "12345678");
/// assert_eq!(mask("12345678"), "•••678");
/// ```
///
/// # Errors
///
/// Decryption never falls back to an empty string: a wrong key, a truncated
/// value or a tampered ciphertext all surface as [`CryptoError`].

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

/// AES-GCM nonce length in bytes
const NONCE_LEN: usize = 12;

/// Key length in bytes
pub const KEY_LEN: usize = 32;

/// Cipher errors
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Key is not 64 hex characters
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    /// Stored value is not valid base64 or is too short to hold a nonce
    #[error("Malformed ciphertext")]
    Malformed,

    /// Authentication tag check failed
    #[error("Decryption failed")]
    Decrypt,

    /// Encryption failed
    #[error("Encryption failed")]
    Encrypt,

    /// Decrypted bytes are not UTF-8
    #[error("Decrypted value is not valid UTF-8")]
    Utf8,
}

/// AES-256-GCM cipher for individual column values
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCipher(..)")
    }
}

impl FieldCipher {
    /// Creates a cipher from raw key bytes
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Creates a cipher from a 64-character hex key
    pub fn from_hex_key(hex_key: &str) -> Result<Self, CryptoError> {
        let key = hex::decode(hex_key.trim())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Self::new(&key)
    }

    /// Encrypts `plaintext` into its stored representation
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut stored = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        stored.extend_from_slice(&nonce_bytes);
        stored.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(stored))
    }

    /// Decrypts a stored value
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let stored = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CryptoError::Malformed)?;

        if stored.len() <= NONCE_LEN {
            return Err(CryptoError::Malformed);
        }

        let (nonce_bytes, ciphertext) = stored.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8)
    }

    /// Encrypts an optional value, passing `None` through
    pub fn encrypt_opt(&self, plaintext: Option<&str>) -> Result<Option<String>, CryptoError> {
        plaintext.map(|p| self.encrypt(p)).transpose()
    }

    /// Decrypts an optional value, passing `None` through
    pub fn decrypt_opt(&self, encoded: Option<&str>) -> Result<Option<String>, CryptoError> {
        encoded.map(|e| self.decrypt(e)).transpose()
    }
}

/// Masks a value, keeping only its last three characters
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let keep = chars.len().min(3);
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("•••{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::from_hex_key(&"ab".repeat(32)).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let cipher = cipher();
        let stored = cipher.encrypt("062-000").unwrap();
        assert_eq!(cipher.decrypt(&stored).unwrap(), "062-000");
    }

    #[test]
    fn test_nonce_is_fresh_per_value() {
        let cipher = cipher();
        let a = cipher.encrypt("12345678").unwrap();
        let b = cipher.encrypt("12345678").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_ciphertext_is_rejected() {
        let cipher = cipher();
        let stored = cipher.encrypt("12345678").unwrap();
        let mut bytes = STANDARD.decode(&stored).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = STANDARD.encode(bytes);

        assert!(matches!(cipher.decrypt(&tampered), Err(CryptoError::Decrypt)));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let stored = cipher().encrypt("12345678").unwrap();
        let other = FieldCipher::from_hex_key(&"cd".repeat(32)).unwrap();
        assert!(matches!(other.decrypt(&stored), Err(CryptoError::Decrypt)));
    }

    #[test]
    fn test_malformed_values() {
        let cipher = cipher();
        assert!(matches!(cipher.decrypt("not base64!!"), Err(CryptoError::Malformed)));
        assert!(matches!(cipher.decrypt("AAAA"), Err(CryptoError::Malformed)));
    }

    #[test]
    fn test_invalid_keys() {
        assert!(matches!(FieldCipher::from_hex_key("abcd"), Err(CryptoError::InvalidKey(_))));
        assert!(matches!(
            FieldCipher::from_hex_key(&"zz".repeat(32)),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_optional_helpers() {
        let cipher = cipher();
        assert_eq!(cipher.encrypt_opt(None).unwrap(), None);
        let stored = cipher.encrypt_opt(Some("999")).unwrap();
        assert_eq!(cipher.decrypt_opt(stored.as_deref()).unwrap().as_deref(), Some("999"));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("12345678"), "•••678");
        assert_eq!(mask("062-000"), "•••000");
        assert_eq!(mask("12"), "•••12");
        assert_eq!(mask(""), "•••");
    }
}
