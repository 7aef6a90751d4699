//! Symmetric passphrase wrap for SRR: AES-256-GCM with a
//! passphrase-derived key, Argon2id as the KDF.

use aes_gcm::aead::{Aead, AeadCore, OsRng};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use argon2::password_hash::SaltString;
use argon2::{Argon2, Params};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WrapError {
    #[error("passphrase must be at least 8 characters")]
    PassphraseTooShort,
    #[error("malformed wrapped payload")]
    MalformedPayload,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("key derivation failed")]
    KeyDerivationFailed,
}

fn derive_key(passphrase: &str, salt: &SaltString) -> Result<[u8; KEY_LEN], WrapError> {
    let params = Params::new(19 * 1024, 2, 1, Some(KEY_LEN)).map_err(|_| WrapError::KeyDerivationFailed)?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt.as_str().as_bytes(), &mut key)
        .map_err(|_| WrapError::KeyDerivationFailed)?;
    Ok(key)
}

/// Wraps `plaintext` under `passphrase`. Wire format: base64 of
/// `salt || nonce || ciphertext`, treated by callers as an opaque
/// string.
pub fn wrap(plaintext: &[u8], passphrase: &str) -> Result<String, WrapError> {
    if passphrase.len() < 8 {
        return Err(WrapError::PassphraseTooShort);
    }
    let salt = SaltString::generate(&mut OsRng);
    let key = derive_key(passphrase, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| WrapError::KeyDerivationFailed)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| WrapError::DecryptionFailed)?;

    let salt_str = salt.as_str();
    let mut payload = Vec::with_capacity(1 + salt_str.len() + NONCE_LEN + ciphertext.len());
    payload.push(salt_str.len() as u8);
    payload.extend_from_slice(salt_str.as_bytes());
    payload.extend_from_slice(nonce.as_slice());
    payload.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(payload))
}

/// Unwraps an opaque string produced by [`wrap`], verifying
/// authentication and recovering the plaintext.
pub fn unwrap(opaque: &str, passphrase: &str) -> Result<Vec<u8>, WrapError> {
    if passphrase.len() < 8 {
        return Err(WrapError::PassphraseTooShort);
    }
    let payload = BASE64.decode(opaque).map_err(|_| WrapError::MalformedPayload)?;
    let salt_len = *payload.first().ok_or(WrapError::MalformedPayload)? as usize;
    let rest = payload.get(1..).ok_or(WrapError::MalformedPayload)?;
    if rest.len() < salt_len + NONCE_LEN {
        return Err(WrapError::MalformedPayload);
    }
    let (salt_bytes, rest) = rest.split_at(salt_len);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let salt_str = std::str::from_utf8(salt_bytes).map_err(|_| WrapError::MalformedPayload)?;
    let salt = SaltString::from_b64(salt_str).map_err(|_| WrapError::MalformedPayload)?;
    let key = derive_key(passphrase, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| WrapError::KeyDerivationFailed)?;
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| WrapError::DecryptionFailed)
}

/// Verification contract: `decrypt(wrap(k, k), k) == k`. Used to build
/// `check_passphrase`.
pub fn check_passphrase_matches(check_passphrase: &str, passphrase: &str) -> bool {
    match unwrap(check_passphrase, passphrase) {
        Ok(plain) => plain == passphrase.as_bytes(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let wrapped = wrap(b"hello world", "12345678").unwrap();
        let plain = unwrap(&wrapped, "12345678").unwrap();
        assert_eq!(plain, b"hello world");
    }

    #[test]
    fn wrong_passphrase_fails() {
        let wrapped = wrap(b"hello world", "12345678").unwrap();
        assert!(unwrap(&wrapped, "87654321").is_err());
    }

    #[test]
    fn short_passphrase_rejected_on_wrap_and_unwrap() {
        assert_eq!(wrap(b"x", "short").unwrap_err(), WrapError::PassphraseTooShort);
        assert_eq!(
            unwrap("irrelevant", "short").unwrap_err(),
            WrapError::PassphraseTooShort
        );
    }

    #[test]
    fn check_passphrase_contract() {
        let wrapped = wrap(b"12345678", "12345678").unwrap();
        assert!(check_passphrase_matches(&wrapped, "12345678"));
        assert!(!check_passphrase_matches(&wrapped, "wrongpass"));
    }
}
