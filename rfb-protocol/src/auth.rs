//! VNC Authentication (security type 2).
//!
//! The server sends a random 16-byte challenge; the client encrypts it
//! with DES using the password as key and returns the result. Two quirks
//! are part of the scheme:
//!
//! - the password is truncated or zero-padded to exactly 8 bytes, and
//! - each key byte's bits are reversed (LSB becomes MSB) before the key
//!   schedule, a mistake in the original VNC implementation that every
//!   compatible client has reproduced since.
//!
//! The cipher itself comes from the RustCrypto `des` crate; only the VNC
//! framing lives here.

use crate::error::ProtocolError;
use des::cipher::generic_array::GenericArray;
use des::cipher::{BlockEncrypt, KeyInit};
use des::Des;

/// Encrypt a 16-byte challenge with `password`, VNC style.
///
/// The two 8-byte halves are enciphered independently (ECB). Fails with
/// [`ProtocolError::EmptyPassword`] when the password is empty, since an
/// all-zero key would make the exchange meaningless.
pub fn encrypt_challenge(
    challenge: &[u8; 16],
    password: &str,
) -> Result<[u8; 16], ProtocolError> {
    if password.is_empty() {
        return Err(ProtocolError::EmptyPassword);
    }

    let mut key = [0u8; 8];
    for (slot, &byte) in key.iter_mut().zip(password.as_bytes().iter().take(8)) {
        *slot = byte.reverse_bits();
    }

    let cipher = Des::new(&key.into());

    let mut response = [0u8; 16];
    for (out, half) in response.chunks_exact_mut(8).zip(challenge.chunks_exact(8)) {
        let mut block = *GenericArray::from_slice(half);
        cipher.encrypt_block(&mut block);
        out.copy_from_slice(&block);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_password_rejected() {
        assert!(matches!(
            encrypt_challenge(&[0u8; 16], ""),
            Err(ProtocolError::EmptyPassword)
        ));
    }

    #[test]
    fn response_is_deterministic() {
        let challenge = [0u8; 16];
        let a = encrypt_challenge(&challenge, "12345678").unwrap();
        let b = encrypt_challenge(&challenge, "12345678").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, [0u8; 16]);
    }

    #[test]
    fn identical_halves_encrypt_identically() {
        // ECB: equal plaintext blocks give equal ciphertext blocks, so an
        // all-zero challenge must produce two identical halves.
        let response = encrypt_challenge(&[0u8; 16], "12345678").unwrap();
        assert_eq!(response[..8], response[8..]);
    }

    #[test]
    fn different_halves_encrypt_differently() {
        let mut challenge = [0u8; 16];
        challenge[8] = 1;
        let response = encrypt_challenge(&challenge, "12345678").unwrap();
        assert_ne!(response[..8], response[8..]);
    }

    #[test]
    fn password_truncated_to_eight_bytes() {
        let challenge = [0x5Au8; 16];
        let short = encrypt_challenge(&challenge, "12345678").unwrap();
        let long = encrypt_challenge(&challenge, "12345678IGNORED").unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn short_password_zero_padded() {
        let challenge = [0x5Au8; 16];
        let a = encrypt_challenge(&challenge, "pw").unwrap();
        let b = encrypt_challenge(&challenge, "pw\0\0").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn key_bits_matter() {
        // "a" (0x61) and its bit-reversal (0x86) are different keys; if
        // the reversal were missing these would collide for palindromic
        // bytes only.
        let challenge = [0x11u8; 16];
        let a = encrypt_challenge(&challenge, "a").unwrap();
        let b = encrypt_challenge(&challenge, "b").unwrap();
        assert_ne!(a, b);
    }
}
