//! AES-128-ECB preprocessing for encrypted map files.
//!
//! The key is a raw byte string copied into a 16-byte key block and
//! right-padded with zeros. Blocks are processed independently with no
//! padding scheme; a trailing partial block is dropped from the output.

#[allow(deprecated)]
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use bytes::Bytes;
use std::fmt;
use tracing::debug;

use crate::error::{Error, Result};

/// Size of the cipher key block
pub const KEY_BLOCK_LEN: usize = 16;

/// Size of one cipher block
pub const BLOCK_LEN: usize = 16;

/// Copy `key` into a zero-padded key block.
pub fn key_block(key: &[u8]) -> Result<[u8; KEY_BLOCK_LEN]> {
    if key.len() > KEY_BLOCK_LEN {
        return Err(Error::key_too_long(key.len(), KEY_BLOCK_LEN));
    }

    let mut block = [0u8; KEY_BLOCK_LEN];
    block[..key.len()].copy_from_slice(key);
    Ok(block)
}

/// AES-128 in ECB mode with a fixed key
#[derive(Clone)]
pub struct EcbCipher {
    cipher: Aes128,
}

impl fmt::Debug for EcbCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcbCipher").finish_non_exhaustive()
    }
}

impl EcbCipher {
    /// Build a cipher from raw key bytes (at most [`KEY_BLOCK_LEN`]).
    pub fn new(key: &[u8]) -> Result<Self> {
        let key = key_block(key)?;
        #[allow(deprecated)]
        let cipher = Aes128::new(GenericArray::from_slice(&key));
        Ok(Self { cipher })
    }

    /// Decrypt every whole block of `data` into a new buffer.
    pub fn decrypt(&self, data: &[u8]) -> Bytes {
        let mut out = whole_blocks(data);
        for chunk in out.chunks_exact_mut(BLOCK_LEN) {
            #[allow(deprecated)]
            self.cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
        }
        debug!("Decrypted {} of {} bytes", out.len(), data.len());
        Bytes::from(out)
    }

    /// Encrypt every whole block of `data` into a new buffer.
    pub fn encrypt(&self, data: &[u8]) -> Bytes {
        let mut out = whole_blocks(data);
        for chunk in out.chunks_exact_mut(BLOCK_LEN) {
            #[allow(deprecated)]
            self.cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        }
        Bytes::from(out)
    }
}

fn whole_blocks(data: &[u8]) -> Vec<u8> {
    let whole = data.len() - data.len() % BLOCK_LEN;
    data[..whole].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_block_padding() {
        let block = key_block(b"abc").unwrap();
        assert_eq!(&block[..3], b"abc");
        assert_eq!(&block[3..], &[0u8; 13]);

        assert_eq!(key_block(&[0x11; 16]).unwrap(), [0x11; 16]);
        assert_eq!(key_block(b"").unwrap(), [0u8; 16]);
    }

    #[test]
    fn test_key_too_long() {
        let err = EcbCipher::new(&[0u8; 17]).unwrap_err();
        assert!(matches!(err, Error::KeyTooLong { len: 17, max: 16 }));
    }

    #[test]
    fn test_known_answer() {
        // FIPS-197 appendix C.1
        let key: Vec<u8> = (0u8..16).collect();
        let plaintext = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ];
        let ciphertext = [
            0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4,
            0xc5, 0x5a,
        ];

        let cipher = EcbCipher::new(&key).unwrap();
        assert_eq!(&cipher.encrypt(&plaintext)[..], &ciphertext[..]);
        assert_eq!(&cipher.decrypt(&ciphertext)[..], &plaintext[..]);
    }

    #[test]
    fn test_roundtrip() {
        let cipher = EcbCipher::new(b"pdl-map-key").unwrap();
        let plaintext: Vec<u8> = (0..96u32).map(|i| (i * 7 % 251) as u8).collect();

        let encrypted = cipher.encrypt(&plaintext);
        assert_ne!(&encrypted[..], &plaintext[..]);
        assert_eq!(&cipher.decrypt(&encrypted)[..], &plaintext[..]);
    }

    #[test]
    fn test_blocks_are_independent() {
        let cipher = EcbCipher::new(b"k").unwrap();
        let encrypted = cipher.encrypt(&[0x42; 32]);
        assert_eq!(&encrypted[..16], &encrypted[16..]);
    }

    #[test]
    fn test_partial_block_not_emitted() {
        let cipher = EcbCipher::new(b"key").unwrap();
        assert_eq!(cipher.decrypt(&[0u8; 20]).len(), 16);
        assert!(cipher.decrypt(&[0u8; 15]).is_empty());
        assert!(cipher.decrypt(&[]).is_empty());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let cipher = EcbCipher::new(b"key").unwrap();
        let input = vec![0x5A; 32];
        let _ = cipher.decrypt(&input);
        assert_eq!(input, vec![0x5A; 32]);
    }
}
