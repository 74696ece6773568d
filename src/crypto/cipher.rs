//! AES-256-CBC content encryption with PKCS#7 padding.
//!
//! `encrypt` draws a fresh key and IV per call and prepends the IV to the
//! ciphertext. There is no authentication tag: decrypting with the wrong key
//! can fail on padding or can return garbage. Content integrity is the
//! caller's concern.

use aes::Aes256;
use aes::cipher::{
    BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7, generic_array::GenericArray,
};
use rand::{RngCore, rngs::OsRng};
use thiserror::Error;
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("malformed ciphertext or key: {0}")]
    Malformed(String),
}

pub type CipherResult<T> = Result<T, CipherError>;

/// Output of [`encrypt`]: `IV || ciphertext` and the key that opens it.
/// The key is wiped when dropped.
pub struct EncryptedContent {
    pub ciphertext: Vec<u8>,
    pub key: Zeroizing<[u8; KEY_LEN]>,
}

impl std::fmt::Debug for EncryptedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedContent")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("key", &"<redacted>")
            .finish()
    }
}

pub fn encrypt(plaintext: &[u8]) -> EncryptedContent {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(key.as_mut_slice());
    OsRng.fill_bytes(&mut iv);

    let body = Encryptor::new(GenericArray::from_slice(key.as_slice()), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut ciphertext = Vec::with_capacity(IV_LEN + body.len());
    ciphertext.extend_from_slice(&iv);
    ciphertext.extend_from_slice(&body);
    EncryptedContent { ciphertext, key }
}

pub fn decrypt(ciphertext: &[u8], key: &[u8]) -> CipherResult<Vec<u8>> {
    if ciphertext.len() < IV_LEN {
        return Err(CipherError::Malformed(format!(
            "ciphertext of {} bytes is shorter than the IV",
            ciphertext.len()
        )));
    }
    let (iv, body) = ciphertext.split_at(IV_LEN);
    let decryptor = Decryptor::new_from_slices(key, iv).map_err(|_| {
        CipherError::Malformed(format!("key must be {KEY_LEN} bytes, got {}", key.len()))
    })?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(body)
        .map_err(|_| CipherError::Malformed("padding check failed".into()))
}
