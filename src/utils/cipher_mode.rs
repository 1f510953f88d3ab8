use super::{crypto, crypto_js};
use crate::error::Result;

/// How a provider's ciphertext is turned back into plaintext.
#[derive(Debug, Clone, Copy)]
pub enum CipherMode<'a> {
    /// AES-256-CBC with key and IV owned by the extractor config.
    ExplicitKeyIv { key: &'a [u8], iv: &'a [u8] },
    /// OpenSSL `EVP_BytesToKey`, salt taken from bytes 8..16 of the ciphertext.
    PasswordDerived { password: &'a [u8] },
}

impl CipherMode<'_> {
    pub fn decrypt(&self, ct_base64: &str) -> Result<String> {
        match self {
            CipherMode::ExplicitKeyIv { key, iv } => {
                crypto::decrypt_base64_aes_to_string(key, iv, ct_base64.trim().as_bytes())
            }
            CipherMode::PasswordDerived { password } => {
                crypto_js::decrypt_base64_aes(password, ct_base64)
            }
        }
    }
}
