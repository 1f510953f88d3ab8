use base64::{Engine, prelude::BASE64_STANDARD};
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding};

use crate::error::{ExtractError, Result};

type AesCbcDec = cbc::Decryptor<aes::Aes256>;
type AesCbcEnc = cbc::Encryptor<aes::Aes256>;

pub fn decrypt_base64_aes(key: &[u8], iv: &[u8], ct_base64: &[u8]) -> Result<Vec<u8>> {
    let ct = BASE64_STANDARD
        .decode(ct_base64)
        .map_err(ExtractError::decrypt)?;
    decrypt_aes(key, iv, &ct)
}

/// AES-256-CBC with a fixed key and IV, base64 in, UTF-8 out.
pub fn decrypt_base64_aes_to_string(key: &[u8], iv: &[u8], ct_base64: &[u8]) -> Result<String> {
    let pt = decrypt_base64_aes(key, iv, ct_base64)?;
    String::from_utf8(pt).map_err(ExtractError::decrypt)
}

pub fn decrypt_aes(key: &[u8], iv: &[u8], ct: &[u8]) -> Result<Vec<u8>> {
    let cipher = AesCbcDec::new_from_slices(key, iv).map_err(ExtractError::decrypt)?;

    let pt = cipher
        .decrypt_padded_vec_mut::<block_padding::Pkcs7>(ct)
        .map_err(ExtractError::decrypt)?;

    Ok(pt)
}

pub fn encrypt_aes(key: &[u8], iv: &[u8], pt: &[u8]) -> Result<Vec<u8>> {
    let cipher = AesCbcEnc::new_from_slices(key, iv).map_err(ExtractError::decrypt)?;

    let ct = cipher.encrypt_padded_vec_mut::<block_padding::Pkcs7>(pt);

    Ok(ct)
}

pub fn encrypt_base64_aes(key: &[u8], iv: &[u8], pt: &[u8]) -> Result<String> {
    let ct = encrypt_aes(key, iv, pt)?;
    Ok(BASE64_STANDARD.encode(ct))
}
