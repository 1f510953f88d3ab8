//! CryptoJS/OpenSSL compatible passphrase encryption (`EVP_BytesToKey` with MD5).

use base64::{Engine, prelude::BASE64_STANDARD};
use md5::{Digest, Md5};

use super::crypto;
use crate::error::{ExtractError, Result};

const SALTED_MAGIC: &[u8] = b"Salted__";

/// Decodes base64 and decrypts. The first 8 bytes are skipped without checking for `Salted__`.
pub fn decrypt_base64_aes(password: &[u8], ct_base64: &str) -> Result<String> {
    let text = BASE64_STANDARD
        .decode(ct_base64.trim())
        .map_err(ExtractError::decrypt)?;

    decrypt_aes_no_salt(password, &text)
}

pub fn decrypt_aes_no_salt(password: &[u8], text: &[u8]) -> Result<String> {
    if text.len() < 16 {
        return Err(ExtractError::Decrypt(format!(
            "ciphertext too short: {} bytes",
            text.len()
        )));
    }

    let salt = &text[8..16];
    let ct = &text[16..];

    decrypt_aes(password, salt, ct)
}

pub fn decrypt_aes(password: &[u8], salt: &[u8], ct: &[u8]) -> Result<String> {
    if password.is_empty() {
        return Err(ExtractError::Decrypt("empty passphrase".into()));
    }

    let (key, iv) = derive_key_and_iv(password, salt);

    let pt = crypto::decrypt_aes(&key, &iv, ct)?;

    String::from_utf8(pt).map_err(ExtractError::decrypt)
}

/// Inverse of [`decrypt_base64_aes`], writes the `Salted__` header.
pub fn encrypt_base64_aes(password: &[u8], salt: &[u8; 8], pt: &[u8]) -> Result<String> {
    let (key, iv) = derive_key_and_iv(password, salt);

    let mut out = Vec::with_capacity(16 + pt.len() + 16);
    out.extend_from_slice(SALTED_MAGIC);
    out.extend_from_slice(salt);
    out.extend(crypto::encrypt_aes(&key, &iv, pt)?);

    Ok(BASE64_STANDARD.encode(out))
}

pub fn derive_key_and_iv(password: &[u8], salt: &[u8]) -> (Vec<u8>, Vec<u8>) {
    const KEY_LENGTH: usize = 32;
    const IV_LENGTH: usize = 16;
    const HASH_SIZE: usize = KEY_LENGTH + IV_LENGTH;
    const DIGIT_SIZE: usize = 16;

    let mut hash: [u8; HASH_SIZE] = [0; HASH_SIZE];
    let mut calculated = 0;

    while calculated < HASH_SIZE {
        let mut hasher = Md5::new();
        if calculated > 0 {
            hasher.update(&hash[(calculated - DIGIT_SIZE)..calculated])
        }

        let out = hasher.chain_update(password).chain_update(salt).finalize();

        hash[calculated..(calculated + DIGIT_SIZE)].copy_from_slice(out.as_slice());

        calculated += DIGIT_SIZE;
    }

    (hash[0..KEY_LENGTH].to_vec(), hash[KEY_LENGTH..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "k3yPart1ZqXw9Lm";
    const CT: &str = "U2FsdGVkX1+Bt+st/CfOrnDTRGFXxwl1UoU1P1fbAR9efGnubLCna7y4RZ6emo9HDqOtdKcXeinqC+MGCfOnydJzEWYseOWc2oiFXsd9eGaRooqVGmG29mB16s+xGpM1";
    const PT: &str = r#"[{"file":"https://mc.example.com/hls/ep1/master.m3u8","type":"hls"}]"#;

    #[test]
    fn should_derive_key_and_iv() {
        const PASSWORD: &[u8] = b"6iDurMc2lRAyGUEHPIIt";
        const SALT: &[u8] = &[129, 183, 235, 45, 252, 39, 206, 174];
        const RESULT_KEY: &[u8] = &[
            120, 45, 195, 34, 78, 14, 231, 234, 67, 192, 62, 118, 235, 45, 97, 233, 50, 86, 206,
            75, 148, 31, 180, 1, 72, 43, 144, 123, 82, 233, 193, 178,
        ];
        const RESULT_IV: &[u8] = &[
            62, 204, 205, 162, 189, 145, 136, 18, 170, 229, 108, 237, 29, 86, 47, 51,
        ];

        let (key, iv) = derive_key_and_iv(PASSWORD, SALT);

        assert_eq!(RESULT_KEY, key);
        assert_eq!(RESULT_IV, iv);
    }

    #[test]
    fn should_derive_same_material_twice() {
        let salt = [1, 2, 3, 4, 5, 6, 7, 8];

        let first = derive_key_and_iv(b"secret", &salt);
        let second = derive_key_and_iv(b"secret", &salt);

        assert_eq!(first, second);
        assert_eq!(48, first.0.len() + first.1.len());
    }

    #[test]
    fn should_decrypt_salted_payload() {
        let res = decrypt_base64_aes(PASSWORD.as_bytes(), CT).unwrap();
        assert_eq!(PT, res);
    }

    #[test]
    fn should_fail_with_wrong_password() {
        let res = decrypt_base64_aes(b"wrong-password", CT);
        assert!(matches!(res, Err(ExtractError::Decrypt(_))));
    }

    #[test]
    fn should_fail_with_empty_password() {
        let res = decrypt_base64_aes(b"", CT);
        assert!(matches!(res, Err(ExtractError::Decrypt(_))));
    }

    #[test]
    fn should_fail_on_short_ciphertext() {
        let res = decrypt_base64_aes(PASSWORD.as_bytes(), "U2FsdGVk");
        assert!(matches!(res, Err(ExtractError::Decrypt(_))));
    }

    #[test]
    fn should_encrypt_what_it_decrypts() {
        let salt = [0x81, 0xb7, 0xeb, 0x2d, 0xfc, 0x27, 0xce, 0xae];

        let ct = encrypt_base64_aes(PASSWORD.as_bytes(), &salt, PT.as_bytes()).unwrap();

        assert_eq!(CT, ct);
        assert!(ct.starts_with("U2FsdGVkX1"));
    }
}
