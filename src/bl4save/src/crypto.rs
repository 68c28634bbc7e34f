//! Borderlands 4 save container encryption and decryption
//!
//! Container layout:
//!
//! ```text
//! AES-256-ECB( pkcs7_16( zlib(document) ++ LE32(adler32(document)) ++ LE32(len(document)) ) )
//! ```
//!
//! The AES key is a fixed base key with its first 8 bytes XORed by the
//! account identifier. That makes the container obfuscated, not protected:
//! anyone holding the identifier can decrypt it.

#[allow(deprecated)]
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

/// AES block size; every container is a whole number of these
pub const BLOCK_SIZE: usize = 16;

/// Checksum (4 bytes) + uncompressed length (4 bytes)
pub const FOOTER_LEN: usize = 8;

/// Base encryption key used for all Borderlands 4 save files.
///
/// This is a compatibility constant shipped by the game, not a secret. It must
/// be reproduced bit-for-bit or existing saves will not open.
pub const BASE_KEY: [u8; 32] = [
    0x35, 0xEC, 0x33, 0x77, 0xF3, 0x5D, 0xB0, 0xEA, 0xBE, 0x6B, 0x83, 0x11, 0x54, 0x03, 0xEB, 0xFB,
    0x27, 0x25, 0x64, 0x2E, 0xD5, 0x49, 0x06, 0x29, 0x05, 0x78, 0xBD, 0x60, 0xBA, 0x4A, 0xA7, 0x87,
];

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Save file size {0} is not a multiple of 16 bytes")]
    InvalidSize(usize),

    #[error("Failed to (de)compress save data: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Decrypted payload is {0} bytes, too short to hold the checksum footer")]
    TruncatedPayload(usize),

    #[error("Invalid padding in encrypted data")]
    InvalidPadding,

    #[error("Footer checksum {expected:#010x} does not match document checksum {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Footer length {expected} does not match document length {actual}")]
    LengthMismatch { expected: u32, actual: u32 },
}

/// How strictly the checksum footer is verified on decrypt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FooterCheck {
    /// Strip the footer without checking it. Some captured saves carry
    /// footers that don't match their contents and the game still loads them.
    #[default]
    Permissive,
    /// Reject documents whose Adler-32 or length disagree with the footer
    Strict,
}

/// Options for [`decrypt_sav_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    pub footer: FooterCheck,
}

impl ContainerOptions {
    pub fn strict() -> Self {
        Self {
            footer: FooterCheck::Strict,
        }
    }
}

/// Trailing metadata appended after the compressed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub checksum: u32,
    pub length: u32,
}

impl Footer {
    /// Compute the footer describing an uncompressed document
    pub fn for_document(document: &[u8]) -> Self {
        Self {
            checksum: adler32(document),
            length: document.len() as u32,
        }
    }

    pub fn to_bytes(self) -> [u8; FOOTER_LEN] {
        let mut out = [0u8; FOOTER_LEN];
        out[..4].copy_from_slice(&self.checksum.to_le_bytes());
        out[4..].copy_from_slice(&self.length.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; FOOTER_LEN]) -> Self {
        Self {
            checksum: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// Standard Adler-32 (`b << 16 | a`, both sums mod 65521)
pub fn adler32(data: &[u8]) -> u32 {
    adler::adler32_slice(data)
}

/// Apply PKCS7 padding to data.
///
/// Always adds at least one byte: aligned input gains a full block of `block_size`.
pub fn pkcs7_pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let padding_len = block_size - (data.len() % block_size);
    let mut padded = data.to_vec();
    padded.resize(data.len() + padding_len, padding_len as u8);
    padded
}

/// Remove PKCS7 padding from data
pub fn pkcs7_unpad(data: &[u8]) -> Result<&[u8], CryptoError> {
    let Some(&last) = data.last() else {
        return Err(CryptoError::InvalidPadding);
    };
    let padding_len = last as usize;

    if padding_len == 0 || padding_len > data.len() {
        return Err(CryptoError::InvalidPadding);
    }

    let (body, padding) = data.split_at(data.len() - padding_len);
    if padding.iter().any(|&byte| byte != last) {
        return Err(CryptoError::InvalidPadding);
    }

    Ok(body)
}

/// Derive an AES-256 key from a Steam ID
///
/// Non-digit characters are stripped and the remaining digits are read as an
/// unsigned integer, keeping its low 64 bits. Those bits, little-endian, are
/// XORed into the first 8 bytes of [`BASE_KEY`]. No digits means zero.
pub fn derive_key(steam_id: &str) -> [u8; 32] {
    // Wrapping arithmetic keeps exactly the low 64 bits of an arbitrarily long id
    let steam_id_num = steam_id
        .bytes()
        .filter(u8::is_ascii_digit)
        .fold(0u64, |acc, digit| {
            acc.wrapping_mul(10).wrapping_add(u64::from(digit - b'0'))
        });

    let mut key = BASE_KEY;
    for (byte, id_byte) in key.iter_mut().zip(steam_id_num.to_le_bytes()) {
        *byte ^= id_byte;
    }

    key
}

#[allow(deprecated)]
fn cipher_for(key: &[u8; 32]) -> Aes256 {
    Aes256::new(GenericArray::from_slice(key))
}

/// Encrypt whole 16-byte blocks in place with AES-256-ECB. Caller pads.
pub fn encrypt_blocks(key: &[u8; 32], data: &mut [u8]) -> Result<(), CryptoError> {
    if data.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidSize(data.len()));
    }

    let cipher = cipher_for(key);
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        #[allow(deprecated)]
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
    }

    Ok(())
}

/// Decrypt whole 16-byte blocks in place with AES-256-ECB
pub fn decrypt_blocks(key: &[u8; 32], data: &mut [u8]) -> Result<(), CryptoError> {
    if data.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidSize(data.len()));
    }

    let cipher = cipher_for(key);
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        #[allow(deprecated)]
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
    }

    Ok(())
}

/// zlib-compress at maximum level
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inflate a zlib stream
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Decrypt a .sav file to YAML bytes, ignoring footer mismatches
pub fn decrypt_sav(encrypted_data: &[u8], steam_id: &str) -> Result<Vec<u8>, CryptoError> {
    decrypt_sav_with(encrypted_data, steam_id, &ContainerOptions::default())
}

/// Decrypt a .sav file to YAML bytes
///
/// # Format
/// - Input: AES-256-ECB encrypted, PKCS7 padded (padding is optional)
/// - After decryption: zlib stream followed by an 8-byte [`Footer`]
pub fn decrypt_sav_with(
    encrypted_data: &[u8],
    steam_id: &str,
    options: &ContainerOptions,
) -> Result<Vec<u8>, CryptoError> {
    if encrypted_data.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidSize(encrypted_data.len()));
    }

    let key = derive_key(steam_id);
    let mut decrypted = encrypted_data.to_vec();
    decrypt_blocks(&key, &mut decrypted)?;

    // Some producers omit padding; a wrong key also lands here
    let body = match pkcs7_unpad(&decrypted) {
        Ok(body) => body,
        Err(_) => {
            debug!("padding invalid, using {} raw decrypted bytes", decrypted.len());
            &decrypted[..]
        }
    };

    if body.len() < FOOTER_LEN {
        return Err(CryptoError::TruncatedPayload(body.len()));
    }
    let (compressed, footer_bytes) = body.split_at(body.len() - FOOTER_LEN);
    let mut raw_footer = [0u8; FOOTER_LEN];
    raw_footer.copy_from_slice(footer_bytes);
    let footer = Footer::from_bytes(raw_footer);

    let yaml_data = decompress(compressed)?;
    verify_footer(footer, &yaml_data, options.footer)?;

    Ok(yaml_data)
}

fn verify_footer(footer: Footer, document: &[u8], mode: FooterCheck) -> Result<(), CryptoError> {
    let actual = Footer::for_document(document);
    if footer == actual {
        return Ok(());
    }

    match mode {
        FooterCheck::Permissive => {
            debug!(
                "footer mismatch ignored: stored {:?}, computed {:?}",
                footer, actual
            );
            Ok(())
        }
        FooterCheck::Strict if footer.checksum != actual.checksum => {
            Err(CryptoError::ChecksumMismatch {
                expected: footer.checksum,
                actual: actual.checksum,
            })
        }
        FooterCheck::Strict => Err(CryptoError::LengthMismatch {
            expected: footer.length,
            actual: actual.length,
        }),
    }
}

/// Encrypt YAML bytes to a .sav file
///
/// # Format
/// - Compresses YAML with zlib (level 9)
/// - Appends Adler-32 and uncompressed length, both little-endian
/// - Pads with PKCS7 to 16-byte blocks
/// - Encrypts with AES-256-ECB
pub fn encrypt_sav(yaml_data: &[u8], steam_id: &str) -> Result<Vec<u8>, CryptoError> {
    let mut packet = compress(yaml_data)?;
    packet.extend_from_slice(&Footer::for_document(yaml_data).to_bytes());

    let mut encrypted = pkcs7_pad(&packet, BLOCK_SIZE);

    let key = derive_key(steam_id);
    encrypt_blocks(&key, &mut encrypted)?;

    Ok(encrypted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEAM_ID: &str = "76561197960521364";

    #[test]
    fn test_derive_key() {
        let key = derive_key(STEAM_ID);

        // First 8 bytes should be XORed with Steam ID
        assert_ne!(key[0..8], BASE_KEY[0..8]);
        // Remaining bytes should be unchanged
        assert_eq!(key[8..], BASE_KEY[8..]);
    }

    #[test]
    fn test_derive_key_known_vector() {
        let key = derive_key("76561199131094380");
        assert_eq!(
            hex::encode(key),
            "5981fa32f25da0ebbe6b83115403ebfb2725642ed54906290578bd60ba4aa787"
        );
    }

    #[test]
    fn test_derive_key_strips_non_digits() {
        assert_eq!(
            derive_key("STEAM_76561197960521364"),
            derive_key("76561197960521364")
        );
        assert_eq!(derive_key("7656-1197-9605-21364"), derive_key(STEAM_ID));
    }

    #[test]
    fn test_derive_key_without_digits_is_base_key() {
        assert_eq!(derive_key(""), BASE_KEY);
        assert_eq!(derive_key("no digits here"), BASE_KEY);
    }

    #[test]
    fn test_derive_key_keeps_low_64_bits() {
        // 2^64 + 5 folds to 5
        assert_eq!(derive_key("18446744073709551621"), derive_key("5"));
    }

    #[test]
    fn test_adler32_reference() {
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
        assert_eq!(adler32(b""), 1);
    }

    #[test]
    fn test_pad_always_adds_bytes() {
        let padded = pkcs7_pad(&[0u8; 16], 16);
        assert_eq!(padded.len(), 32);
        assert!(padded[16..].iter().all(|&b| b == 16));

        let padded = pkcs7_pad(&[1, 2, 3], 16);
        assert_eq!(padded.len(), 16);
        assert_eq!(padded[15], 13);
    }

    #[test]
    fn test_unpad_validates_every_byte() {
        let mut padded = pkcs7_pad(b"hello", 16);
        assert_eq!(pkcs7_unpad(&padded).unwrap(), b"hello");

        padded[10] ^= 0xFF;
        assert!(matches!(
            pkcs7_unpad(&padded),
            Err(CryptoError::InvalidPadding)
        ));
        assert!(pkcs7_unpad(&[]).is_err());
        assert!(pkcs7_unpad(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_block_cipher_rejects_partial_blocks() {
        let key = derive_key(STEAM_ID);
        let mut data = vec![0u8; 15];
        assert!(matches!(
            encrypt_blocks(&key, &mut data),
            Err(CryptoError::InvalidSize(15))
        ));
    }

    #[test]
    fn test_block_cipher_is_ecb() {
        let key = derive_key(STEAM_ID);
        let mut data = [7u8; 32];
        encrypt_blocks(&key, &mut data).unwrap();
        // Identical plaintext blocks encrypt identically without chaining
        assert_eq!(data[..16], data[16..]);
        decrypt_blocks(&key, &mut data).unwrap();
        assert_eq!(data, [7u8; 32]);
    }

    #[test]
    fn test_roundtrip() {
        let original_yaml = b"test: value\nfoo: bar\n";

        let encrypted = encrypt_sav(original_yaml, STEAM_ID).unwrap();
        let decrypted = decrypt_sav(&encrypted, STEAM_ID).unwrap();

        assert_eq!(original_yaml, &decrypted[..]);
    }

    #[test]
    fn test_roundtrip_empty_document() {
        let encrypted = encrypt_sav(b"", STEAM_ID).unwrap();
        assert_eq!(encrypted.len() % BLOCK_SIZE, 0);
        assert!(decrypt_sav(&encrypted, STEAM_ID).unwrap().is_empty());
    }

    #[test]
    fn test_decrypt_rejects_unaligned_input() {
        let result = decrypt_sav(&[0u8; 15], STEAM_ID);
        assert!(matches!(result, Err(CryptoError::InvalidSize(15))));
    }

    #[test]
    fn test_encrypt_writes_footer() {
        let yaml = b"state:\n  cash: 1000\n";
        let mut container = encrypt_sav(yaml, STEAM_ID).unwrap();

        decrypt_blocks(&derive_key(STEAM_ID), &mut container).unwrap();
        let body = pkcs7_unpad(&container).unwrap();
        let footer = &body[body.len() - FOOTER_LEN..];

        assert_eq!(&footer[..4], &adler32(yaml).to_le_bytes());
        assert_eq!(&footer[4..], &(yaml.len() as u32).to_le_bytes());
    }

    /// Build a container by hand so the footer and padding can be tampered with
    fn seal(packet: &[u8], pad: bool) -> Vec<u8> {
        let mut data = if pad {
            pkcs7_pad(packet, BLOCK_SIZE)
        } else {
            packet.to_vec()
        };
        encrypt_blocks(&derive_key(STEAM_ID), &mut data).unwrap();
        data
    }

    #[test]
    fn test_decrypt_accepts_missing_padding() {
        let yaml = b"unpadded: true\n";
        let mut packet = compress(yaml).unwrap();
        // zlib ignores trailing bytes after the stream end
        while (packet.len() + FOOTER_LEN) % BLOCK_SIZE != 0 {
            packet.push(0);
        }
        packet.extend_from_slice(&Footer::for_document(yaml).to_bytes());

        let decrypted = decrypt_sav(&seal(&packet, false), STEAM_ID).unwrap();
        assert_eq!(decrypted, yaml);
    }

    #[test]
    fn test_footer_mismatch_permissive_vs_strict() {
        let yaml = b"footer: wrong\n";
        let mut packet = compress(yaml).unwrap();
        let bad = Footer {
            checksum: adler32(yaml) ^ 1,
            length: yaml.len() as u32,
        };
        packet.extend_from_slice(&bad.to_bytes());
        let container = seal(&packet, true);

        assert_eq!(decrypt_sav(&container, STEAM_ID).unwrap(), yaml);
        assert!(matches!(
            decrypt_sav_with(&container, STEAM_ID, &ContainerOptions::strict()),
            Err(CryptoError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_strict_detects_length_mismatch() {
        let yaml = b"length: wrong\n";
        let mut packet = compress(yaml).unwrap();
        let bad = Footer {
            checksum: adler32(yaml),
            length: 1,
        };
        packet.extend_from_slice(&bad.to_bytes());

        let result = decrypt_sav_with(&seal(&packet, true), STEAM_ID, &ContainerOptions::strict());
        assert!(matches!(
            result,
            Err(CryptoError::LengthMismatch { expected: 1, .. })
        ));
    }

    #[test]
    fn test_strict_accepts_valid_container() {
        let yaml = b"strict: ok\n";
        let container = encrypt_sav(yaml, STEAM_ID).unwrap();
        let decrypted =
            decrypt_sav_with(&container, STEAM_ID, &ContainerOptions::strict()).unwrap();
        assert_eq!(decrypted, yaml);
    }

    #[test]
    fn test_wrong_steam_id_fails() {
        let container = encrypt_sav(b"test: value\n", STEAM_ID).unwrap();
        match decrypt_sav(&container, "76561198123456789") {
            Err(_) => {}
            Ok(decrypted) => assert_ne!(decrypted, b"test: value\n"),
        }
    }

    #[test]
    fn test_options_deserialize_snake_case() {
        let options: ContainerOptions = serde_json::from_str(r#"{"footer":"strict"}"#).unwrap();
        assert_eq!(options, ContainerOptions::strict());
        let options: ContainerOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.footer, FooterCheck::Permissive);
    }
}
