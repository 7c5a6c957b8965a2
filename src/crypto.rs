use crate::constants::*;
use crate::error::KrbError;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use tracing::error;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

type AesBlock = GenericArray<u8, <aes::Aes128 as aes::cipher::BlockSizeUser>::BlockSize>;
type Aes128Key = GenericArray<u8, <aes::Aes128 as aes::cipher::KeySizeUser>::KeySize>;
type Aes256Key = GenericArray<u8, <aes::Aes256 as aes::cipher::KeySizeUser>::KeySize>;

fn check_iter_count(iter_count: u32) -> Result<(), KrbError> {
    // An s2kparams of 00 00 00 00 means 2**32 iterations, which we refuse.
    if iter_count == 0 {
        error!("refusing to derive a key with an iteration count of 0");
        return Err(KrbError::InvalidIterationCount);
    }
    Ok(())
}

/// Derive the long-term AES128-CTS-HMAC-SHA1-96 key of a principal from its
/// passphrase and salt (RFC 3962 section 4). The iteration count is normally
/// [RFC_PBKDF2_SHA1_ITER] unless the KDC sent s2kparams.
pub fn string_to_key_aes128_cts_hmac_sha1_96(
    passphrase: &[u8],
    salt: &[u8],
    iter_count: u32,
) -> Result<[u8; AES_128_KEY_LEN], KrbError> {
    check_iter_count(iter_count)?;

    let mut buf = [0u8; AES_128_KEY_LEN];
    pbkdf2_hmac::<Sha1>(passphrase, salt, iter_count, &mut buf);

    let mut dk_buf = [0u8; AES_128_KEY_LEN];
    dk_encrypt_aes_128_cbc(
        (&buf).into(),
        &N_FOLD_KERBEROS_16.into(),
        (&mut dk_buf).into(),
    );

    Ok(dk_buf)
}

/// Derive the long-term AES256-CTS-HMAC-SHA1-96 key of a principal from its
/// passphrase and salt (RFC 3962 section 4).
pub fn string_to_key_aes256_cts_hmac_sha1_96(
    passphrase: &[u8],
    salt: &[u8],
    iter_count: u32,
) -> Result<[u8; AES_256_KEY_LEN], KrbError> {
    check_iter_count(iter_count)?;

    let mut buf = [0u8; AES_256_KEY_LEN];
    pbkdf2_hmac::<Sha1>(passphrase, salt, iter_count, &mut buf);

    let mut dk_buf = [0u8; AES_256_KEY_LEN];
    dk_aes_256(&mut dk_buf, &buf);

    Ok(dk_buf)
}

// DK(tkey, "kerberos"): the key is longer than a block, so the second block
// is the encryption of the first.
fn dk_aes_256(out_buf: &mut [u8; AES_256_KEY_LEN], buf: &[u8; AES_256_KEY_LEN]) {
    let (lower, upper) = out_buf.split_at_mut(AES_BLOCK_SIZE);
    debug_assert!(lower.len() == AES_BLOCK_SIZE);
    debug_assert!(upper.len() == AES_BLOCK_SIZE);
    dk_encrypt_aes_256_cbc(buf.into(), &N_FOLD_KERBEROS_16.into(), lower.into());
    dk_encrypt_aes_256_cbc(buf.into(), (&*lower).into(), upper.into());
}

fn dk_encrypt_aes_128_cbc(key: &Aes128Key, plaintext: &AesBlock, out_buf: &mut AesBlock) {
    Aes128CbcEnc::new(key, &IV_ZERO.into()).encrypt_block_b2b_mut(plaintext, out_buf)
}

fn dk_encrypt_aes_256_cbc(key: &Aes256Key, plaintext: &AesBlock, out_buf: &mut AesBlock) {
    Aes256CbcEnc::new(key, &IV_ZERO.into()).encrypt_block_b2b_mut(plaintext, out_buf)
}

/// Managed service account passwords are handed out as raw UTF-16LE blobs.
/// Decode a hex dump of one into a passphrase, replacing anything that isn't
/// valid UTF-16 with U+FFFD.
pub fn decode_password_hex(password_hex: &str) -> Result<String, KrbError> {
    let raw = hex::decode(password_hex.trim()).map_err(|err| {
        error!(?err, "password hex is invalid");
        KrbError::InvalidPasswordHex
    })?;

    let chunks = raw.chunks_exact(2);
    let dangling = !chunks.remainder().is_empty();
    let units: Vec<u16> = chunks
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let mut password = String::from_utf16_lossy(&units);
    if dangling {
        password.push(char::REPLACEMENT_CHARACTER);
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::{
        decode_password_hex, string_to_key_aes128_cts_hmac_sha1_96,
        string_to_key_aes256_cts_hmac_sha1_96,
    };
    use crate::error::KrbError;
    use assert_hex::assert_eq_hex;

    #[test]
    fn test_aes128_rfc3962_vector_1() {
        let out_key = string_to_key_aes128_cts_hmac_sha1_96(
            "password".as_bytes(),
            "ATHENA.MIT.EDUraeburn".as_bytes(),
            1,
        )
        .unwrap();

        assert_eq_hex!(
            [
                0x42, 0x26, 0x3c, 0x6e, 0x89, 0xf4, 0xfc, 0x28, 0xb8, 0xdf, 0x68, 0xee, 0x09, 0x79,
                0x9f, 0x15
            ],
            out_key,
        )
    }

    #[test]
    fn test_aes128_rfc3962_vector_2() {
        let out_key = string_to_key_aes128_cts_hmac_sha1_96(
            "password".as_bytes(),
            "ATHENA.MIT.EDUraeburn".as_bytes(),
            1200,
        )
        .unwrap();

        assert_eq_hex!(
            [
                0x4c, 0x01, 0xcd, 0x46, 0xd6, 0x32, 0xd0, 0x1e, 0x6d, 0xbe, 0x23, 0x0a, 0x01, 0xed,
                0x64, 0x2a
            ],
            out_key,
        )
    }

    #[test]
    fn test_aes256_rfc3962_vector_1() {
        let out_key = string_to_key_aes256_cts_hmac_sha1_96(
            "password".as_bytes(),
            "ATHENA.MIT.EDUraeburn".as_bytes(),
            1,
        )
        .unwrap();

        assert_eq_hex!(
            [
                0xfe, 0x69, 0x7b, 0x52, 0xbc, 0x0d, 0x3c, 0xe1, 0x44, 0x32, 0xba, 0x03, 0x6a, 0x92,
                0xe6, 0x5b, 0xbb, 0x52, 0x28, 0x09, 0x90, 0xa2, 0xfa, 0x27, 0x88, 0x39, 0x98, 0xd7,
                0x2a, 0xf3, 0x01, 0x61
            ],
            out_key,
        )
    }

    #[test]
    fn test_aes256_rfc3962_vector_2() {
        let out_key = string_to_key_aes256_cts_hmac_sha1_96(
            "password".as_bytes(),
            "ATHENA.MIT.EDUraeburn".as_bytes(),
            1200,
        )
        .unwrap();

        assert_eq_hex!(
            [
                0x55, 0xa6, 0xac, 0x74, 0x0a, 0xd1, 0x7b, 0x48, 0x46, 0x94, 0x10, 0x51, 0xe1, 0xe8,
                0xb0, 0xa7, 0x54, 0x8d, 0x93, 0xb0, 0xab, 0x30, 0xa8, 0xbc, 0x3f, 0xf1, 0x62, 0x80,
                0x38, 0x2b, 0x8c, 0x2a
            ],
            out_key,
        )
    }

    #[test]
    fn test_zero_iterations_refused() {
        let res = string_to_key_aes256_cts_hmac_sha1_96(b"password", b"salt", 0);
        assert!(matches!(res, Err(KrbError::InvalidIterationCount)));
    }

    #[test]
    fn test_decode_password_hex_utf16le() {
        // "Pass" in UTF-16LE
        let password = decode_password_hex("5000610073007300").unwrap();
        assert_eq!(password, "Pass");

        // Lone surrogate and a dangling byte are replaced, not rejected.
        let password = decode_password_hex("00d841").unwrap();
        assert_eq!(password, "\u{FFFD}\u{FFFD}");

        assert!(matches!(
            decode_password_hex("zz"),
            Err(KrbError::InvalidPasswordHex)
        ));
    }
}
