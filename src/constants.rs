use std::time::Duration;

/// Standard KDC port, for both TCP and UDP.
pub const KERBEROS_PORT: u16 = 88;

/// Connect and receive timeout for a single probe.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest reply we will accept. This is the UDP receive buffer and the cap
/// on a TCP frame length prefix.
pub const DEFAULT_IO_MAX_SIZE: usize = 65535;

/// The nonce is a UInt32 on the wire, but MIT rejects values above i32::MAX.
pub const NONCE_MAX: i32 = 0x7FFF_FFFF;

/// The "krbtgt" service component of the TGS principal.
pub const KRBTGT: &str = "krbtgt";

/// RFC 3962 default when no s2kparams are given.
pub const RFC_PBKDF2_SHA1_ITER: u32 = 0x1000;

pub const AES_BLOCK_SIZE: usize = 16;
pub const AES_128_KEY_LEN: usize = 16;
pub const AES_256_KEY_LEN: usize = 32;

/// 128-fold("kerberos"), RFC 3961 appendix A.1.
pub const N_FOLD_KERBEROS_16: [u8; 16] = [
    0x6b, 0x65, 0x72, 0x62, 0x65, 0x72, 0x6f, 0x73, 0x7b, 0x9b, 0x5b, 0x2b, 0x93, 0x13, 0x2b, 0x93,
];

pub const IV_ZERO: [u8; AES_BLOCK_SIZE] = [0u8; AES_BLOCK_SIZE];
