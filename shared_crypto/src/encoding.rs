// oracle_leaks/shared_crypto/src/encoding.rs

use hex::FromHexError;
use num_bigint::BigUint;
use crate::error::CryptoError;

/// Lowercase hex of `data`.
pub fn hex_encode(data: &[u8]) -> String {
    hex::encode(data)
}

/// Accepts upper and lower case digits. The string must hold whole bytes.
pub fn hex_decode(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    hex::decode(encoded).map_err(|err| match err {
        FromHexError::InvalidHexCharacter { c, index } => CryptoError::InvalidHexDigit { idx: index, ch: c },
        FromHexError::OddLength | FromHexError::InvalidStringLength => CryptoError::OddHexLength(encoded.len()),
    })
}

/// Big-endian bytes of `value` as hex, leading zero bytes dropped.
/// Zero encodes as a single zero byte.
pub fn biguint_to_hex(value: &BigUint) -> String {
    hex_encode(&value.to_bytes_be())
}

/// Natural-width lowercase hex of `value` (may have an odd number of digits).
pub fn biguint_to_hex_digits(value: &BigUint) -> String {
    value.to_str_radix(16)
}
