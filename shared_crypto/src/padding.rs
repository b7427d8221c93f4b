// oracle_leaks/shared_crypto/src/padding.rs

//! Type-2 style padding over textbook RSA.
//!
//! The padded block, most significant byte first, is
//! `0x02 || filler || 0x00 || plaintext` where the marker sits at byte index
//! `byte_size - 2` and the filler bytes are random and non-zero. The
//! plaintext length is the byte length of its *integer value*, so leading
//! zero bytes in the plaintext are dropped.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use rand::rngs::OsRng;
use crate::error::CryptoError;
use crate::rsa::KeyPair;

pub const MARKER: u8 = 0x02;

/// Minimal number of big-endian bytes holding `value`; `length_of(0) == 0`.
pub fn length_of(value: &BigUint) -> usize {
    ((value.bits() + 7) / 8) as usize
}

pub fn pad(plaintext: &[u8], key: &KeyPair) -> Result<BigUint, CryptoError> {
    pad_with_rng(plaintext, key, &mut OsRng)
}

pub fn pad_with_rng<R: RngCore + CryptoRng + ?Sized>(
    plaintext: &[u8],
    key: &KeyPair,
    rng: &mut R,
) -> Result<BigUint, CryptoError> {
    let value = BigUint::from_bytes_be(plaintext);
    let plain_len = length_of(&value);
    let filler_len = key
        .byte_size
        .checked_sub(3 + plain_len)
        .ok_or(CryptoError::PlaintextTooLong {
            len: plain_len,
            max: key.byte_size.saturating_sub(3),
        })?;

    let mut filler = vec![0u8; filler_len];
    rng.fill_bytes(&mut filler);

    let mut padded = BigUint::from(MARKER) << (8 * (key.byte_size - 2));
    for (idx, byte) in filler.iter().enumerate() {
        let byte = if *byte == 0 { 1 } else { *byte };
        padded += BigUint::from(byte) << (8 * (filler_len - idx + plain_len));
    }
    padded += value;
    Ok(padded)
}

/// Inverse of [`pad`]: everything after the first zero byte that follows
/// the marker and the filler run. Only needs the modulus byte size.
pub fn unpad(padded: &BigUint, byte_size: usize) -> Result<Vec<u8>, CryptoError> {
    let bytes = padded.to_bytes_be();
    if bytes.len() + 1 != byte_size || bytes[0] != MARKER {
        return Err(CryptoError::MalformedPadding);
    }
    let separator = bytes[1..]
        .iter()
        .position(|b| *b == 0)
        .ok_or(CryptoError::MalformedPadding)?;
    Ok(bytes[separator + 2..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use num_traits::One;

    fn test_key() -> KeyPair {
        KeyPair::generate_with_rng(256, &mut StdRng::seed_from_u64(11)).unwrap()
    }

    /// Yields only zero bytes, to exercise the zero-to-one filler rule.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 { 0 }
        fn next_u64(&mut self) -> u64 { 0 }
        fn fill_bytes(&mut self, dest: &mut [u8]) { dest.fill(0) }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    impl CryptoRng for ZeroRng {}

    #[test]
    fn test_length_of_boundaries() {
        assert_eq!(length_of(&BigUint::from(0u32)), 0);
        assert_eq!(length_of(&BigUint::from(1u32)), 1);
        assert_eq!(length_of(&BigUint::from(255u32)), 1);
        assert_eq!(length_of(&BigUint::from(256u32)), 2);
        for k in 1..=64usize {
            let power = BigUint::one() << (8 * k);
            assert_eq!(length_of(&(&power - BigUint::one())), k);
            assert_eq!(length_of(&power), k + 1);
        }
    }

    #[test]
    fn test_pad_layout() {
        let key = test_key();
        let plaintext = b"HTB{dummyflag}";
        let padded = pad_with_rng(plaintext, &key, &mut StdRng::seed_from_u64(5)).unwrap();
        let bytes = padded.to_bytes_be();

        assert!(padded < key.top_block_value);
        assert!(padded < key.n);
        assert_eq!(length_of(&padded), key.byte_size - 1);
        assert_eq!(bytes[0], MARKER);

        let filler_len = key.byte_size - 3 - plaintext.len();
        assert!(bytes[1..=filler_len].iter().all(|b| *b != 0));
        assert_eq!(bytes[filler_len + 1], 0);
        assert_eq!(&bytes[filler_len + 2..], plaintext);
    }

    #[test]
    fn test_low_bytes_reconstruct_plaintext() {
        let key = test_key();
        let mut rng = StdRng::seed_from_u64(9);
        for len in 1..=key.byte_size - 4 {
            let plaintext: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(37) | 0x80).collect();
            let padded = pad_with_rng(&plaintext, &key, &mut rng).unwrap();
            let low = &padded % (BigUint::one() << (8 * len));
            assert_eq!(low, BigUint::from_bytes_be(&plaintext));
            let bytes = padded.to_bytes_be();
            let filler = &bytes[1..bytes.len() - len - 1];
            assert_eq!(filler.len(), key.byte_size - 3 - len);
            assert!(filler.iter().all(|b| *b != 0));
        }
    }

    #[test]
    fn test_zero_filler_bytes_become_one() {
        let key = test_key();
        let padded = pad_with_rng(b"A", &key, &mut ZeroRng).unwrap();
        let bytes = padded.to_bytes_be();
        let filler_len = key.byte_size - 4;
        assert!(bytes[1..=filler_len].iter().all(|b| *b == 1));
        assert_eq!(&bytes[filler_len + 1..], &[0x00, b'A']);
    }

    #[test]
    fn test_leading_zero_bytes_are_invisible() {
        let key = test_key();
        let with_zeros = pad_with_rng(&[0, 0, b'A'], &key, &mut ZeroRng).unwrap();
        let without = pad_with_rng(b"A", &key, &mut ZeroRng).unwrap();
        assert_eq!(with_zeros, without);
    }

    #[test]
    fn test_pad_too_long() {
        let key = test_key();
        let plaintext = vec![0xffu8; key.byte_size - 2];
        assert_eq!(
            pad(&plaintext, &key),
            Err(CryptoError::PlaintextTooLong { len: key.byte_size - 2, max: key.byte_size - 3 })
        );
        // No filler at all still fits.
        assert!(pad(&vec![0xffu8; key.byte_size - 3], &key).is_ok());
    }

    #[test]
    fn test_unpad() {
        let key = test_key();
        let padded = pad(b"secret message", &key).unwrap();
        assert_eq!(unpad(&padded, key.byte_size).unwrap(), b"secret message");

        let empty = pad(b"", &key).unwrap();
        assert_eq!(unpad(&empty, key.byte_size).unwrap(), b"");

        assert_eq!(unpad(&BigUint::from(7u32), key.byte_size), Err(CryptoError::MalformedPadding));
        let no_separator = BigUint::from_bytes_be(&vec![0x02u8; key.byte_size - 1]);
        assert_eq!(unpad(&no_separator, key.byte_size), Err(CryptoError::MalformedPadding));
    }
}
