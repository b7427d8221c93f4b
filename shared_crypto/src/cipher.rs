// oracle_leaks/shared_crypto/src/cipher.rs

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use rand::rngs::OsRng;
use crate::error::CryptoError;
use crate::encoding::biguint_to_hex;
use crate::padding::{length_of, pad_with_rng};
use crate::rsa::KeyPair;

/// Pads `plaintext` and encrypts it. The hex output drops leading zero
/// bytes, so its width varies with the ciphertext value.
pub fn encrypt(plaintext: &[u8], key: &KeyPair) -> Result<String, CryptoError> {
    encrypt_with_rng(plaintext, key, &mut OsRng)
}

pub fn encrypt_with_rng<R: RngCore + CryptoRng + ?Sized>(
    plaintext: &[u8],
    key: &KeyPair,
    rng: &mut R,
) -> Result<String, CryptoError> {
    let padded = pad_with_rng(plaintext, key, rng)?;
    Ok(biguint_to_hex(&key.encrypt_raw(&padded)?))
}

/// Raw RSA decryption. The padding is neither checked nor stripped.
pub fn decrypt(ciphertext: &[u8], key: &KeyPair) -> BigUint {
    key.decrypt_raw(&BigUint::from_bytes_be(ciphertext))
}

/// The only thing the oracle ever reveals about a decryption.
pub fn byte_length_of(value: &BigUint) -> usize {
    length_of(value)
}

pub fn decryption_length(ciphertext: &[u8], key: &KeyPair) -> usize {
    byte_length_of(&decrypt(ciphertext, key))
}

/// `ciphertext * factor^e mod n`, which decrypts to `plaintext * factor mod n`.
pub fn blind(ciphertext: &BigUint, factor: &BigUint, n: &BigUint, e: &BigUint) -> BigUint {
    (ciphertext * factor.modpow(e, n)) % n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::hex_decode;
    use num_bigint::RandBigInt;
    use num_integer::Integer;
    use num_traits::One;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_key() -> KeyPair {
        KeyPair::generate_with_rng(256, &mut StdRng::seed_from_u64(23)).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_gives_padded_block() {
        let key = test_key();
        let expected = pad_with_rng(b"HTB{dummyflag}", &key, &mut StdRng::seed_from_u64(1)).unwrap();
        let ciphertext = encrypt_with_rng(b"HTB{dummyflag}", &key, &mut StdRng::seed_from_u64(1)).unwrap();

        let bytes = hex_decode(&ciphertext).unwrap();
        assert_eq!(ciphertext.len() % 2, 0);
        assert!(bytes.len() <= key.byte_size);
        assert_eq!(decrypt(&bytes, &key), expected);
        assert_eq!(decryption_length(&bytes, &key), key.byte_size - 1);
    }

    #[test]
    fn test_zero_decrypts_to_zero_length() {
        let key = test_key();
        assert_eq!(decrypt(&[], &key), BigUint::default());
        assert_eq!(decryption_length(&[], &key), 0);
        assert_eq!(decryption_length(&[0, 0], &key), 0);
        assert_eq!(byte_length_of(&BigUint::default()), 0);
    }

    #[test]
    fn test_ciphertext_equal_to_modulus_decrypts_to_zero() {
        let key = test_key();
        assert_eq!(decryption_length(&key.n.to_bytes_be(), &key), 0);
    }

    #[test]
    fn test_blinding_is_multiplicative() {
        let key = test_key();
        let mut rng = StdRng::seed_from_u64(99);
        let m = pad_with_rng(b"length leak", &key, &mut rng).unwrap();
        let c = key.encrypt_raw(&m).unwrap();

        for _ in 0..16 {
            let s = rng.gen_biguint_below(&key.n);
            if !s.gcd(&key.n).is_one() {
                continue;
            }
            let blinded = blind(&c, &s, &key.n, &key.e);
            let expected = (&s * &m) % &key.n;
            assert_eq!(key.decrypt_raw(&blinded), expected);
            assert_eq!(decryption_length(&blinded.to_bytes_be(), &key), byte_length_of(&expected));
        }
    }
}
