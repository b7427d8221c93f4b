// oracle_leaks/shared_crypto/src/rsa.rs

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::{Zero, One};
use num_integer::Integer;
use rand::{CryptoRng, RngCore};
use rand::rngs::OsRng;
use crate::error::CryptoError;
use crate::encoding::biguint_to_hex_digits;

pub const PUBLIC_EXPONENT: u32 = 65537;
pub const MIN_KEY_BITS: usize = 64;

const MAX_PRIME_ATTEMPTS: u32 = 5000;
const MILLER_RABIN_ROUNDS: usize = 20;

/// RSA key pair plus the layout constants the padding and the oracle work with.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub n: BigUint,
    pub e: BigUint,
    d: BigUint,
    pub bit_size: usize,
    /// `ceil(bit_size / 8)`
    pub byte_size: usize,
    /// `2^((byte_size - 1) * 8)`, the smallest value with `byte_size` bytes.
    pub top_block_value: BigUint,
}

impl KeyPair {
    pub fn generate(bits: usize) -> Result<KeyPair, CryptoError> {
        Self::generate_with_rng(bits, &mut OsRng)
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng + ?Sized>(
        bits: usize,
        rng: &mut R,
    ) -> Result<KeyPair, CryptoError> {
        if bits < MIN_KEY_BITS {
            return Err(CryptoError::KeyTooSmall { bits, min: MIN_KEY_BITS });
        }
        if bits % 2 != 0 {
            return Err(CryptoError::OddKeySize(bits));
        }
        let e = BigUint::from(PUBLIC_EXPONENT);
        loop {
            let p = generate_large_prime(bits / 2, MAX_PRIME_ATTEMPTS, rng)?;
            let mut q = generate_large_prime(bits / 2, MAX_PRIME_ATTEMPTS, rng)?;
            while p == q {
                q = generate_large_prime(bits / 2, MAX_PRIME_ATTEMPTS, rng)?;
            }
            let phi = (&p - BigUint::one()) * (&q - BigUint::one());
            // e must be invertible mod φ(n); draw fresh primes otherwise.
            if !phi.gcd(&e).is_one() {
                continue;
            }
            let d = match modinv(&e, &phi) {
                Some(d) => d,
                None => continue,
            };
            return Ok(Self::from_parts(&p * &q, e, d));
        }
    }

    /// Builds a key pair from known components. `n` decides the layout.
    pub fn from_parts(n: BigUint, e: BigUint, d: BigUint) -> KeyPair {
        let bit_size = n.bits() as usize;
        let byte_size = (bit_size + 7) / 8;
        let top_block_value = BigUint::one() << ((byte_size.saturating_sub(1)) * 8);
        KeyPair { n, e, d, bit_size, byte_size, top_block_value }
    }

    pub fn private_exponent(&self) -> &BigUint {
        &self.d
    }

    /// `(n, e)` as lowercase hex without a radix prefix.
    pub fn public_key_hex(&self) -> (String, String) {
        (biguint_to_hex_digits(&self.n), biguint_to_hex_digits(&self.e))
    }

    pub fn encrypt_raw(&self, message: &BigUint) -> Result<BigUint, CryptoError> {
        if message >= &self.n {
            return Err(CryptoError::MessageOutOfRange);
        }
        Ok(message.modpow(&self.e, &self.n))
    }

    /// Textbook decryption. Inputs at or above `n` are reduced, never rejected.
    pub fn decrypt_raw(&self, ciphertext: &BigUint) -> BigUint {
        ciphertext.modpow(&self.d, &self.n)
    }
}

fn generate_large_prime<R: RngCore + CryptoRng + ?Sized>(
    bits: usize,
    max_attempts: u32,
    rng: &mut R,
) -> Result<BigUint, CryptoError> {
    if bits < 2 {
        return Err(CryptoError::PrimeGenerationFailed(bits));
    }
    for _ in 0..max_attempts {
        let mut candidate = rng.gen_biguint(bits as u64);
        // Two top bits keep p*q at exactly 2*bits bits.
        candidate.set_bit(bits as u64 - 1, true);
        candidate.set_bit(bits as u64 - 2, true);
        candidate.set_bit(0, true);
        if is_probably_prime(&candidate, MILLER_RABIN_ROUNDS, rng) {
            return Ok(candidate);
        }
    }
    Err(CryptoError::PrimeGenerationFailed(bits))
}

const SMALL_PRIMES: [u32; 15] = [3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];

fn is_probably_prime<R: RngCore + CryptoRng + ?Sized>(n: &BigUint, k: usize, rng: &mut R) -> bool {
    if n <= &BigUint::one() { return false; }
    if n == &BigUint::from(2u32) { return true; }
    if n.is_even() { return false; }
    for p in SMALL_PRIMES {
        let p = BigUint::from(p);
        if n == &p { return true; }
        if (n % &p).is_zero() { return false; }
    }

    let n_minus_one = n - BigUint::one();
    let mut d = n_minus_one.clone();
    let mut s: u32 = 0;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    let two = BigUint::from(2u32);
    'witness: for _ in 0..k {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one { continue; }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one { continue 'witness; }
        }
        return false;
    }
    true
}

fn extended_gcd_signed(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if a.is_zero() {
        (b.clone(), BigInt::zero(), BigInt::one())
    } else {
        let (g, x1, y1) = extended_gcd_signed(&(b % a), a);
        (g, y1 - (b / a) * &x1, x1)
    }
}

pub fn modinv(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() || m.is_one() {
        return None;
    }
    let a_signed = BigInt::from(a.clone());
    let m_signed = BigInt::from(m.clone());
    let (g, x, _) = extended_gcd_signed(&a_signed, &m_signed);
    if !g.is_one() {
        return None;
    }
    ((&x % &m_signed + &m_signed) % &m_signed).to_biguint()
}
