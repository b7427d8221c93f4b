// oracle_leaks/oracle_client/src/attack.rs

//! Manger's adaptive chosen-ciphertext attack driven by the length oracle.
//!
//! With `k` the modulus byte size and `B = 2^(8(k-1))`, the oracle answering
//! `k` means the blinded plaintext `f*m mod n` is at least `B`. The padded
//! secret is `k-1` bytes long, so `m < B` holds for the served ciphertext and
//! roughly one query per modulus bit recovers it.

use std::convert::Infallible;
use std::future::Future;
use log::{debug, info};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use thiserror::Error;
use shared_crypto::{biguint_to_hex, blind, byte_length_of, KeyPair};
use crate::client::{ClientError, OracleClient};

pub const DEFAULT_QUERY_BUDGET: u64 = 100_000;

/// Anything that reports the byte length of a ciphertext's raw decryption.
pub trait LengthOracle {
    type Error;

    fn decrypted_length(&mut self, ciphertext: &BigUint) -> impl Future<Output = Result<usize, Self::Error>>;
}

impl LengthOracle for OracleClient {
    type Error = ClientError;

    async fn decrypted_length(&mut self, ciphertext: &BigUint) -> Result<usize, ClientError> {
        self.length(&biguint_to_hex(ciphertext)).await
    }
}

/// In-process oracle over a private key.
pub struct LocalOracle<'a> {
    key: &'a KeyPair,
}

impl<'a> LocalOracle<'a> {
    pub fn new(key: &'a KeyPair) -> Self {
        LocalOracle { key }
    }
}

impl LengthOracle for LocalOracle<'_> {
    type Error = Infallible;

    async fn decrypted_length(&mut self, ciphertext: &BigUint) -> Result<usize, Infallible> {
        Ok(byte_length_of(&self.key.decrypt_raw(ciphertext)))
    }
}

#[derive(Debug, Error)]
pub enum AttackError<E> {
    #[error("oracle query failed: {0}")]
    Oracle(#[source] E),

    #[error("the ciphertext does not decrypt below 2^(8(k-1))")]
    OutOfRange,

    #[error("oracle answers are inconsistent with a single plaintext")]
    InconsistentOracle,

    #[error("gave up after {0} oracle queries")]
    QueryBudgetExhausted(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub padded: BigUint,
    pub queries: u64,
}

pub async fn recover_padded<O: LengthOracle>(
    oracle: &mut O,
    n: &BigUint,
    e: &BigUint,
    ciphertext: &BigUint,
) -> Result<Recovery, AttackError<O::Error>> {
    recover_padded_with_budget(oracle, n, e, ciphertext, DEFAULT_QUERY_BUDGET).await
}

pub async fn recover_padded_with_budget<O: LengthOracle>(
    oracle: &mut O,
    n: &BigUint,
    e: &BigUint,
    ciphertext: &BigUint,
    budget: u64,
) -> Result<Recovery, AttackError<O::Error>> {
    let k = byte_length_of(n);
    let mut attack = Manger {
        oracle,
        n,
        e,
        c: ciphertext,
        k,
        b: BigUint::one() << (8 * k.saturating_sub(1)),
        queries: 0,
        budget,
    };
    let padded = attack.run().await?;
    info!("recovered the plaintext in {} oracle queries", attack.queries);
    Ok(Recovery { padded, queries: attack.queries })
}

struct Manger<'a, O> {
    oracle: &'a mut O,
    n: &'a BigUint,
    e: &'a BigUint,
    c: &'a BigUint,
    k: usize,
    b: BigUint,
    queries: u64,
    budget: u64,
}

impl<O: LengthOracle> Manger<'_, O> {
    /// Whether `f * m mod n >= B`.
    async fn at_least_b(&mut self, f: &BigUint) -> Result<bool, AttackError<O::Error>> {
        if self.queries >= self.budget {
            return Err(AttackError::QueryBudgetExhausted(self.budget));
        }
        self.queries += 1;
        let blinded = blind(self.c, f, self.n, self.e);
        let len = self
            .oracle
            .decrypted_length(&blinded)
            .await
            .map_err(AttackError::Oracle)?;
        Ok(len >= self.k)
    }

    async fn run(&mut self) -> Result<BigUint, AttackError<O::Error>> {
        let n = self.n;
        if self.at_least_b(&BigUint::one()).await? {
            return Err(AttackError::OutOfRange);
        }

        // Step 1: smallest power of two with f1 * m in [B, 2B).
        let mut f1 = BigUint::from(2u32);
        while !self.at_least_b(&f1).await? {
            f1 <<= 1;
            if &f1 > n {
                return Err(AttackError::InconsistentOracle);
            }
        }
        let half_f1 = &f1 >> 1;
        debug!("step 1 done after {} queries", self.queries);

        // Step 2: f2 * m in [n, n + B).
        let mut f2 = ((n + &self.b) / &self.b) * &half_f1;
        while self.at_least_b(&f2).await? {
            f2 += &half_f1;
            if f2 > (n << 1) {
                return Err(AttackError::InconsistentOracle);
            }
        }
        debug!("step 2 done after {} queries", self.queries);

        // Step 3: shrink [m_min, m_max] until it holds a single value.
        let mut m_min = n.div_ceil(&f2);
        let mut m_max = (n + &self.b) / &f2;
        while m_min < m_max {
            let f_tmp = (&self.b << 1) / (&m_max - &m_min);
            let i_n: BigUint = ((&f_tmp * &m_min) / n) * n;
            let f3 = i_n.div_ceil(&m_min);
            if f3.is_zero() {
                return Err(AttackError::InconsistentOracle);
            }
            if self.at_least_b(&f3).await? {
                m_min = (&i_n + &self.b).div_ceil(&f3);
            } else {
                m_max = (&i_n + &self.b) / &f3;
            }
        }
        if m_min != m_max {
            return Err(AttackError::InconsistentOracle);
        }
        Ok(m_min)
    }
}
