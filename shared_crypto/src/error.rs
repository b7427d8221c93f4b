// oracle_leaks/shared_crypto/src/error.rs

use thiserror::Error;

/// Failures of key generation, padding and the hex codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("key size of {bits} bits is too small (minimum is {min})")]
    KeyTooSmall { bits: usize, min: usize },

    #[error("key size must be even, got {0} bits")]
    OddKeySize(usize),

    #[error("could not find a prime of {0} bits within the attempt budget")]
    PrimeGenerationFailed(usize),

    #[error("plaintext of {len} bytes does not fit, at most {max} bytes allowed")]
    PlaintextTooLong { len: usize, max: usize },

    #[error("message is not smaller than the modulus")]
    MessageOutOfRange,

    #[error("padded block does not follow the marker/filler/separator layout")]
    MalformedPadding,

    #[error("hex string has an odd number of digits ({0})")]
    OddHexLength(usize),

    #[error("non-hexadecimal character {ch:?} at position {idx}")]
    InvalidHexDigit { idx: usize, ch: char },
}

/// Anything a peer can get wrong on the line protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Wrong option!")]
    UnknownOption(String),

    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(#[from] CryptoError),

    #[error("unexpected response line: {0:?}")]
    UnexpectedResponse(String),

    #[error("invalid number in response: {0:?}")]
    InvalidNumber(String),
}
