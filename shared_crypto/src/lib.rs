// oracle_leaks/shared_crypto/src/lib.rs

// Library modules.
pub mod error;
pub mod encoding;
pub mod rsa;
pub mod padding;
pub mod cipher;
pub mod models;

// Re-export the main types and functions for the applications.
pub use error::{CryptoError, ProtocolError};
pub use encoding::{hex_encode, hex_decode, biguint_to_hex, biguint_to_hex_digits};
pub use rsa::{KeyPair, PUBLIC_EXPONENT, MIN_KEY_BITS};
pub use padding::{length_of, pad, pad_with_rng, unpad};
pub use cipher::{encrypt, encrypt_with_rng, decrypt, decryption_length, byte_length_of, blind};
pub use models::{MenuOption, OracleResponse, PublicKeyMessage};
