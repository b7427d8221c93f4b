// oracle_leaks/oracle_server/src/context.rs

use log::info;
use rand::{CryptoRng, RngCore};
use rand::rngs::OsRng;
use shared_crypto::models::PublicKeyMessage;
use shared_crypto::{decryption_length, encrypt_with_rng, hex_decode, KeyPair, ProtocolError};
use crate::config::{check_secret, ServerConfig};
use crate::error::ConfigError;

/// Read-only state shared by every session: one key pair and the secret
/// encrypted once under it.
#[derive(Debug)]
pub struct OracleContext {
    key: KeyPair,
    public_key: PublicKeyMessage,
    secret_ciphertext: String,
}

impl OracleContext {
    pub fn from_config(config: &ServerConfig) -> Result<OracleContext, ConfigError> {
        config.validate()?;
        info!("generating a {}-bit RSA key", config.key_bits);
        let key = KeyPair::generate(config.key_bits)?;
        Self::new(key, config.secret.as_bytes())
    }

    pub fn new(key: KeyPair, secret: &[u8]) -> Result<OracleContext, ConfigError> {
        Self::new_with_rng(key, secret, &mut OsRng)
    }

    pub fn new_with_rng<R: RngCore + CryptoRng + ?Sized>(
        key: KeyPair,
        secret: &[u8],
        rng: &mut R,
    ) -> Result<OracleContext, ConfigError> {
        check_secret(secret, key.bit_size)?;
        let secret_ciphertext = encrypt_with_rng(secret, &key, rng)?;
        let (n, e) = key.public_key_hex();
        Ok(OracleContext {
            key,
            public_key: PublicKeyMessage { n, e },
            secret_ciphertext,
        })
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    pub fn public_key(&self) -> &PublicKeyMessage {
        &self.public_key
    }

    pub fn encrypted_secret(&self) -> &str {
        &self.secret_ciphertext
    }

    /// Byte length of the raw decryption of a hex ciphertext.
    pub fn length_query(&self, ciphertext_hex: &str) -> Result<usize, ProtocolError> {
        let bytes = hex_decode(ciphertext_hex.trim())?;
        Ok(decryption_length(&bytes, &self.key))
    }
}
