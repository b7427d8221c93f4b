// oracle_leaks/oracle_server/src/config.rs

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use clap::Parser;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use shared_crypto::{length_of, CryptoError, MIN_KEY_BITS};
use crate::error::ConfigError;
use crate::session::MAX_LINE_BYTES;

pub const DEFAULT_BIND: &str = "127.0.0.1:1337";
pub const DEFAULT_KEY_BITS: usize = 1024;
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SECRET: &str = "HTB{dummyflag}";

/// Largest modulus whose ciphertext hex, plus a `\r\n` line ending, still
/// fits in one request line.
pub const MAX_KEY_BITS: usize = (MAX_LINE_BYTES as usize - 2) / 2 * 8;

/// Command line of the server. Flags win over the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "oracle_server", version, about = "RSA decryption-length oracle")]
pub struct Args {
    /// JSON file with any of the `ServerConfig` fields
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    pub bind: Option<String>,

    /// RSA modulus size in bits
    #[arg(short, long)]
    pub key_bits: Option<usize>,

    /// Wall-clock budget of one connection, in seconds
    #[arg(short = 't', long)]
    pub session_timeout_secs: Option<u64>,

    /// Message encrypted once at startup and served by option 2
    #[arg(short, long)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub key_bits: usize,
    pub session_timeout_secs: u64,
    pub secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: DEFAULT_BIND.to_string(),
            key_bits: DEFAULT_KEY_BITS,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            secret: DEFAULT_SECRET.to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults, then the config file if one is given, then the flags.
    pub fn load(args: &Args) -> Result<ServerConfig, ConfigError> {
        let base = match &args.config {
            Some(path) => Self::from_json_file(path)?,
            None => ServerConfig::default(),
        };
        let config = base.with_overrides(args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<ServerConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_overrides(mut self, args: &Args) -> ServerConfig {
        if let Some(bind) = &args.bind {
            self.bind = bind.clone();
        }
        if let Some(bits) = args.key_bits {
            self.key_bits = bits;
        }
        if let Some(secs) = args.session_timeout_secs {
            self.session_timeout_secs = secs;
        }
        if let Some(secret) = &args.secret {
            self.secret = secret.clone();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::BindAddress(self.bind.clone()))?;
        if self.session_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.key_bits < MIN_KEY_BITS {
            return Err(CryptoError::KeyTooSmall { bits: self.key_bits, min: MIN_KEY_BITS }.into());
        }
        if self.key_bits % 2 != 0 {
            return Err(CryptoError::OddKeySize(self.key_bits).into());
        }
        if self.key_bits > MAX_KEY_BITS {
            return Err(ConfigError::KeyTooLarge { bits: self.key_bits, max: MAX_KEY_BITS });
        }
        check_secret(self.secret.as_bytes(), self.key_bits)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

/// The secret must leave room for the marker, a separator and at least one
/// filler byte.
pub fn check_secret(secret: &[u8], key_bits: usize) -> Result<(), ConfigError> {
    let len = length_of(&BigUint::from_bytes_be(secret));
    if len == 0 {
        return Err(ConfigError::EmptySecret);
    }
    let max = ((key_bits + 7) / 8).saturating_sub(4);
    if len > max {
        return Err(ConfigError::SecretTooLong { len, bits: key_bits, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::load(&Args::default()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.session_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_flags_override_file() {
        let path = std::env::temp_dir().join(format!("oracle_server_config_{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{"key_bits": 512, "secret": "from file", "bind": "0.0.0.0:4000"}}"#).unwrap();

        let args = Args {
            config: Some(path.clone()),
            key_bits: Some(256),
            ..Args::default()
        };
        let config = ServerConfig::load(&args).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.key_bits, 256);
        assert_eq!(config.secret, "from file");
        assert_eq!(config.bind, "0.0.0.0:4000");
        assert_eq!(config.session_timeout_secs, DEFAULT_SESSION_TIMEOUT_SECS);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let parsed: Result<ServerConfig, _> = serde_json::from_str(r#"{"keybits": 512}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_file() {
        let args = Args { config: Some(PathBuf::from("/nonexistent/oracle.json")), ..Args::default() };
        assert!(matches!(ServerConfig::load(&args), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_validation_errors() {
        let base = ServerConfig::default();

        let bad_bind = ServerConfig { bind: "localhost".into(), ..base.clone() };
        assert!(matches!(bad_bind.validate(), Err(ConfigError::BindAddress(_))));

        let no_timeout = ServerConfig { session_timeout_secs: 0, ..base.clone() };
        assert!(matches!(no_timeout.validate(), Err(ConfigError::ZeroTimeout)));

        let tiny = ServerConfig { key_bits: 32, ..base.clone() };
        assert!(matches!(tiny.validate(), Err(ConfigError::Key(CryptoError::KeyTooSmall { .. }))));

        let odd = ServerConfig { key_bits: 513, ..base.clone() };
        assert!(matches!(odd.validate(), Err(ConfigError::Key(CryptoError::OddKeySize(513)))));
    }

    #[test]
    fn test_key_size_fits_request_line() {
        assert_eq!(MAX_KEY_BITS, 32760);
        let largest = ServerConfig { key_bits: MAX_KEY_BITS, ..ServerConfig::default() };
        assert!(largest.validate().is_ok());

        let too_large = ServerConfig { key_bits: MAX_KEY_BITS + 2, ..ServerConfig::default() };
        assert!(matches!(
            too_large.validate(),
            Err(ConfigError::KeyTooLarge { bits: 32762, max: 32760 })
        ));

        // A full-width ciphertext of the largest key still fits in one line.
        let line_len = 2 * ((MAX_KEY_BITS + 7) / 8) + 2;
        assert!(line_len as u64 <= MAX_LINE_BYTES);
    }

    #[test]
    fn test_secret_bounds() {
        // 64-bit key: 8 bytes, so at most 4 bytes of secret.
        assert!(check_secret(b"abcd", 64).is_ok());
        assert!(matches!(
            check_secret(b"abcde", 64),
            Err(ConfigError::SecretTooLong { len: 5, bits: 64, max: 4 })
        ));
        // Leading zero bytes do not count.
        assert!(check_secret(&[0, 0, b'a', b'b', b'c', b'd'], 64).is_ok());
        assert!(matches!(check_secret(b"", 64), Err(ConfigError::EmptySecret)));
        assert!(matches!(check_secret(&[0, 0], 64), Err(ConfigError::EmptySecret)));
    }
}
