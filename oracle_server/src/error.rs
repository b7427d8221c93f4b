// oracle_leaks/oracle_server/src/error.rs

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use shared_crypto::models::{INVALID_INPUT, WRONG_OPTION};
use shared_crypto::{CryptoError, ProtocolError};
use thiserror::Error;

/// Startup failures. Any of these prevents the service from launching.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("key size of {bits} bits is too large for one request line (maximum is {max})")]
    KeyTooLarge { bits: usize, max: usize },

    #[error("session timeout must be at least one second")]
    ZeroTimeout,

    #[error("secret must not be empty or all zero bytes")]
    EmptySecret,

    #[error("secret of {len} bytes does not fit a {bits}-bit key (at most {max} bytes)")]
    SecretTooLong { len: usize, bits: usize, max: usize },

    #[error(transparent)]
    Key(#[from] CryptoError),
}

/// Everything that ends a session early. Never escapes the session task.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("request line longer than {0} bytes")]
    LineTooLong(usize),

    #[error("client disconnected in the middle of a request")]
    UnexpectedEof,

    #[error("session exceeded its {0:?} time budget")]
    TimedOut(Duration),

    #[error("connection error: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    /// The terminal text sent to the client, if the connection can still
    /// carry one.
    pub fn client_message(&self) -> Option<String> {
        match self {
            SessionError::Protocol(ProtocolError::UnknownOption(_)) => Some(WRONG_OPTION.to_string()),
            SessionError::Protocol(err) => Some(format!("{}\n{}", err, INVALID_INPUT)),
            SessionError::LineTooLong(_) => Some(format!("{}\n{}", self, INVALID_INPUT)),
            SessionError::TimedOut(_) => Some("Session timed out. Exit!".to_string()),
            SessionError::UnexpectedEof | SessionError::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages() {
        let wrong = SessionError::from(ProtocolError::UnknownOption("9".into()));
        assert_eq!(wrong.client_message().as_deref(), Some(WRONG_OPTION));

        let bad_hex = SessionError::from(ProtocolError::from(CryptoError::OddHexLength(3)));
        let message = bad_hex.client_message().unwrap();
        assert!(message.starts_with("invalid ciphertext: hex string has an odd number of digits"));
        assert!(message.ends_with(INVALID_INPUT));

        assert!(SessionError::UnexpectedEof.client_message().is_none());
        assert!(SessionError::TimedOut(Duration::from_secs(1)).client_message().is_some());
    }
}
