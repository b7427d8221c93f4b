// oracle_leaks/shared_crypto/src/models.rs

//! Line protocol spoken between the oracle server and its clients.

use serde::{Serialize, Deserialize};
use crate::error::ProtocolError;

pub const MENU_PROMPT: &str = "Please choose:\n1. Get public key.\n2. Get encrypted flag.\n3. Get length.\n> ";
pub const CIPHERTEXT_PROMPT: &str = "Provide a ciphertext:\n> ";
pub const WRONG_OPTION: &str = "Wrong option!";
pub const INVALID_INPUT: &str = "Invalid Input. Exit!";

const PUBLIC_KEY_PREFIX: &str = "(n,e): ";
const CIPHERTEXT_PREFIX: &str = "Encrypted text: ";
const LENGTH_PREFIX: &str = "Length: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    PublicKey,
    EncryptedSecret,
    Length,
}

impl MenuOption {
    pub fn parse(line: &str) -> Result<MenuOption, ProtocolError> {
        match line.trim() {
            "1" => Ok(MenuOption::PublicKey),
            "2" => Ok(MenuOption::EncryptedSecret),
            "3" => Ok(MenuOption::Length),
            other => Err(ProtocolError::UnknownOption(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MenuOption::PublicKey => "1",
            MenuOption::EncryptedSecret => "2",
            MenuOption::Length => "3",
        }
    }
}

/// Public key as sent on the wire: lowercase hex, no `0x` prefix.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMessage {
    pub n: String,
    pub e: String,
}

/// What the server answers to a menu option. Never a plaintext.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum OracleResponse {
    PublicKey(PublicKeyMessage),
    Ciphertext(String),
    Length(usize),
}

impl OracleResponse {
    pub fn to_line(&self) -> String {
        match self {
            OracleResponse::PublicKey(key) => format!("{}('{}', '{}')", PUBLIC_KEY_PREFIX, key.n, key.e),
            OracleResponse::Ciphertext(hex) => format!("{}{}", CIPHERTEXT_PREFIX, hex),
            OracleResponse::Length(len) => format!("{}{}", LENGTH_PREFIX, len),
        }
    }

    /// Parses the answer line for `option`. `Ok(None)` means the line is
    /// not an answer (a prompt or a blank line) and should be skipped.
    pub fn parse_line(option: MenuOption, line: &str) -> Result<Option<OracleResponse>, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == WRONG_OPTION || line == INVALID_INPUT {
            return Err(ProtocolError::UnexpectedResponse(line.to_string()));
        }
        let response = match option {
            MenuOption::PublicKey => match line.strip_prefix(PUBLIC_KEY_PREFIX) {
                Some(rest) => Some(OracleResponse::PublicKey(parse_key_tuple(rest)?)),
                None => None,
            },
            MenuOption::EncryptedSecret => line
                .strip_prefix(CIPHERTEXT_PREFIX)
                .map(|hex| OracleResponse::Ciphertext(hex.trim().to_string())),
            MenuOption::Length => match line.strip_prefix(LENGTH_PREFIX) {
                Some(rest) => {
                    let len = rest
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| ProtocolError::InvalidNumber(rest.to_string()))?;
                    Some(OracleResponse::Length(len))
                }
                None => None,
            },
        };
        Ok(response)
    }
}

fn parse_key_tuple(text: &str) -> Result<PublicKeyMessage, ProtocolError> {
    let malformed = || ProtocolError::UnexpectedResponse(text.to_string());
    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let (n, e) = inner.split_once(',').ok_or_else(malformed)?;
    let unquote = |s: &str| -> Result<String, ProtocolError> {
        let s = s.trim();
        s.strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .map(str::to_string)
            .ok_or_else(malformed)
    };
    Ok(PublicKeyMessage { n: unquote(n)?, e: unquote(e)? })
}
