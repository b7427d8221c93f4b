// oracle_leaks/oracle_client/src/client.rs

use std::io;
use log::{debug, info};
use num_bigint::BigUint;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use shared_crypto::models::{MenuOption, OracleResponse, PublicKeyMessage};
use shared_crypto::ProtocolError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    #[error("server closed the session")]
    SessionClosed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Speaks the oracle's menu protocol over one TCP session, reopening the
/// session once if the server drops it.
pub struct OracleClient {
    addr: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    queries: u64,
}

impl OracleClient {
    pub async fn connect(addr: &str) -> Result<OracleClient, ClientError> {
        let (reader, writer) = open(addr).await?;
        info!("connected to oracle at {}", addr);
        Ok(OracleClient { addr: addr.to_string(), reader, writer, queries: 0 })
    }

    /// Number of requests answered so far, across reconnects.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    pub async fn public_key(&mut self) -> Result<PublicKeyMessage, ClientError> {
        match self.request(MenuOption::PublicKey, None).await? {
            OracleResponse::PublicKey(key) => Ok(key),
            other => Err(unexpected(other)),
        }
    }

    /// `(n, e)` parsed from the hex public key.
    pub async fn public_key_numbers(&mut self) -> Result<(BigUint, BigUint), ClientError> {
        let key = self.public_key().await?;
        Ok((parse_hex_number(&key.n)?, parse_hex_number(&key.e)?))
    }

    pub async fn encrypted_secret(&mut self) -> Result<String, ClientError> {
        match self.request(MenuOption::EncryptedSecret, None).await? {
            OracleResponse::Ciphertext(hex) => Ok(hex),
            other => Err(unexpected(other)),
        }
    }

    pub async fn length(&mut self, ciphertext_hex: &str) -> Result<usize, ClientError> {
        match self.request(MenuOption::Length, Some(ciphertext_hex)).await? {
            OracleResponse::Length(len) => Ok(len),
            other => Err(unexpected(other)),
        }
    }

    async fn request(&mut self, option: MenuOption, payload: Option<&str>) -> Result<OracleResponse, ClientError> {
        match self.exchange(option, payload).await {
            Err(ClientError::SessionClosed) | Err(ClientError::Io(_)) => {
                debug!("session dropped, reconnecting to {}", self.addr);
                let (reader, writer) = open(&self.addr).await?;
                self.reader = reader;
                self.writer = writer;
                self.exchange(option, payload).await
            }
            result => result,
        }
    }

    async fn exchange(&mut self, option: MenuOption, payload: Option<&str>) -> Result<OracleResponse, ClientError> {
        let mut request = format!("{}\n", option.as_str());
        if let Some(payload) = payload {
            request.push_str(payload);
            request.push('\n');
        }
        self.writer.write_all(request.as_bytes()).await?;
        self.writer.flush().await?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(ClientError::SessionClosed);
            }
            if let Some(response) = OracleResponse::parse_line(option, &line)? {
                self.queries += 1;
                return Ok(response);
            }
        }
    }
}

async fn open(addr: &str) -> Result<(BufReader<OwnedReadHalf>, OwnedWriteHalf), ClientError> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    let (read_half, write_half) = stream.into_split();
    Ok((BufReader::new(read_half), write_half))
}

fn parse_hex_number(text: &str) -> Result<BigUint, ClientError> {
    BigUint::parse_bytes(text.as_bytes(), 16)
        .ok_or_else(|| ProtocolError::InvalidNumber(text.to_string()).into())
}

fn unexpected(response: OracleResponse) -> ClientError {
    ProtocolError::UnexpectedResponse(response.to_line()).into()
}
