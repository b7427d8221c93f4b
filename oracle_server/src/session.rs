// oracle_leaks/oracle_server/src/session.rs

//! One client connection: menu, dispatch, answer, repeat.
//!
//! A session has no state of its own besides the connection. The first
//! malformed request ends it; nothing is retried.

use std::time::Duration;
use log::{debug, info, warn};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use shared_crypto::models::{MenuOption, OracleResponse, CIPHERTEXT_PROMPT, MENU_PROMPT};
use crate::context::OracleContext;
use crate::error::SessionError;

pub const MAX_LINE_BYTES: u64 = 8192;

/// Runs the menu loop until the client hangs up (`Ok`) or a request fails.
pub async fn run_session<R, W>(ctx: &OracleContext, reader: &mut R, writer: &mut W) -> Result<(), SessionError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        write_message(writer, MENU_PROMPT).await?;
        let line = match read_request_line(reader).await? {
            Some(line) => line,
            None => return Ok(()),
        };

        let option = MenuOption::parse(&line)?;
        debug!("dispatching option {}", option.as_str());
        let response = match option {
            MenuOption::PublicKey => OracleResponse::PublicKey(ctx.public_key().clone()),
            MenuOption::EncryptedSecret => OracleResponse::Ciphertext(ctx.encrypted_secret().to_string()),
            MenuOption::Length => {
                write_message(writer, CIPHERTEXT_PROMPT).await?;
                let ciphertext = read_request_line(reader).await?.ok_or(SessionError::UnexpectedEof)?;
                OracleResponse::Length(ctx.length_query(&ciphertext)?)
            }
        };
        write_message(writer, &response.to_line()).await?;
    }
}

/// Session boundary: applies the time budget, reports the terminal message
/// to the client and logs the outcome. Nothing escapes to the listener.
pub async fn serve_session<S>(ctx: &OracleContext, stream: S, peer: &str, budget: Duration) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = io::split(stream);
    let mut reader = BufReader::new(read_half);

    let outcome = match timeout(budget, run_session(ctx, &mut reader, &mut write_half)).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::TimedOut(budget)),
    };

    match &outcome {
        Ok(()) => info!("session {} closed by client", peer),
        Err(err) => {
            warn!("session {} terminated: {}", peer, err);
            if let Some(message) = err.client_message() {
                if let Err(e) = write_message(&mut write_half, &message).await {
                    debug!("session {}: could not deliver terminal message: {}", peer, e);
                }
            }
        }
    }
    if let Err(e) = write_half.shutdown().await {
        debug!("session {}: shutdown failed: {}", peer, e);
    }
    outcome
}

/// `None` on a clean end of input. Lines longer than [`MAX_LINE_BYTES`]
/// are rejected before they are fully buffered. Invalid UTF-8 is replaced
/// rather than refused, so it fails as a bad option or bad hex.
async fn read_request_line<R>(reader: &mut R) -> Result<Option<String>, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let read = (&mut *reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut line).await?;
    if read == 0 {
        return Ok(None);
    }
    if read as u64 == MAX_LINE_BYTES && line.last() != Some(&b'\n') {
        return Err(SessionError::LineTooLong(MAX_LINE_BYTES as usize));
    }
    Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
}

async fn write_message<W>(writer: &mut W, text: &str) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
