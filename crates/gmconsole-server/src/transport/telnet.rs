//! Authenticated telnet sessions.
//!
//! A session's first line must be the shared secret. After that every line is
//! a command, and the session also receives every broadcast. A near-empty
//! line ends the session.

use std::net::SocketAddr;

use gmconsole_core::command::Origin;
use gmconsole_session::application::interpreter::Outcome;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, instrument, warn};

use crate::hub::{Connection, Pool};
use crate::state::AppState;

const DENIED: &[u8] = b"access denied\r\n";

/// Longest accepted line, terminator included. Longer lines end the session.
pub const MAX_LINE: usize = 4096;

/// Accepts telnet sessions until the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "telnet listening");
    }
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle(stream, peer, state).await {
                        debug!(%peer, error = %e, "telnet session ended with error");
                    }
                });
            }
            Err(e) => warn!(error = %e, "telnet accept failed"),
        }
    }
}

/// True for lines that carry no command: blank after trimming, or nothing
/// printable (heartbeats, telnet negotiation bytes).
#[must_use]
pub fn is_near_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || !trimmed
            .chars()
            .any(|c| c.is_ascii_graphic() || c.is_alphanumeric())
}

async fn read_line(
    reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    let read = (&mut *reader)
        .take(MAX_LINE as u64)
        .read_until(b'\n', buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if buf.len() >= MAX_LINE && buf.last() != Some(&b'\n') {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "line too long",
        ));
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

#[instrument(skip(stream, state))]
async fn handle(stream: TcpStream, peer: SocketAddr, state: AppState) -> std::io::Result<()> {
    let (rd, mut wr) = stream.into_split();
    let mut reader = BufReader::new(rd);
    let mut buf = Vec::new();

    let Some(secret) = read_line(&mut reader, &mut buf).await? else {
        return Ok(());
    };
    if secret.trim() != state.config.shared_secret {
        warn!("telnet session rejected");
        wr.write_all(DENIED).await?;
        wr.shutdown().await?;
        return Ok(());
    }

    let (conn, mut rx) = Connection::open(Pool::Telnet, state.config.queue_capacity);
    let connection_id = conn.id;
    state.hub.register(conn);
    info!(%connection_id, "telnet session authenticated");

    let mut writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if wr.write_all(payload.as_bytes()).await.is_err()
                || wr.write_all(b"\r\n").await.is_err()
            {
                break;
            }
        }
        let _ = wr.shutdown().await;
    });

    let origin = Origin::Telnet(connection_id.as_uuid());
    let mut writer_done = false;
    let result = loop {
        // The writer stops once the hub drops this session; stop reading too.
        let read = tokio::select! {
            biased;
            _ = &mut writer => {
                writer_done = true;
                debug!(%connection_id, "telnet session dropped by hub");
                break Ok(());
            }
            read = read_line(&mut reader, &mut buf) => read,
        };
        let line = match read {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        if is_near_empty(&line) {
            debug!(%connection_id, "near-empty line, closing session");
            break Ok(());
        }
        match state.session.execute(&line, origin).await {
            Ok(Outcome::Listing(text)) => state.hub.send_to(connection_id, text),
            Ok(_) => {}
            Err(e) => {
                warn!(%connection_id, error = %e, "telnet session lost the session");
                break Ok(());
            }
        }
    };

    state.hub.unregister(connection_id);
    if !writer_done {
        let _ = writer.await;
    }
    info!(%connection_id, "telnet session closed");
    result
}
