//! The operator's local console.

use gmconsole_core::command::Origin;
use gmconsole_session::application::interpreter::Outcome;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::error::AppError;
use crate::executor::SessionHandle;

const PROMPT: &[u8] = b"> ";

/// Reads commands from `input` until end of input. Listings are written to
/// `output`; everything else reaches the operator through the broadcast.
///
/// # Errors
///
/// Returns `AppError::Server` when reading or writing fails.
pub async fn run<R, W>(input: R, mut output: W, session: SessionHandle) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        output.write_all(PROMPT).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            info!("console input closed");
            return Ok(());
        };

        match session.execute(&line, Origin::Console).await {
            Ok(Outcome::Listing(text)) => {
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "console lost the session");
                return Ok(());
            }
        }
    }
}
