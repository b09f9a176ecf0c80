//! Stdin/stdout JSON bridge for the search host.
//!
//! Reads newline-delimited JSON `CommandEnvelope` messages, dispatches them
//! through a [`CommandHandler`], and writes one `ResponseEnvelope` line per
//! command.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use npa_search::DocumentStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::error::{NpaError, Result};
use crate::host::contract::{CommandEnvelope, CommandName, ResponseEnvelope};
use crate::host::handler::CommandHandler;

/// Run the bridge over the process's stdin and stdout until stdin closes or
/// a `host.stop` command is received.
pub async fn run_stdio_bridge<S: DocumentStore>(handler: CommandHandler<S>) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());
    serve(&handler, reader, writer).await
}

/// Serve commands from `reader`, writing responses to `writer`.
///
/// Commands are handled one at a time, in arrival order.
pub async fn serve<S, R, W>(handler: &CommandHandler<S>, mut reader: R, mut writer: W) -> Result<()>
where
    S: DocumentStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| NpaError::Protocol(format!("failed to read command: {e}")))?;

        if bytes_read == 0 {
            tracing::info!("input closed (EOF); shutting down bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope: CommandEnvelope = match serde_json::from_str(trimmed) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, raw_line = %trimmed, "failed to parse command envelope");
                let response = ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                );
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        let is_stop = envelope.command == CommandName::HostStop;
        let response = handler.handle(envelope).await;
        write_response(&mut writer, &response).await?;

        if is_stop {
            tracing::info!("host.stop received; shutting down bridge");
            break;
        }
    }

    Ok(())
}

/// Write a single JSON line and flush.
async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &ResponseEnvelope,
) -> Result<()> {
    let mut json = serde_json::to_string(response)
        .map_err(|e| NpaError::Protocol(format!("failed to serialize response envelope: {e}")))?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
