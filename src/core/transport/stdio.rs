//! STDIO transport implementation.
//!
//! Newline-delimited JSON-RPC: one message per line, handled strictly one at
//! a time. The response to a frame is written and flushed before the next
//! frame is read, so responses always come back in request order.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::TransportResult;
use crate::core::handler::McpHandler;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport on the process stdin/stdout.
    pub async fn run(handler: McpHandler, cancel: CancellationToken) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");
        let result = serve(
            handler,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            cancel,
        )
        .await;
        info!("STDIO transport finished");
        result
    }
}

/// Serve newline-delimited JSON-RPC frames from `reader`, writing responses
/// to `writer`.
///
/// Returns on end of input or when `cancel` fires while waiting for the next
/// frame. A frame already being handled always runs to completion. Frames are
/// raw bytes; one that is not valid UTF-8 gets a parse error like any other
/// malformed frame.
pub async fn serve<R, W>(
    handler: McpHandler,
    reader: R,
    mut writer: W,
    cancel: CancellationToken,
) -> TransportResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = reader;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancellation observed between frames");
                break;
            }
            read = reader.read_until(b'\n', &mut buf) => read?,
        };

        if read == 0 {
            debug!("End of input");
            break;
        }

        let frame = buf.trim_ascii();
        if frame.is_empty() {
            continue;
        }

        if let Some(response) = handler.handle_frame(frame).await {
            let mut payload = serde_json::to_vec(&response)?;
            payload.push(b'\n');
            writer.write_all(&payload).await?;
            writer.flush().await?;
        }
    }

    Ok(())
}
