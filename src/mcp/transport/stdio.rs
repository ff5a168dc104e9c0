//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! stdout carries protocol messages only; all logging goes to stderr.
//! A line that is not UTF-8 or exceeds the size limit is answered with a
//! parse error and the loop keeps reading.

use serde_json::Value;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;

use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};
use crate::mcp::McpServer;

/// Serve the process's stdin/stdout until EOF or shutdown.
pub async fn serve_stdio(
    server: Arc<McpServer>,
    max_line_bytes: usize,
    shutdown: broadcast::Receiver<()>,
) -> io::Result<()> {
    tracing::info!("MCP server listening on stdio");
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    serve_lines(server, reader, writer, max_line_bytes, shutdown).await
}

enum Frame {
    Eof,
    Line,
    Oversized,
}

/// Read one line into `buf`, keeping at most `limit` bytes of it.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    let read = (&mut *reader)
        .take(limit as u64 + 1)
        .read_until(b'\n', buf)
        .await?;
    if read == 0 {
        return Ok(Frame::Eof);
    }
    if buf.last() == Some(&b'\n') || buf.len() <= limit {
        return Ok(Frame::Line);
    }

    // Drop the remainder of the oversized line.
    loop {
        let (consumed, done) = {
            let chunk = reader.fill_buf().await?;
            match chunk.iter().position(|b| *b == b'\n') {
                Some(i) => (i + 1, true),
                None => (chunk.len(), chunk.is_empty()),
            }
        };
        reader.consume(consumed);
        if done {
            return Ok(Frame::Oversized);
        }
    }
}

/// Read one message per line, write one response per line.
pub async fn serve_lines<R, W>(
    server: Arc<McpServer>,
    mut reader: R,
    mut writer: W,
    max_line_bytes: usize,
    mut shutdown: broadcast::Receiver<()>,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let frame = tokio::select! {
            frame = read_frame(&mut reader, &mut buf, max_line_bytes) => frame?,
            _ = shutdown.recv() => {
                tracing::info!("Shutdown requested, closing stdio transport");
                break;
            }
        };

        let response = match frame {
            Frame::Eof => {
                tracing::info!("stdin closed, stopping");
                break;
            }
            Frame::Oversized => {
                tracing::warn!(limit = max_line_bytes, "Dropping oversized stdio message");
                Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::parse_error(format!("message exceeds {} bytes", max_line_bytes)),
                ))
            }
            Frame::Line => match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => server.handle_message(line).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping non UTF-8 stdio message");
                    Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e)))
                }
            },
        };

        if let Some(response) = response {
            let mut payload = serde_json::to_vec(&response)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            payload.push(b'\n');
            writer.write_all(&payload).await?;
            writer.flush().await?;
        }
    }

    Ok(())
}
