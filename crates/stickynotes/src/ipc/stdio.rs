//! JSON-lines transport over stdin and stdout.
//!
//! Each input line is a request: `{"id": 1, "channel": "get-notes", "args": {}}`.
//! Each output line is either a reply, `{"id": 1, "response": {...}}`, or a
//! pushed event, `{"event": "note-updated", "note": {...}}`.

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ipc::{AppHandle, NoteApi, Request, Response};

#[derive(Debug, Serialize)]
struct Reply {
    id: Value,
    response: Response,
}

/// Serve requests from stdin until it closes.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or stdout cannot be written.
pub async fn serve_stdio(handle: &AppHandle) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    serve_lines(handle, stdin, tokio::io::stdout()).await
}

/// Serve requests read from `reader`, writing replies and events to `writer`.
///
/// Events published while a request is in flight are written after its reply.
/// Once the input ends, already published events are flushed before returning.
///
/// # Errors
///
/// Returns an error if reading or writing fails.
pub async fn serve_lines<R, W>(handle: &AppHandle, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut events = handle.subscribe();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = respond(handle, &line).await;
                write_line(&mut writer, &reply).await?;
            }
            Some(event) = events.recv() => {
                write_line(&mut writer, &event).await?;
            }
        }
    }

    while let Some(event) = events.try_recv() {
        write_line(&mut writer, &event).await?;
    }
    writer.flush().await?;
    info!("Input closed, transport finished");
    Ok(())
}

async fn respond(handle: &AppHandle, line: &str) -> Reply {
    let mut value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            debug!("Malformed request line: {}", e);
            return Reply {
                id: Value::Null,
                response: Response::failure(&Error::from(e)),
            };
        }
    };

    let id = value
        .as_object_mut()
        .and_then(|obj| obj.remove("id"))
        .unwrap_or(Value::Null);

    let response = match Request::from_json(value) {
        Ok(request) => handle.invoke(request).await,
        Err(e) => {
            debug!("Rejected request {}: {}", id, e);
            Response::failure(&e)
        }
    };
    Reply { id, response }
}

async fn write_line<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}
