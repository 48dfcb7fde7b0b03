//! Line framing for the text protocol
//!
//! Input is one command per `\n`-terminated line (a trailing `\r` is
//! trimmed with the rest of the surrounding whitespace). Output lines are
//! terminated with CRLF.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Errors that can occur while framing lines
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("Line too long (max {0} bytes)")]
    LineTooLong(usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read the next trimmed line.
///
/// Returns `Ok(None)` on a clean end of stream. A final line without a
/// terminator is still returned. Lines longer than `max_len` bytes fail
/// without buffering more than `max_len` plus one read chunk.
pub async fn read_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_len: usize,
) -> Result<Option<String>, LineError> {
    let mut buf = Vec::new();

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if buf.is_empty() {
                return Ok(None);
            }
            break;
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                buf.extend_from_slice(&available[..end]);
                reader.consume(end + 1);
                break;
            }
            None => {
                let taken = available.len();
                buf.extend_from_slice(available);
                reader.consume(taken);
            }
        }

        if buf.len() > max_len {
            return Err(LineError::LineTooLong(max_len));
        }
    }

    if buf.len() > max_len {
        return Err(LineError::LineTooLong(max_len));
    }

    Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
}

/// Write one line followed by CRLF and flush
pub async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<(), LineError> {
    let mut framed = String::with_capacity(line.len() + 2);
    framed.push_str(line);
    framed.push_str("\r\n");
    writer.write_all(framed.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
