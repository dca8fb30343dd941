//! Newline-delimited framing
//!
//! One record is serialized as compact JSON and followed by a single `\n`.
//! JSON escapes control characters inside strings, so the delimiter is the
//! only newline byte in a frame.

use thiserror::Error;

use crate::domain::record::LogRecord;

/// Record delimiter on the wire
pub const DELIMITER: u8 = b'\n';

/// Errors raised while recovering records from a byte stream
#[derive(Debug, Error)]
pub enum FrameError {
    /// A delimited line did not contain a valid record
    #[error("malformed record in frame {index}: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Bytes remained after the last delimiter
    #[error("stream ended with {len} byte(s) of unterminated frame")]
    Unterminated { len: usize },
}

/// Serialize a record and append the delimiter
pub fn encode_frame(record: &LogRecord) -> serde_json::Result<Vec<u8>> {
    let mut frame = serde_json::to_vec(record)?;
    frame.push(DELIMITER);
    Ok(frame)
}

/// Split a received byte stream into records
///
/// Blank lines are skipped. A trailing fragment without a delimiter is an
/// error: the sender always terminates its frame.
pub fn decode_frames(bytes: &[u8]) -> Result<Vec<LogRecord>, FrameError> {
    let mut records = Vec::new();
    let mut rest = bytes;
    let mut index = 0;

    while let Some(pos) = rest.iter().position(|b| *b == DELIMITER) {
        let line = trim_carriage_return(&rest[..pos]);
        rest = &rest[pos + 1..];

        if line.is_empty() {
            continue;
        }

        let record = serde_json::from_slice(line)
            .map_err(|source| FrameError::Malformed { index, source })?;
        records.push(record);
        index += 1;
    }

    if !rest.is_empty() {
        return Err(FrameError::Unterminated { len: rest.len() });
    }

    Ok(records)
}

fn trim_carriage_return(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
