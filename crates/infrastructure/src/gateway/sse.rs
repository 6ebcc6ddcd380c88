//! Incremental server-sent-events line decoder.
//!
//! Network reads split lines (and UTF-8 sequences) at arbitrary byte
//! offsets, so bytes are buffered until a full line is available.

/// A decoded line of interest
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseLine {
    /// Payload of a `data:` field
    Data(String),
    /// The `[DONE]` terminator
    Done,
}

#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed bytes, returning every complete line they finish
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseLine> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(line) = decode_line(&raw) {
                lines.push(line);
            }
        }
        lines
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<SseLine> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buffer);
        decode_line(&raw)
    }
}

fn decode_line(raw: &[u8]) -> Option<SseLine> {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim_end_matches(['\r', '\n']);

    // Comments (`: keep-alive`), event names, ids and blank separators
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload.trim() == "[DONE]" {
        Some(SseLine::Done)
    } else if payload.trim().is_empty() {
        None
    } else {
        Some(SseLine::Data(payload.to_string()))
    }
}
