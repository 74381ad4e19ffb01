//! Incremental `text/event-stream` decoder.
//!
//! Bytes may be fed in arbitrary chunks; lines are only decoded as UTF-8
//! once complete, so a chunk boundary inside a multi-byte character is fine.
//! A line longer than [`MAX_LINE_BYTES`] is discarded up to its terminator.

/// Upper bound on one buffered line.
pub const MAX_LINE_BYTES: usize = 1 << 20;

const BOM: char = '\u{FEFF}';

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event name; `"message"` when the frame carried no `event:` field.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
    /// Last event id seen on the stream.
    pub id: Option<String>,
    /// Reconnection time the server suggested, in milliseconds.
    pub retry: Option<u64>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    last_was_cr: bool,
    /// Current line exceeded `MAX_LINE_BYTES`; skipping to its end.
    overflowed: bool,
    /// At least one line has been decoded (the BOM can only lead the first).
    started: bool,
    event: Option<String>,
    data: Option<String>,
    last_id: Option<String>,
    retry: Option<u64>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        for &b in chunk {
            // `\r\n` split across two chunks
            if self.last_was_cr && b == b'\n' {
                self.last_was_cr = false;
                continue;
            }
            self.last_was_cr = false;

            match b {
                b'\r' | b'\n' => {
                    self.last_was_cr = b == b'\r';
                    if let Some(frame) = self.end_line() {
                        frames.push(frame);
                    }
                }
                _ if self.overflowed => {}
                _ if self.line.len() >= MAX_LINE_BYTES => {
                    tracing::warn!("SSE line exceeds {} bytes, discarding it", MAX_LINE_BYTES);
                    self.overflowed = true;
                    self.line = Vec::new();
                }
                _ => self.line.push(b),
            }
        }
        frames
    }

    fn end_line(&mut self) -> Option<SseFrame> {
        let raw = std::mem::take(&mut self.line);
        let first = !self.started;
        self.started = true;
        if std::mem::take(&mut self.overflowed) {
            return None;
        }

        let decoded = String::from_utf8_lossy(&raw);
        let line: &str = if first {
            decoded.strip_prefix(BOM).unwrap_or(&*decoded)
        } else {
            &decoded
        };
        self.process_line(line)
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "id" => {
                if !value.contains('\0') {
                    self.last_id = Some(value.to_string());
                }
            }
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(ms);
                }
            }
            other => tracing::trace!("Ignoring SSE field {:?}", other),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        let data = self.data.take()?;
        Some(SseFrame {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
            id: self.last_id.clone(),
            retry: self.retry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"event:stock-price\ndata:{\"a\":1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "stock-price");
        assert_eq!(frames[0].data, "{\"a\":1}");
    }

    #[test]
    fn test_split_chunks_and_crlf() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"event: info\r").is_empty());
        assert!(dec.feed(b"\ndata: Conn").is_empty());
        let frames = dec.feed(b"ected\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "info");
        assert_eq!(frames[0].data, "Connected");
    }

    #[test]
    fn test_bare_cr_line_endings() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"data: a\rdata: b\r\r");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let mut dec = SseDecoder::new();
        let bytes = "data: café\n\n".as_bytes();
        let split = bytes.len() - 3; // inside the two-byte 'é'
        assert!(dec.feed(&bytes[..split]).is_empty());
        let frames = dec.feed(&bytes[split..]);
        assert_eq!(frames[0].data, "café");
    }

    #[test]
    fn test_comments_and_dataless_frames_dropped() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b": keep-alive\n\nevent: stock-price\n\ndata: x\n\n");
        assert_eq!(frames.len(), 1);
        // event name from the data-less frame must not leak into the next
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn test_id_persists_and_retry_parsed() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"id: 7\nretry: 3000\ndata: one\n\ndata: two\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id.as_deref(), Some("7"));
        assert_eq!(frames[1].id.as_deref(), Some("7"));
        assert_eq!(frames[0].retry, Some(3000));
    }

    #[test]
    fn test_incomplete_frame_is_held() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"event: stock-price\ndata: {}\n").is_empty());
        assert_eq!(dec.feed(b"\n").len(), 1);
    }

    #[test]
    fn test_field_without_colon() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed(b"data\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "");
    }

    #[test]
    fn test_leading_bom_stripped() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed("\u{FEFF}event: info\ndata: hi\n\n".as_bytes());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "info");
    }

    #[test]
    fn test_bom_split_across_chunks() {
        let bom = "\u{FEFF}".as_bytes();
        let mut dec = SseDecoder::new();
        assert!(dec.feed(&bom[..1]).is_empty());
        assert!(dec.feed(&bom[1..]).is_empty());
        let frames = dec.feed(b"data: x\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn test_bom_only_stripped_at_stream_start() {
        let mut dec = SseDecoder::new();
        let frames = dec.feed("data: a\n\n\u{FEFF}data: b\n\n".as_bytes());
        // later BOMs are part of the field name, so the line is ignored
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "a");
    }

    #[test]
    fn test_overlong_line_discarded_and_bounded() {
        let mut dec = SseDecoder::new();
        let mut huge = b"data: ".to_vec();
        huge.resize(MAX_LINE_BYTES + 64, b'x');
        assert!(dec.feed(&huge).is_empty());
        assert!(dec.line.len() <= MAX_LINE_BYTES);

        // the rest of that line is skipped, the next frame still decodes
        let frames = dec.feed(b"xxxx\n\nevent: info\ndata: ok\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "info");
        assert_eq!(frames[0].data, "ok");
        assert!(dec.line.is_empty());
    }
}
