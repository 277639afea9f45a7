//! Incremental extraction of complete JSON objects from a byte stream.
//!
//! `streamGenerateContent` writes one top-level JSON array progressively:
//! `[{...}\r\n,{...}\r\n]`. The array only becomes valid JSON when the stream
//! ends, so objects are cut out of the buffer as soon as their braces balance.
//! Brace counting is string-aware: `{` and `}` inside quoted values (including
//! after escaped quotes) do not change the depth.

use serde_json::Value;

/// Consumed prefix length that triggers compaction of the buffer.
const COMPACT_THRESHOLD: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct JsonObjectStream {
    buffer: Vec<u8>,
    /// Bytes before this offset hold nothing still to be yielded.
    consumed: usize,
    /// Next byte to scan. `consumed <= cursor <= buffer.len()`.
    cursor: usize,
    /// Offset of the `{` opening the object being scanned.
    object_start: Option<usize>,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl JsonObjectStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every object completed by it, in stream order.
    ///
    /// Spans that balance but fail to parse are logged and dropped.
    /// Scan state carries over between calls, so the result does not depend on
    /// where chunk boundaries fall.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend_from_slice(chunk);
        let mut objects = Vec::new();

        while self.cursor < self.buffer.len() {
            let Some(start) = self.object_start else {
                // Between objects: array brackets, commas and whitespace are skipped.
                match self.buffer[self.cursor..].iter().position(|&b| b == b'{') {
                    Some(offset) => {
                        let start = self.cursor + offset;
                        self.object_start = Some(start);
                        self.consumed = start;
                        self.cursor = start + 1;
                        self.depth = 1;
                        self.in_string = false;
                        self.escaped = false;
                    }
                    None => {
                        self.cursor = self.buffer.len();
                        self.consumed = self.cursor;
                    }
                }
                continue;
            };

            let byte = self.buffer[self.cursor];
            self.cursor += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' => self.depth += 1,
                b'}' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        let span = &self.buffer[start..self.cursor];
                        match serde_json::from_slice::<Value>(span) {
                            Ok(value) => objects.push(value),
                            Err(e) => {
                                tracing::warn!(
                                    len = span.len(),
                                    "discarding unparseable object in stream: {e}"
                                );
                            }
                        }
                        self.object_start = None;
                        self.consumed = self.cursor;
                    }
                }
                _ => {}
            }
        }

        self.compact();
        objects
    }

    /// True when the stream stopped inside an object whose braces never balanced.
    pub fn has_pending(&self) -> bool {
        self.object_start.is_some()
    }

    /// Bytes currently retained.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop the consumed prefix once it is all there is, or once it grows large.
    fn compact(&mut self) {
        let consumed = self.consumed;
        if consumed == 0 || (consumed < self.buffer.len() && consumed < COMPACT_THRESHOLD) {
            return;
        }
        self.buffer.drain(..consumed);
        self.cursor -= consumed;
        if let Some(start) = self.object_start.as_mut() {
            *start -= consumed;
        }
        self.consumed = 0;
    }
}
