//! Incremental frame decoder for the query stream.
//!
//! Turns raw transport bytes into complete `data:` frame payloads. The
//! transport delivers bytes at arbitrary boundaries - a delivery may end in
//! the middle of a line or even in the middle of a multi-byte UTF-8
//! character - so the decoder buffers across calls and only emits whole
//! frames. Feeding the same total bytes in any split produces the same frame
//! sequence.

/// SSE data-line prefix; only lines carrying it become frames.
const DATA_PREFIX: &str = "data: ";

/// Stream termination sentinel sent as a frame payload.
const DONE_SENTINEL: &str = "[DONE]";

/// Stateful decoder from transport bytes to frame payload strings.
///
/// One decoder per stream; it is not restartable after the `[DONE]`
/// sentinel.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes that did not yet decode to complete UTF-8.
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    buffer: String,
    /// Set once the `[DONE]` sentinel is seen; everything after is dropped.
    finished: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one transport delivery, returning every frame it completed.
    ///
    /// Frames queued before a `[DONE]` sentinel in the same delivery are
    /// still returned; bytes after the sentinel are never processed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.finished {
            return Vec::new();
        }
        self.pending.extend_from_slice(chunk);
        self.decode_pending();
        self.drain_lines()
    }

    /// Decode as much of `pending` as is valid UTF-8, holding back an
    /// incomplete trailing sequence for the next delivery.
    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(prefix) = std::str::from_utf8(&self.pending[..valid]) {
                        self.buffer.push_str(prefix);
                    }
                    match err.error_len() {
                        // Incomplete sequence at the tail: wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        // Genuinely invalid bytes: replace and keep going.
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }

    /// Split complete lines out of the buffer and keep the ones that are
    /// frames. The last partial line stays buffered.
    fn drain_lines(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let Some(payload) = line.trim().strip_prefix(DATA_PREFIX) else {
                // Keep-alive blanks and other SSE fields are not frames.
                continue;
            };
            if payload.trim() == DONE_SENTINEL {
                self.finish();
                break;
            }
            frames.push(payload.to_string());
        }
        frames
    }

    /// Consume any trailing partial line at end-of-stream.
    ///
    /// Transports commonly close mid-frame without a final newline; the
    /// remainder is offered as one last candidate frame. The `data: ` prefix
    /// is stripped when present, otherwise the text is taken as-is (the
    /// service has been seen to close with a bare JSON tail).
    pub fn flush(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        // A held-back UTF-8 tail can no longer complete; decode it lossily.
        if !self.pending.is_empty() {
            self.buffer
                .push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
        let rest = std::mem::take(&mut self.buffer);
        let trimmed = rest.trim();
        if trimmed.is_empty() {
            return None;
        }
        let payload = trimmed.strip_prefix(DATA_PREFIX).unwrap_or(trimmed);
        if payload.trim() == DONE_SENTINEL {
            self.finish();
            return None;
        }
        Some(payload.to_string())
    }

    fn finish(&mut self) {
        self.finished = true;
        self.buffer.clear();
        self.pending.clear();
    }
}
