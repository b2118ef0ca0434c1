use bytes::Bytes;
use serde_json::Value;

pub const DONE_SENTINEL: &str = "[DONE]";

/// In-place fix-up applied to every JSON `data:` payload of a reframed stream.
pub type EventPatch = fn(&mut Value);

/// Splits a raw SSE byte stream into frames on blank-line boundaries
/// (`\n\n`, or `\r\n\r\n` from CRLF streams).
///
/// A network chunk may hold zero, one or many frames; whatever follows the last
/// boundary stays buffered until more bytes arrive or [`finish`](Self::finish)
/// is called. Frames are decoded only once complete, so multi-byte UTF-8
/// sequences split across chunks survive intact.
#[derive(Debug, Default)]
pub struct SseFrameBuffer {
    buffer: Vec<u8>,
    scanned: usize,
}

impl SseFrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        let mut start = 0;
        // A boundary may straddle the previous chunk, so back up two bytes.
        let mut search_from = self.scanned.saturating_sub(2);

        while let Some((pos, len)) = find_boundary(&self.buffer[search_from..]) {
            let end = search_from + pos;
            frames.push(String::from_utf8_lossy(&self.buffer[start..end]).into_owned());
            start = end + len;
            search_from = start;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        frames
    }

    /// Returns the trailing unterminated frame, if any.
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Position and length of the first blank-line boundary: a `\n` followed by
/// either `\n` or `\r\n`.
fn find_boundary(haystack: &[u8]) -> Option<(usize, usize)> {
    haystack.iter().enumerate().find_map(|(i, &byte)| {
        if byte != b'\n' {
            return None;
        }
        match &haystack[i + 1..] {
            [b'\n', ..] => Some((i, 2)),
            [b'\r', b'\n', ..] => Some((i, 3)),
            _ => None,
        }
    })
}

/// Rewrites one frame: `data:` payloads are parsed, patched and re-serialized,
/// everything else passes through. Returns `None` when the frame carries no
/// lines at all.
pub fn reframe_frame(frame: &str, patch: EventPatch) -> Option<String> {
    let mut out = String::with_capacity(frame.len() + 2);
    for line in frame.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some(payload) = line.strip_prefix("data:") else {
            if !line.is_empty() {
                out.push_str(line);
                out.push('\n');
            }
            continue;
        };

        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            out.push_str("data: [DONE]\n");
            continue;
        }
        match serde_json::from_str::<Value>(payload) {
            Ok(mut event) => {
                patch(&mut event);
                out.push_str("data: ");
                out.push_str(&event.to_string());
                out.push('\n');
            }
            Err(_) => {
                // Not JSON: keep the line exactly as the vendor sent it.
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    if out.is_empty() {
        return None;
    }
    out.push('\n');
    Some(out)
}

/// Incremental reframer: frame buffer plus per-frame patching.
#[derive(Debug)]
pub struct SseReframer {
    frames: SseFrameBuffer,
    patch: EventPatch,
}

impl SseReframer {
    pub fn new(patch: EventPatch) -> Self {
        Self {
            frames: SseFrameBuffer::new(),
            patch,
        }
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.frames
            .push_bytes(chunk)
            .iter()
            .filter_map(|frame| reframe_frame(frame, self.patch))
            .map(Bytes::from)
            .collect()
    }

    /// Flushes the trailing unterminated frame through the same path.
    pub fn finish(&mut self) -> Option<Bytes> {
        let frame = self.frames.finish()?;
        reframe_frame(&frame, self.patch).map(Bytes::from)
    }
}
