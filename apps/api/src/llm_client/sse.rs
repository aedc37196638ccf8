//! Server-sent event decoding for streamed chat completions.
//!
//! The gateway streams `data: {...}` lines terminated by `data: [DONE]`. Network chunks do
//! not respect line boundaries, so bytes are buffered until a full line is available.

use serde::Deserialize;
use tracing::warn;

const DONE_SENTINEL: &str = "[DONE]";

/// One decoded unit of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseItem {
    Delta(String),
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Incremental line decoder. Feed raw body chunks with `push`, then call `finish` once the
/// body ends to flush a trailing line without a newline.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseItem> {
        if self.done {
            return Vec::new();
        }
        self.pending.extend_from_slice(chunk);

        let mut items = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if let Some(item) = self.decode_line(&line[..line.len() - 1]) {
                items.push(item);
                if self.done {
                    self.pending.clear();
                    break;
                }
            }
        }
        items
    }

    pub fn finish(&mut self) -> Vec<SseItem> {
        if self.done || self.pending.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.pending);
        self.decode_line(&line).into_iter().collect()
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<SseItem> {
        let line = String::from_utf8_lossy(raw);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        // Blank lines separate events; lines starting with ':' are comments / keep-alives.
        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let data = line.strip_prefix("data:")?.trim();
        if data == DONE_SENTINEL {
            self.done = true;
            return Some(SseItem::Done);
        }

        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content)
                .filter(|content| !content.is_empty())
                .map(SseItem::Delta),
            Err(e) => {
                warn!("Skipping unparsable SSE payload: {e} (data: {data:.120})");
                None
            }
        }
    }
}
