use serde::Deserialize;

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// Accumulates the text of a server-sent-events chat completion stream.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence, so
/// they are buffered until a full line is available.
#[derive(Debug, Default)]
pub struct SseCollector {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

impl SseCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        if self.done {
            return;
        }
        self.pending.extend_from_slice(bytes);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.handle_line(&line);
            if self.done {
                self.pending.clear();
                return;
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Flush any trailing partial line and return the collected text.
    pub fn finish(mut self) -> String {
        if !self.done && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.handle_line(&rest);
        }
        self.text
    }

    fn handle_line(&mut self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let Some(data) = line.trim().strip_prefix("data:") else {
            return;
        };
        let data = data.trim();
        if data == "[DONE]" {
            self.done = true;
            return;
        }

        // Keep-alives and malformed events are skipped.
        let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
            return;
        };
        if let Some(content) = chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
        {
            self.text.push_str(&content);
        }
    }
}
