//! Incremental `text/event-stream` frame decoder.

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Turns arbitrary byte chunks into complete frames.
///
/// Comment lines (`: keep-alive`) and `id`/`retry` fields are skipped. A frame
/// without any `data` line is not dispatched.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            // Line breaks are ASCII, so a complete line never splits a UTF-8 sequence.
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        frames
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
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_split_across_chunks_are_reassembled() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: question-chan").is_empty());
        assert!(decoder.push(b"ged\ndata: {\"a\"").is_empty());
        let frames = decoder.push(b":1}\n\n");

        assert_eq!(
            frames,
            vec![SseFrame {
                event: Some("question-changed".into()),
                data: "{\"a\":1}".into(),
            }]
        );
    }

    #[test]
    fn keep_alive_comments_are_ignored() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b": keep-alive\n\ndata: x\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, None);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn multiple_data_lines_are_joined() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"data: one\ndata:two\nid: 7\n\n");
        assert_eq!(frames[0].data, "one\ntwo");
    }

    #[test]
    fn utf8_split_inside_a_line_survives() {
        let mut decoder = SseDecoder::new();
        let text = "data: café\n\n".as_bytes();
        let (head, tail) = text.split_at(10);
        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail)[0].data, "café");
    }
}
