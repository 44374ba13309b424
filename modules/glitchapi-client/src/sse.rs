//! Minimal SSE framing for the `/glitches/stream` endpoint.

use serde::Deserialize;

/// One event on the discovery stream. Exactly one of `item` /
/// `progress_label` / `finished` is meaningful per event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamEvent {
    pub item: Option<crate::WireItem>,
    pub progress_label: Option<String>,
    pub finished: bool,
}

/// Append a chunk to `buf` and drain any complete `data:` payloads.
///
/// SSE frames are newline-delimited and a frame may arrive split across
/// chunks, so incomplete trailing lines stay in the buffer. Blank
/// separators, comments, and `event:`/`id:` fields are skipped.
pub(crate) fn drain_data_lines(buf: &mut String, chunk: &str) -> Vec<String> {
    buf.push_str(chunk);

    let mut payloads = Vec::new();
    while let Some(pos) = buf.find('\n') {
        let line: String = buf.drain(..=pos).collect();
        let line = line.trim();
        if let Some(payload) = line.strip_prefix("data:") {
            let payload = payload.trim();
            if !payload.is_empty() {
                payloads.push(payload.to_string());
            }
        }
    }
    payloads
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_complete_data_lines() {
        let mut buf = String::new();
        let payloads = drain_data_lines(&mut buf, "data: {\"finished\":true}\n\n");
        assert_eq!(payloads, vec!["{\"finished\":true}"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn keeps_partial_frame_in_buffer() {
        let mut buf = String::new();
        assert!(drain_data_lines(&mut buf, "data: {\"prog").is_empty());
        let payloads = drain_data_lines(&mut buf, "ressLabel\":\"laptop @ a.test\"}\n");
        assert_eq!(payloads, vec!["{\"progressLabel\":\"laptop @ a.test\"}"]);
    }

    #[test]
    fn skips_comments_and_event_fields() {
        let mut buf = String::new();
        let payloads = drain_data_lines(
            &mut buf,
            ": keep-alive\nevent: glitch\ndata: {\"finished\":false}\n\n",
        );
        assert_eq!(payloads, vec!["{\"finished\":false}"]);
    }

    #[test]
    fn drains_multiple_frames_from_one_chunk() {
        let mut buf = String::new();
        let payloads = drain_data_lines(&mut buf, "data: {\"a\":1}\n\ndata: {\"b\":2}\n\n");
        assert_eq!(payloads.len(), 2);
    }

    #[test]
    fn stream_event_decodes_item_variant() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"item":{"url":"https://shop.test/x","name":"Widget"}}"#,
        )
        .unwrap();
        assert!(event.item.is_some());
        assert!(!event.finished);
    }
}
