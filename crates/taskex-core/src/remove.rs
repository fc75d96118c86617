//! Span removal: delete matched task text from the message, leaving the
//! surrounding text byte-for-byte intact.

/// Remove the given `(start, end)` byte spans from `message`.
///
/// Spans may overlap or touch; overlapping groups are merged first so each
/// character is deleted at most once. Whitespace outside the spans is
/// preserved exactly.
pub fn remove_spans(message: &str, spans: &[(usize, usize)]) -> String {
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    let mut sorted: Vec<(usize, usize)> = spans
        .iter()
        .map(|&(start, end)| (start.min(message.len()), end.min(message.len())))
        .filter(|&(start, end)| start < end)
        .collect();
    sorted.sort_unstable();

    for span in sorted {
        match merged.last_mut() {
            Some(last) if span.0 <= last.1 => last.1 = last.1.max(span.1),
            _ => merged.push(span),
        }
    }

    let mut out = String::with_capacity(message.len());
    let mut cursor = 0;
    for (start, end) in merged {
        out.push_str(&message[cursor..start]);
        cursor = end;
    }
    out.push_str(&message[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_preserves_surrounding_whitespace() {
        let msg = "Text before /command1 action1 prop1=value1 and text after /command2";
        let spans = [(12, 42), (58, msg.len())];
        assert_eq!(remove_spans(msg, &spans), "Text before  and text after ");
    }

    #[test]
    fn test_no_spans_returns_message_unchanged() {
        assert_eq!(remove_spans("hello world", &[]), "hello world");
    }

    #[test]
    fn test_overlapping_spans_are_merged() {
        let msg = "abcdefghij";
        assert_eq!(remove_spans(msg, &[(2, 6), (4, 8)]), "abij");
        assert_eq!(remove_spans(msg, &[(4, 8), (2, 6)]), "abij");
    }

    #[test]
    fn test_touching_spans_are_merged() {
        let msg = "abcdefghij";
        assert_eq!(remove_spans(msg, &[(2, 4), (4, 6)]), "abghij");
    }

    #[test]
    fn test_removal_is_idempotent() {
        let msg = "keep /cmd a=1\nkeep too";
        let once = remove_spans(msg, &[(5, 13)]);
        assert_eq!(remove_spans(&once, &[]), once);
        assert_eq!(once, "keep \nkeep too");
    }

    #[test]
    fn test_out_of_range_spans_are_clamped() {
        assert_eq!(remove_spans("abc", &[(1, 99)]), "a");
        assert_eq!(remove_spans("abc", &[(5, 9)]), "abc");
    }

    #[test]
    fn test_full_span_empties_message() {
        let msg = "/bot find searchString=\"big bird\"";
        assert_eq!(remove_spans(msg, &[(0, msg.len())]), "");
    }
}
