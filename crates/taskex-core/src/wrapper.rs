//! Suggestion-wrapper detection: `keyword: [/cmd ..., /cmd ...]` groups that
//! mark the contained commands as suggested rather than to be run.

use crate::chars::{is_newline, is_space};
use crate::tokenizer::RawTask;
use serde::{Deserialize, Serialize};

/// One wrapper configuration. A delimiter means the bracket group may hold
/// several commands separated by it; no delimiter means the group wraps
/// exactly one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapperRule {
    pub keyword: String,
    #[serde(default)]
    pub delimiter: Option<char>,
}

/// A detected wrapper: which raw tasks sit inside it, plus its own span
/// (keyword through closing bracket) for removal.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperMatch {
    /// Indices into the raw task list.
    pub task_indices: Vec<usize>,
    pub start: usize,
    pub end: usize,
}

/// Find the wrapper group in `message`, if any.
///
/// The first keyword occurrence outside any task span wins; if it is not
/// followed by a well-formed `: [ ... ]` group the whole detection yields
/// nothing (later occurrences are not retried).
pub fn detect_wrapper(
    message: &str,
    tasks: &[RawTask],
    rule: &WrapperRule,
) -> Option<WrapperMatch> {
    if rule.keyword.is_empty() {
        return None;
    }

    // Keyword text inside an already-matched command (i.e. inside a quoted
    // property value) must not open a wrapper.
    let keyword_start = message.match_indices(&rule.keyword).find_map(|(i, _)| {
        let ke = i + rule.keyword.len();
        let inside = tasks.iter().any(|t| i < t.end && ke > t.start);
        (!inside).then_some(i)
    })?;

    let mut cursor = keyword_start + rule.keyword.len();
    cursor = skip_blank(message, cursor);
    if !message[cursor..].starts_with(':') {
        return None;
    }
    cursor = skip_blank(message, cursor + 1);
    if !message[cursor..].starts_with('[') {
        return None;
    }
    let bracket = cursor;

    let first = tasks.iter().position(|t| t.start > bracket)?;
    // Only whitespace may sit between `[` and the first command.
    if !message[bracket + 1..tasks[first].start]
        .chars()
        .all(is_space)
    {
        return None;
    }

    let mut indices = vec![first];
    if let Some(delim) = rule.delimiter {
        for next in first + 1..tasks.len() {
            let gap = &message[tasks[next - 1].end..tasks[next].start];
            if is_delimiter_gap(gap, delim) {
                indices.push(next);
            } else {
                break;
            }
        }
    }

    // The closing `]` must follow the last contained command with only
    // whitespace in between. With no delimiter configured, a second command
    // in the group lands in this gap and disqualifies the match.
    let last_end = tasks[*indices.last().expect("non-empty")].end;
    let mut close = last_end;
    for ch in message[last_end..].chars() {
        if is_space(ch) {
            close += ch.len_utf8();
            continue;
        }
        if ch == ']' {
            return Some(WrapperMatch {
                task_indices: indices,
                start: keyword_start,
                end: close + 1,
            });
        }
        return None;
    }
    None
}

/// Adjacent wrapped commands may be separated only by the delimiter and
/// optional spaces; a newline would have closed the command anyway.
fn is_delimiter_gap(gap: &str, delim: char) -> bool {
    let mut seen_delim = false;
    for ch in gap.chars() {
        if ch == delim && !seen_delim {
            seen_delim = true;
        } else if !is_space(ch) {
            return false;
        }
    }
    seen_delim
}

fn skip_blank(message: &str, mut pos: usize) -> usize {
    for ch in message[pos..].chars() {
        if is_space(ch) || is_newline(ch) {
            pos += ch.len_utf8();
        } else {
            break;
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{tokenize, TokenizerOptions};

    fn rule(keyword: &str, delimiter: Option<char>) -> WrapperRule {
        WrapperRule {
            keyword: keyword.into(),
            delimiter,
        }
    }

    fn raw_tasks(message: &str, delimiter: Option<char>) -> Vec<RawTask> {
        tokenize(
            message,
            &TokenizerOptions {
                bracket_commands: true,
                bracket_delimiter: delimiter,
                ..TokenizerOptions::default()
            },
        )
    }

    #[test]
    fn test_delimited_group_wraps_both_commands() {
        let msg = "suggested:[/a,/b]";
        let tasks = raw_tasks(msg, Some(','));
        let m = detect_wrapper(msg, &tasks, &rule("suggested", Some(','))).unwrap();
        assert_eq!(m.task_indices, vec![0, 1]);
        assert_eq!(&msg[m.start..m.end], msg);
    }

    #[test]
    fn test_no_delimiter_disqualifies_multi_command_group() {
        let msg = "suggested:[/a,/b]";
        let tasks = raw_tasks(msg, None);
        assert_eq!(detect_wrapper(msg, &tasks, &rule("suggested", None)), None);
    }

    #[test]
    fn test_no_delimiter_single_command_matches() {
        let msg = "recommend: [/bot find q='x']";
        let tasks = raw_tasks(msg, None);
        let m = detect_wrapper(msg, &tasks, &rule("recommend", None)).unwrap();
        assert_eq!(m.task_indices, vec![0]);
        assert_eq!(m.start, 0);
        assert_eq!(m.end, msg.len());
    }

    #[test]
    fn test_whitespace_around_group_is_tolerated() {
        let msg = "take it or leave it suggested : [ /a , /b ] done";
        let tasks = raw_tasks(msg, Some(','));
        let m = detect_wrapper(msg, &tasks, &rule("suggested", Some(','))).unwrap();
        assert_eq!(m.task_indices, vec![0, 1]);
        assert_eq!(&msg[m.start..m.end], "suggested : [ /a , /b ]");
    }

    #[test]
    fn test_text_between_bracket_and_command_cancels() {
        let msg = "suggested: [maybe /a]";
        let tasks = raw_tasks(msg, Some(','));
        assert_eq!(
            detect_wrapper(msg, &tasks, &rule("suggested", Some(','))),
            None
        );
    }

    #[test]
    fn test_missing_colon_or_bracket_cancels() {
        let msg = "suggested [/a]";
        let tasks = raw_tasks(msg, Some(','));
        assert_eq!(
            detect_wrapper(msg, &tasks, &rule("suggested", Some(','))),
            None
        );

        let msg = "suggested: /a";
        let tasks = raw_tasks(msg, Some(','));
        assert_eq!(
            detect_wrapper(msg, &tasks, &rule("suggested", Some(','))),
            None
        );
    }

    #[test]
    fn test_keyword_inside_property_value_is_ignored() {
        let msg = "/note put text='suggested: [/a]'\nsuggested: [/b]";
        let tasks = raw_tasks(msg, Some(','));
        assert_eq!(tasks.len(), 2);
        let m = detect_wrapper(msg, &tasks, &rule("suggested", Some(','))).unwrap();
        // The wrapper is the real one on the second line, around `/b`.
        assert_eq!(m.task_indices, vec![1]);
        assert_eq!(&msg[m.start..m.end], "suggested: [/b]");
    }

    #[test]
    fn test_first_failed_occurrence_is_not_retried() {
        let msg = "suggested things\nsuggested: [/a]";
        let tasks = raw_tasks(msg, Some(','));
        assert_eq!(
            detect_wrapper(msg, &tasks, &rule("suggested", Some(','))),
            None
        );
    }

    #[test]
    fn test_wrapper_span_contains_all_task_spans() {
        let msg = "pick one: suggested: [/a, /b, /c]";
        let tasks = raw_tasks(msg, Some(','));
        let m = detect_wrapper(msg, &tasks, &rule("suggested", Some(','))).unwrap();
        assert_eq!(m.task_indices.len(), 3);
        for &i in &m.task_indices {
            assert!(m.start <= tasks[i].start && tasks[i].end <= m.end);
        }
    }
}
