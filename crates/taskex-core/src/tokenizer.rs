//! Single-pass text tokenizer for inline `/command action key=value` syntax.
//!
//! The tokenizer consumes one character per transition with no backtracking
//! and no lookahead; each step depends only on the current character, the
//! previous character, and the buffer collected for the current section.
//! That makes it safe to drive incrementally while a model is still
//! streaming: feed characters with [`Tokenizer::push`] and flush the tail
//! with [`Tokenizer::finish`].
//!
//! Malformed input is never an error. Anything that stops looking like a
//! command is silently cancelled and scanning resumes, so a model can emit
//! arbitrary garbage without poisoning the rest of the message.

use crate::chars::{is_alphanum, is_newline, is_space};
use crate::task::{PropertyMap, PropertyValue};

/// A raw command match with parsed sections, before vocabulary resolution.
///
/// `start`/`end` are byte offsets; `&message[start..end]` is the exact
/// matched text, excluding the terminator and any whitespace before it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTask {
    pub command: String,
    pub action: Option<String>,
    pub properties: PropertyMap,
    pub start: usize,
    pub end: usize,
}

/// Tokenizer behavior switches supplied by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct TokenizerOptions {
    /// Cap on the action buffer. Overrunning it completes the task early
    /// with whatever was committed so far rather than rejecting it; runaway
    /// model output still surfaces as a usable (if partial) match.
    pub max_action_len: Option<usize>,
    /// Wrapper-bracket awareness. When set, `/` may also start a command
    /// right after `[` (or after the delimiter inside an open bracket), and
    /// `]` or the delimiter terminate a command the way a newline does.
    /// Enabled by the orchestrator only when a suggestion wrapper is
    /// configured.
    pub bracket_commands: bool,
    /// Delimiter separating commands inside a wrapper bracket group.
    pub bracket_delimiter: Option<char>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Outside,
    Code,
    Command,
    Action,
    PropName,
    PropValue,
}

#[derive(Debug, Clone, Copy)]
enum Fence {
    Backticks(usize),
    Tag,
}

#[derive(Debug, Clone)]
enum ValueKind {
    /// Quoted string literal; the char is the terminating quote.
    Quoted(char),
    Number { seen_dot: bool },
    /// `null`, `true` or `false`, matched character by character.
    Literal(&'static str),
}

#[derive(Debug, Default)]
struct Pending {
    start: usize,
    /// Byte offset just past the last content character seen so far;
    /// section separators and terminators do not advance it, which keeps
    /// the reported span free of trailing whitespace.
    end: usize,
    command: Option<String>,
    action: Option<String>,
    properties: PropertyMap,
    /// Committed property name awaiting its value.
    prop_name: Option<String>,
}

/// The state machine. One instance per message (or per stream).
pub struct Tokenizer {
    opts: TokenizerOptions,
    section: Section,
    buf: String,
    prev: Option<char>,
    /// Byte offset of the next character to be pushed.
    pos: usize,
    pending: Option<Pending>,
    tasks: Vec<RawTask>,
    // code fence bookkeeping
    fence: Option<Fence>,
    fence_opening: bool,
    close_run: usize,
    tag_close_progress: usize,
    // outside bookkeeping
    awaiting_tag_close: bool,
    bracket_open: bool,
    // property value bookkeeping
    value_kind: Option<ValueKind>,
    value_buf: String,
}

const CODE_OPEN: &str = "<code";
const CODE_CLOSE: &str = "</code>";

impl Tokenizer {
    pub fn new(opts: TokenizerOptions) -> Self {
        Self {
            opts,
            section: Section::Outside,
            buf: String::new(),
            prev: None,
            pos: 0,
            pending: None,
            tasks: Vec::new(),
            fence: None,
            fence_opening: false,
            close_run: 0,
            tag_close_progress: 0,
            awaiting_tag_close: false,
            bracket_open: false,
            value_kind: None,
            value_buf: String::new(),
        }
    }

    /// Feed one character.
    pub fn push(&mut self, ch: char) {
        match self.section {
            Section::Outside => self.outside(ch),
            Section::Code => self.code(ch),
            Section::Command => self.command(ch),
            Section::Action => self.action(ch),
            Section::PropName => self.prop_name(ch),
            Section::PropValue => self.prop_value(ch),
        }
        self.pos += ch.len_utf8();
        self.prev = Some(ch);
    }

    /// Flush the tail and return the collected matches. End of input behaves
    /// like a final terminator for whatever section is pending.
    pub fn finish(mut self) -> Vec<RawTask> {
        match self.section {
            Section::Outside | Section::Code => {}
            Section::Command => {
                self.commit_command();
                self.complete();
            }
            Section::Action => {
                self.commit_action();
                self.complete();
            }
            Section::PropName => {
                // A dangling name with no `=` is malformed and aborts the task.
                if self.buf.is_empty() {
                    self.complete();
                } else {
                    self.cancel();
                }
            }
            Section::PropValue => match self.value_kind.clone() {
                Some(ValueKind::Quoted(_)) | None => self.cancel(),
                Some(ValueKind::Number { .. }) => {
                    if self.commit_number() {
                        self.complete();
                    } else {
                        self.cancel();
                    }
                }
                Some(ValueKind::Literal(lit)) => {
                    if self.value_buf == lit {
                        self.commit_literal(lit);
                        self.complete();
                    } else {
                        self.cancel();
                    }
                }
            },
        }
        self.tasks
    }

    /// Record `ch` as task content, advancing the span end past it.
    fn mark(&mut self, ch: char) {
        let end = self.pos + ch.len_utf8();
        if let Some(p) = self.pending.as_mut() {
            p.end = end;
        }
    }

    // ---- outside ---------------------------------------------------------

    fn outside(&mut self, ch: char) {
        if self.awaiting_tag_close {
            if ch == '>' {
                self.enter_fence(Fence::Tag);
                return;
            }
            if is_alphanum(ch) {
                // A longer tag name (`<codex...`), not a code tag.
                self.awaiting_tag_close = false;
                self.buf.push(ch);
                return;
            }
            if is_newline(ch) {
                self.awaiting_tag_close = false;
                self.buf.clear();
                self.bracket_open = false;
                return;
            }
            if ch == '`' {
                self.awaiting_tag_close = false;
                self.enter_fence(Fence::Backticks(1));
                return;
            }
            // Attribute text between `<code` and `>` is tolerated.
            self.buf.push(ch);
            return;
        }

        if ch == '`' {
            self.enter_fence(Fence::Backticks(1));
            return;
        }
        if is_newline(ch) {
            self.buf.clear();
            self.bracket_open = false;
            return;
        }
        if is_space(ch) {
            self.buf.clear();
            return;
        }
        if ch == '/' && self.command_can_start() {
            self.buf.clear();
            self.pending = Some(Pending {
                start: self.pos,
                end: self.pos + 1,
                ..Pending::default()
            });
            self.section = Section::Command;
            return;
        }
        if self.opts.bracket_commands {
            if ch == '[' {
                self.bracket_open = true;
            } else if ch == ']' {
                self.bracket_open = false;
            }
        }
        self.buf.push(ch);
        if self.buf.ends_with(CODE_OPEN) {
            self.awaiting_tag_close = true;
        }
    }

    fn command_can_start(&self) -> bool {
        if self.buf.is_empty() {
            return true;
        }
        match self.prev {
            Some(p) if is_space(p) || is_newline(p) => true,
            Some('[') if self.opts.bracket_commands => true,
            Some(p) => {
                self.opts.bracket_commands
                    && self.bracket_open
                    && self.opts.bracket_delimiter == Some(p)
            }
            None => true,
        }
    }

    // ---- code fences -----------------------------------------------------

    fn enter_fence(&mut self, fence: Fence) {
        self.buf.clear();
        self.section = Section::Code;
        self.fence = Some(fence);
        self.fence_opening = matches!(fence, Fence::Backticks(_));
        self.close_run = 0;
        self.tag_close_progress = 0;
    }

    fn code(&mut self, ch: char) {
        match self.fence {
            Some(Fence::Backticks(n)) => {
                if self.fence_opening {
                    if ch == '`' {
                        // Still widening the opening run; defers the
                        // single-vs-triple fence ambiguity.
                        self.fence = Some(Fence::Backticks(n + 1));
                        return;
                    }
                    if n == 1 && is_newline(ch) {
                        // Lone backtick at end of line: abandoned fence.
                        self.exit_fence();
                        return;
                    }
                    self.fence_opening = false;
                    // fall through into body handling for this char
                }
                if ch == '`' {
                    self.close_run += 1;
                    if self.close_run >= n {
                        self.exit_fence();
                    }
                } else {
                    self.close_run = 0;
                }
            }
            Some(Fence::Tag) => {
                let expected = CODE_CLOSE.as_bytes()[self.tag_close_progress] as char;
                if ch == expected {
                    self.tag_close_progress += 1;
                    if self.tag_close_progress == CODE_CLOSE.len() {
                        self.exit_fence();
                    }
                } else {
                    self.tag_close_progress = usize::from(ch == '<');
                }
            }
            // Defensive: no fence recorded, drop straight back out.
            None => self.exit_fence(),
        }
    }

    fn exit_fence(&mut self) {
        self.fence = None;
        self.fence_opening = false;
        self.close_run = 0;
        self.tag_close_progress = 0;
        self.buf.clear();
        self.section = Section::Outside;
    }

    // ---- command / action / property names -------------------------------

    fn command(&mut self, ch: char) {
        if is_alphanum(ch) {
            self.buf.push(ch);
            self.mark(ch);
            return;
        }
        if is_newline(ch) {
            self.commit_command();
            self.bracket_open = false;
            self.complete();
            return;
        }
        if is_space(ch) {
            self.commit_command();
            self.section = Section::Action;
            return;
        }
        if self.bracket_terminator(ch) {
            self.commit_command();
            self.terminate_bracket(ch);
            return;
        }
        self.cancel();
    }

    fn commit_command(&mut self) {
        let command = std::mem::take(&mut self.buf);
        if let Some(p) = self.pending.as_mut() {
            p.command = Some(command);
        }
    }

    fn action(&mut self, ch: char) {
        if is_alphanum(ch) {
            if let Some(max) = self.opts.max_action_len {
                if self.buf.len() >= max {
                    // Overlong but syntactically fine: surface the partial
                    // task instead of rejecting it.
                    self.complete();
                    return;
                }
            }
            self.buf.push(ch);
            self.mark(ch);
            return;
        }
        if ch == '=' {
            // The buffer was actually the first property's name.
            let name = std::mem::take(&mut self.buf);
            if let Some(p) = self.pending.as_mut() {
                p.prop_name = Some(name);
            }
            self.mark(ch);
            self.begin_value();
            return;
        }
        if is_space(ch) {
            if !self.buf.is_empty() {
                self.commit_action();
                self.section = Section::PropName;
            }
            return;
        }
        if is_newline(ch) {
            self.commit_action();
            self.bracket_open = false;
            self.complete();
            return;
        }
        if self.bracket_terminator(ch) {
            self.commit_action();
            self.terminate_bracket(ch);
            return;
        }
        self.cancel();
    }

    fn commit_action(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let action = std::mem::take(&mut self.buf);
        if let Some(p) = self.pending.as_mut() {
            p.action = Some(action);
        }
    }

    fn prop_name(&mut self, ch: char) {
        if is_alphanum(ch) {
            self.buf.push(ch);
            self.mark(ch);
            return;
        }
        if ch == '=' {
            let name = std::mem::take(&mut self.buf);
            if let Some(p) = self.pending.as_mut() {
                p.prop_name = Some(name);
            }
            self.mark(ch);
            self.begin_value();
            return;
        }
        if is_space(ch) && self.buf.is_empty() {
            return;
        }
        if is_newline(ch) && self.buf.is_empty() {
            self.bracket_open = false;
            self.complete();
            return;
        }
        if self.buf.is_empty() && self.bracket_terminator(ch) {
            self.terminate_bracket(ch);
            return;
        }
        // Malformed property name aborts the whole task.
        self.cancel();
    }

    // ---- property values -------------------------------------------------

    fn begin_value(&mut self) {
        self.section = Section::PropValue;
        self.value_kind = None;
        self.value_buf.clear();
    }

    fn prop_value(&mut self, ch: char) {
        let Some(kind) = self.value_kind.clone() else {
            // First character decides the literal grammar.
            match ch {
                '\'' | '"' => {
                    self.value_kind = Some(ValueKind::Quoted(ch));
                    self.mark(ch);
                }
                '-' | '0'..='9' => {
                    self.value_kind = Some(ValueKind::Number { seen_dot: false });
                    self.value_buf.push(ch);
                    self.mark(ch);
                }
                'n' => {
                    self.value_kind = Some(ValueKind::Literal("null"));
                    self.value_buf.push(ch);
                    self.mark(ch);
                }
                't' => {
                    self.value_kind = Some(ValueKind::Literal("true"));
                    self.value_buf.push(ch);
                    self.mark(ch);
                }
                'f' => {
                    self.value_kind = Some(ValueKind::Literal("false"));
                    self.value_buf.push(ch);
                    self.mark(ch);
                }
                _ => self.cancel(),
            }
            return;
        };

        match kind {
            ValueKind::Quoted(quote) => {
                self.mark(ch);
                if ch == quote && !self.trailing_backslash_escapes() {
                    let raw = std::mem::take(&mut self.value_buf);
                    self.commit_value(PropertyValue::Str(unescape(&raw, quote)));
                    self.section = Section::PropName;
                    self.buf.clear();
                } else {
                    // Anything goes inside the literal, including the other
                    // quote character, whitespace and newlines.
                    self.value_buf.push(ch);
                }
            }
            ValueKind::Number { seen_dot } => {
                if ch.is_ascii_digit() {
                    self.value_buf.push(ch);
                    self.mark(ch);
                } else if ch == '.' && !seen_dot {
                    self.value_kind = Some(ValueKind::Number { seen_dot: true });
                    self.value_buf.push(ch);
                    self.mark(ch);
                } else if is_space(ch) {
                    if self.commit_number() {
                        self.section = Section::PropName;
                        self.buf.clear();
                    } else {
                        self.cancel();
                    }
                } else if is_newline(ch) {
                    if self.commit_number() {
                        self.bracket_open = false;
                        self.complete();
                    } else {
                        self.cancel();
                    }
                } else if self.bracket_terminator(ch) {
                    if self.commit_number() {
                        self.terminate_bracket(ch);
                    } else {
                        self.cancel();
                    }
                } else {
                    // Second `-`, second `.`, a letter, anything else.
                    self.cancel();
                }
            }
            ValueKind::Literal(lit) => {
                if self.value_buf.len() < lit.len() {
                    let expected = lit.as_bytes()[self.value_buf.len()] as char;
                    if ch == expected {
                        self.value_buf.push(ch);
                        self.mark(ch);
                    } else {
                        self.cancel();
                    }
                } else if is_space(ch) {
                    self.commit_literal(lit);
                    self.section = Section::PropName;
                    self.buf.clear();
                } else if is_newline(ch) {
                    self.commit_literal(lit);
                    self.bracket_open = false;
                    self.complete();
                } else if self.bracket_terminator(ch) {
                    self.commit_literal(lit);
                    self.terminate_bracket(ch);
                } else {
                    // `nullx` and friends are not literals.
                    self.cancel();
                }
            }
        }
    }

    /// Odd run of trailing backslashes means the upcoming quote is escaped.
    fn trailing_backslash_escapes(&self) -> bool {
        let run = self
            .value_buf
            .chars()
            .rev()
            .take_while(|&c| c == '\\')
            .count();
        run % 2 == 1
    }

    fn commit_number(&mut self) -> bool {
        let raw = std::mem::take(&mut self.value_buf);
        if !raw.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }
        match raw.parse::<f64>() {
            Ok(n) => {
                self.commit_value(PropertyValue::Num(n));
                true
            }
            Err(_) => false,
        }
    }

    fn commit_literal(&mut self, lit: &str) {
        self.value_buf.clear();
        let value = match lit {
            "null" => PropertyValue::Null,
            "true" => PropertyValue::Bool(true),
            _ => PropertyValue::Bool(false),
        };
        self.commit_value(value);
    }

    fn commit_value(&mut self, value: PropertyValue) {
        self.value_kind = None;
        if let Some(p) = self.pending.as_mut() {
            if let Some(name) = p.prop_name.take() {
                p.properties.insert(name, value);
            }
        }
    }

    // ---- bracket groups --------------------------------------------------

    /// Inside an open wrapper bracket, `]` and the configured delimiter
    /// terminate a command the way a newline does.
    fn bracket_terminator(&self, ch: char) -> bool {
        if !self.opts.bracket_commands || !self.bracket_open {
            return false;
        }
        ch == ']' || self.opts.bracket_delimiter == Some(ch)
    }

    fn terminate_bracket(&mut self, ch: char) {
        if ch == ']' {
            self.bracket_open = false;
        }
        self.complete();
    }

    // ---- emit / discard --------------------------------------------------

    fn complete(&mut self) {
        if let Some(p) = self.pending.take() {
            if let Some(command) = p.command {
                self.tasks.push(RawTask {
                    command,
                    action: p.action,
                    properties: p.properties,
                    start: p.start,
                    end: p.end,
                });
            }
        }
        self.reset_section();
    }

    fn cancel(&mut self) {
        self.pending = None;
        self.reset_section();
    }

    fn reset_section(&mut self) {
        self.section = Section::Outside;
        self.buf.clear();
        self.value_kind = None;
        self.value_buf.clear();
        self.awaiting_tag_close = false;
    }
}

/// Undo `\'`, `\"` and `\\` escapes; unrecognized escapes are kept verbatim.
fn unescape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) if next == quote || next == '\\' || next == '\'' || next == '"' => {
                    out.push(next)
                }
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Tokenize a whole message in one shot.
pub fn tokenize(message: &str, opts: &TokenizerOptions) -> Vec<RawTask> {
    let mut tokenizer = Tokenizer::new(opts.clone());
    for ch in message.chars() {
        tokenizer.push(ch);
    }
    tokenizer.finish()
}
