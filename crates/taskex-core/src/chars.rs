//! Character classes used by the text tokenizer.
//!
//! Command and action names are ASCII-only on purpose: the vocabulary is
//! ASCII, and treating accented letters or CJK as name characters would let
//! ordinary prose bleed into a half-started command.

/// True only for `\n` and `\r`.
pub fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r')
}

/// True only for space and tab. Newlines are deliberately excluded; they
/// terminate commands rather than separating sections.
pub fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t')
}

/// True only for ASCII `[A-Za-z0-9]`.
pub fn is_alphanum(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newline_class() {
        assert!(is_newline('\n'));
        assert!(is_newline('\r'));
        assert!(!is_newline(' '));
        assert!(!is_newline('\t'));
    }

    #[test]
    fn test_space_class() {
        assert!(is_space(' '));
        assert!(is_space('\t'));
        assert!(!is_space('\n'));
        assert!(!is_space('a'));
    }

    #[test]
    fn test_alphanum_is_ascii_only() {
        assert!(is_alphanum('a'));
        assert!(is_alphanum('Z'));
        assert!(is_alphanum('7'));
        assert!(!is_alphanum('é'));
        assert!(!is_alphanum('日'));
        assert!(!is_alphanum('😀'));
        assert!(!is_alphanum('_'));
        assert!(!is_alphanum('/'));
    }
}
