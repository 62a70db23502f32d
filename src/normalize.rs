//! Spacing and capitalization normalization for merged transcript text.
//!
//! Pure functions over the buffer text and an insertion offset, handling:
//! - Whitespace collapse and punctuation spacing
//! - Boundary decisions (does this insertion need a space before/after?)
//! - Sentence-boundary capitalization
//!
//! All offsets are character offsets, so boundary inspection stays
//! well-defined for multi-byte text.

use crate::defaults::{CLOSING_PUNCTUATION, SENTENCE_ENDINGS};

/// Collapses whitespace runs to a single space, removes whitespace that
/// immediately precedes closing punctuation, and trims both ends.
///
/// Recognizers pad their output unpredictably ("hello ,  world ."); the
/// merged buffer must read like hand-typed text ("hello, world.").
pub fn clean_spacing(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !collapsed.is_empty() {
            collapsed.push(' ');
        }
        collapsed.push_str(word);
    }

    let mut cleaned = String::with_capacity(collapsed.len());
    for c in collapsed.chars() {
        if CLOSING_PUNCTUATION.contains(&c) && cleaned.ends_with(' ') {
            cleaned.pop();
        }
        cleaned.push(c);
    }
    cleaned
}

/// Returns true when inserting `text` at `insert_offset` requires a
/// separating space before it.
///
/// False at the start of the buffer, when `text` opens with punctuation,
/// or when either side of the boundary already carries whitespace.
pub fn needs_space_before(buffer: &str, insert_offset: usize, text: &str) -> bool {
    if insert_offset == 0 {
        return false;
    }
    let Some(prev) = char_before(buffer, insert_offset) else {
        return false;
    };
    if prev.is_whitespace() {
        return false;
    }
    match text.chars().next() {
        None => return false,
        Some(first) => {
            if first.is_whitespace() || CLOSING_PUNCTUATION.contains(&first) {
                return false;
            }
        }
    }
    prev.is_alphanumeric() || prev.is_ascii_punctuation()
}

/// Returns true when text inserted ending at `insert_offset` needs a
/// separating space after it, i.e. when the character already sitting at
/// that offset is a word character.
pub fn needs_space_after(buffer: &str, insert_offset: usize) -> bool {
    match char_at(buffer, insert_offset) {
        Some(next) => next.is_alphanumeric(),
        None => false,
    }
}

/// Returns true when text inserted at `insert_offset` starts a sentence:
/// at offset 0, after a line break, or after sentence-ending punctuation
/// followed only by whitespace.
pub fn should_capitalize(buffer: &str, insert_offset: usize) -> bool {
    let prefix: Vec<char> = buffer.chars().take(insert_offset).collect();
    for &c in prefix.iter().rev() {
        if c == '\n' || c == '\r' {
            return true;
        }
        if c.is_whitespace() {
            continue;
        }
        return SENTENCE_ENDINGS.contains(&c);
    }
    // Nothing but whitespace before the offset.
    true
}

/// Applies the capitalization decision to `text`.
///
/// With `capitalize` set, uppercases the first letter found after any
/// leading punctuation or space run (recognizers sometimes emit a stray
/// quote or dash before the first word). Without it, forces a leading
/// capital to lowercase, since recognizers capitalize every segment start
/// even mid-sentence.
pub fn apply_capitalization(text: &str, capitalize: bool) -> String {
    if capitalize {
        let mut out = String::with_capacity(text.len());
        let mut done = false;
        for c in text.chars() {
            if !done && c.is_alphabetic() {
                out.extend(c.to_uppercase());
                done = true;
            } else {
                out.push(c);
            }
        }
        out
    } else {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) if first.is_uppercase() => {
                let mut out = String::with_capacity(text.len());
                out.extend(first.to_lowercase());
                out.push_str(chars.as_str());
                out
            }
            _ => text.to_string(),
        }
    }
}

fn char_at(text: &str, offset: usize) -> Option<char> {
    text.chars().nth(offset)
}

fn char_before(text: &str, offset: usize) -> Option<char> {
    offset.checked_sub(1).and_then(|i| char_at(text, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_spacing_collapses_runs() {
        assert_eq!(clean_spacing("hello   world"), "hello world");
        assert_eq!(clean_spacing("hello\t\nworld"), "hello world");
    }

    #[test]
    fn test_clean_spacing_trims_ends() {
        assert_eq!(clean_spacing("  hello world  "), "hello world");
        assert_eq!(clean_spacing("\n\thello\n"), "hello");
    }

    #[test]
    fn test_clean_spacing_removes_space_before_punctuation() {
        assert_eq!(clean_spacing("hello ,  world ."), "hello, world.");
        assert_eq!(clean_spacing("wait !"), "wait!");
        assert_eq!(clean_spacing("really ?"), "really?");
        assert_eq!(clean_spacing("first ; second : third"), "first; second: third");
    }

    #[test]
    fn test_clean_spacing_never_leaves_adjacent_spaces() {
        let cleaned = clean_spacing("a  b   c    d");
        assert!(!cleaned.contains("  "));
    }

    #[test]
    fn test_clean_spacing_empty_and_whitespace_only() {
        assert_eq!(clean_spacing(""), "");
        assert_eq!(clean_spacing("   \n\t "), "");
    }

    #[test]
    fn test_needs_space_before_at_buffer_start() {
        assert!(!needs_space_before("", 0, "hello"));
        assert!(!needs_space_before("existing", 0, "hello"));
    }

    #[test]
    fn test_needs_space_before_after_word() {
        assert!(needs_space_before("hello", 5, "world"));
    }

    #[test]
    fn test_needs_space_before_after_punctuation() {
        assert!(needs_space_before("hello.", 6, "world"));
        assert!(needs_space_before("hello,", 6, "world"));
    }

    #[test]
    fn test_needs_space_before_existing_space() {
        assert!(!needs_space_before("hello ", 6, "world"));
        assert!(!needs_space_before("hello\n", 6, "world"));
    }

    #[test]
    fn test_needs_space_before_text_starts_with_punctuation() {
        assert!(!needs_space_before("hello", 5, ", world"));
        assert!(!needs_space_before("hello", 5, ". Next"));
    }

    #[test]
    fn test_needs_space_before_text_starts_with_space() {
        assert!(!needs_space_before("hello", 5, " world"));
    }

    #[test]
    fn test_needs_space_before_empty_text() {
        assert!(!needs_space_before("hello", 5, ""));
    }

    #[test]
    fn test_needs_space_before_multibyte_boundary() {
        // "café" is four chars; inserting right after it needs a space.
        assert!(needs_space_before("café", 4, "bar"));
    }

    #[test]
    fn test_needs_space_after_word_follows() {
        assert!(needs_space_after("hello", 0));
        assert!(needs_space_after("ab", 1));
    }

    #[test]
    fn test_needs_space_after_non_word_follows() {
        assert!(!needs_space_after(" rest", 0));
        assert!(!needs_space_after(".", 0));
    }

    #[test]
    fn test_needs_space_after_at_end_of_buffer() {
        assert!(!needs_space_after("hello", 5));
        assert!(!needs_space_after("", 0));
    }

    #[test]
    fn test_should_capitalize_empty_buffer() {
        assert!(should_capitalize("", 0));
    }

    #[test]
    fn test_should_capitalize_whitespace_only_prefix() {
        assert!(should_capitalize("   ", 3));
    }

    #[test]
    fn test_should_capitalize_after_sentence_end() {
        assert!(should_capitalize("First sentence.", 15));
        assert!(should_capitalize("First sentence. ", 16));
        assert!(should_capitalize("Really?", 7));
        assert!(should_capitalize("Wow!", 4));
    }

    #[test]
    fn test_should_capitalize_after_line_break() {
        assert!(should_capitalize("line one\n", 9));
        assert!(should_capitalize("line one\n  ", 11));
    }

    #[test]
    fn test_should_not_capitalize_mid_sentence() {
        assert!(!should_capitalize("hello", 5));
        assert!(!should_capitalize("hello ", 6));
        assert!(!should_capitalize("hello, ", 7));
        assert!(!should_capitalize("first; ", 7));
    }

    #[test]
    fn test_should_capitalize_ignores_text_after_offset() {
        // Only what precedes the offset matters.
        assert!(should_capitalize("Done. trailing", 6));
        assert!(!should_capitalize("word trailing", 5));
    }

    #[test]
    fn test_apply_capitalization_uppercases_first_letter() {
        assert_eq!(apply_capitalization("hello world", true), "Hello world");
    }

    #[test]
    fn test_apply_capitalization_skips_leading_punctuation() {
        assert_eq!(apply_capitalization("\"hello\"", true), "\"Hello\"");
        assert_eq!(apply_capitalization("...and then", true), "...And then");
    }

    #[test]
    fn test_apply_capitalization_already_capitalized() {
        assert_eq!(apply_capitalization("Hello", true), "Hello");
    }

    #[test]
    fn test_apply_capitalization_forces_lowercase() {
        assert_eq!(apply_capitalization("Hello world", false), "hello world");
    }

    #[test]
    fn test_apply_capitalization_lowercase_leaves_interior_capitals() {
        assert_eq!(apply_capitalization("The CT scan", false), "the CT scan");
    }

    #[test]
    fn test_apply_capitalization_lowercase_only_touches_leading_letter() {
        // A leading non-letter means nothing to force.
        assert_eq!(apply_capitalization("\"Hello\"", false), "\"Hello\"");
    }

    #[test]
    fn test_apply_capitalization_no_letters() {
        assert_eq!(apply_capitalization("123", true), "123");
        assert_eq!(apply_capitalization("...", true), "...");
        assert_eq!(apply_capitalization("", true), "");
        assert_eq!(apply_capitalization("", false), "");
    }

    #[test]
    fn test_apply_capitalization_multibyte() {
        assert_eq!(apply_capitalization("état stable", true), "État stable");
        assert_eq!(apply_capitalization("État stable", false), "état stable");
    }
}
