//! Terminal text sanitization.
//!
//! Model output and remote error bodies are untrusted. Escape sequences in
//! them could move the cursor, rewrite the screen or touch the clipboard, so
//! everything shown in the terminal goes through [`sanitize_terminal_text`].

use std::borrow::Cow;

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Strip ANSI escape sequences and control characters, keeping `\n` and `\t`.
///
/// ```
/// use inksolve_types::sanitize_terminal_text;
///
/// assert_eq!(sanitize_terminal_text("x^2"), "x^2");
/// assert_eq!(sanitize_terminal_text("a\x1b[2Jb"), "ab");
/// ```
#[must_use]
pub fn sanitize_terminal_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_disallowed) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ESC {
            match chars.peek() {
                // CSI: parameters and intermediates until a final byte in @..~
                Some('[') => {
                    chars.next();
                    for next in chars.by_ref() {
                        if ('@'..='~').contains(&next) {
                            break;
                        }
                    }
                }
                // OSC / DCS / APC / PM / SOS: until BEL or ST (ESC \)
                Some(']' | 'P' | '_' | '^' | 'X') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == BEL {
                            break;
                        }
                        if next == ESC && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            }
        } else if !is_disallowed(c) {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

fn is_disallowed(c: char) -> bool {
    match c {
        '\n' | '\t' => false,
        '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}' => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_terminal_text;
    use std::borrow::Cow;

    #[test]
    fn clean_text_is_borrowed() {
        assert!(matches!(
            sanitize_terminal_text("\\frac{1}{2}\nx"),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn strips_osc_hyperlinks_and_bell_terminated_sequences() {
        let dirty = "see \x1b]8;;http://evil\x07here\x1b]8;;\x1b\\ now";
        assert_eq!(sanitize_terminal_text(dirty), "see here now");
    }

    #[test]
    fn strips_c0_and_c1_controls() {
        assert_eq!(sanitize_terminal_text("a\rb\u{9b}c\x7f"), "abc");
    }
}
