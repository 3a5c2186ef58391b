//! Tokenization of command content.
//!
//! Command content is split shell-style, but quotes are **kept** in the
//! token: `say "hello world"` yields `say` and `"hello world"`. A quote only
//! opens a quoted token at the start of a token, and the closing quote ends
//! that token immediately. Quotes in the middle of a word are ordinary
//! characters, so `it's` stays one token. Only spaces, tabs, carriage
//! returns and newlines separate tokens.
//!
//! Input with an unterminated quoted token cannot be tokenized this way;
//! [`split_arguments`] then falls back to plain whitespace splitting.

use thiserror::Error;

const QUOTES: [char; 2] = ['\'', '"'];
const WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// Returned by [`shell_split`] when a quoted token is never closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no closing quotation for {quote} opened at byte {offset}")]
pub struct UnclosedQuote {
    /// The quote character that was opened.
    pub quote: char,
    /// Byte offset of the opening quote.
    pub offset: usize,
}

/// Splits `input` into shell-like tokens, preserving quote characters.
pub fn shell_split(input: &str) -> Result<Vec<String>, UnclosedQuote> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<(char, usize)> = None;

    for (offset, ch) in input.char_indices() {
        if let Some((open, _)) = quote {
            current.push(ch);
            if ch == open {
                args.push(std::mem::take(&mut current));
                quote = None;
            }
            continue;
        }

        match ch {
            c if WHITESPACE.contains(&c) => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c if QUOTES.contains(&c) && current.is_empty() => {
                current.push(c);
                quote = Some((c, offset));
            }
            _ => current.push(ch),
        }
    }

    if let Some((quote, offset)) = quote {
        return Err(UnclosedQuote { quote, offset });
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

/// Splits command content into tokens, falling back to whitespace splitting
/// when the input is not valid shell-style text.
pub fn split_arguments(input: &str) -> Vec<String> {
    shell_split(input).unwrap_or_else(|err| {
        tracing::trace!(%err, "falling back to whitespace splitting");
        input.split_whitespace().map(str::to_owned).collect()
    })
}

/// Removes one layer of matching quotes surrounding `token`.
pub fn strip_quotes(token: &str) -> &str {
    let mut chars = token.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if first == last && QUOTES.contains(&first) => {
            &token[first.len_utf8()..token.len() - last.len_utf8()]
        }
        _ => token,
    }
}
