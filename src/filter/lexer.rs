//! Tokenization of filter and PATCH path text.
//!
//! Quoted string literals are swapped for numbered placeholders before any
//! structural scanning, so brackets, whitespace and keywords inside literals
//! never influence tokenization. Placeholders are decoded back only when a
//! literal is resolved.

use crate::error::ValidationError;

const PLACEHOLDER_MARK: char = '\u{0}';

/// A structural token with its byte offset in the encoded text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Open(char, usize),
    Close(char, usize),
    Word(String, usize),
}

impl Token {
    fn start(&self) -> usize {
        match self {
            Self::Open(_, start) | Self::Close(_, start) | Self::Word(_, start) => *start,
        }
    }

    fn end(&self) -> usize {
        match self {
            Self::Open(c, start) | Self::Close(c, start) => start + c.len_utf8(),
            Self::Word(word, start) => start + word.len(),
        }
    }
}

/// Input text with its quoted literals replaced by placeholders.
#[derive(Debug, Clone)]
pub(crate) struct Encoded {
    text: String,
    literals: Vec<String>,
}

impl Encoded {
    /// Replace every quoted literal of `input` with a placeholder.
    ///
    /// An unterminated literal swallows the rest of the input; it is reported by
    /// [`check_literals`](Self::check_literals) so that bracket errors in the
    /// leading part are reported first.
    pub(crate) fn new(input: &str) -> (Self, Option<String>) {
        let mut text = String::with_capacity(input.len());
        let mut literals = Vec::new();
        let mut chars = input.chars();
        let mut unterminated = None;

        while let Some(c) = chars.next() {
            if c != '"' {
                text.push(c);
                continue;
            }
            let mut literal = String::from('"');
            let mut escaped = false;
            let mut closed = false;
            for c in chars.by_ref() {
                literal.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    closed = true;
                    break;
                }
            }
            if !closed {
                unterminated = Some(literal);
                break;
            }
            text.push(PLACEHOLDER_MARK);
            text.push_str(&literals.len().to_string());
            text.push(PLACEHOLDER_MARK);
            literals.push(literal);
        }

        (Self { text, literals }, unterminated)
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    /// The quoted literal a placeholder word stands for.
    pub(crate) fn literal(&self, word: &str) -> Option<&str> {
        let index = word
            .strip_prefix(PLACEHOLDER_MARK)?
            .strip_suffix(PLACEHOLDER_MARK)?
            .parse::<usize>()
            .ok()?;
        self.literals.get(index).map(String::as_str)
    }

    /// `text` with every placeholder replaced by its original literal.
    pub(crate) fn decode(&self, text: &str) -> String {
        let mut decoded = String::with_capacity(text.len());
        let mut parts = text.split(PLACEHOLDER_MARK);
        if let Some(first) = parts.next() {
            decoded.push_str(first);
        }
        let mut inside = true;
        for part in parts {
            if inside {
                match part.parse::<usize>().ok().and_then(|i| self.literals.get(i)) {
                    Some(literal) => decoded.push_str(literal),
                    None => decoded.push_str(part),
                }
            } else {
                decoded.push_str(part);
            }
            inside = !inside;
        }
        decoded
    }

    /// The input text a token slice was read from, literals included.
    pub(crate) fn render(&self, tokens: &[Token]) -> String {
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return String::new();
        };
        self.text
            .get(first.start()..last.end())
            .map(|text| self.decode(text))
            .unwrap_or_default()
    }
}

/// Verify that round and square brackets of the encoded text are balanced.
pub(crate) fn check_brackets(encoded: &Encoded, expression: &str) -> Result<(), ValidationError> {
    let mut stack = Vec::new();
    for c in encoded.text().chars() {
        match c {
            '(' | '[' => stack.push(c),
            ')' | ']' => {
                let expected = if c == ')' { '(' } else { '[' };
                if stack.pop() != Some(expected) {
                    return Err(ValidationError::BracketNotOpenedOrClosed {
                        bracket: c,
                        expression: expression.to_string(),
                    });
                }
            }
            _ => {}
        }
    }
    match stack.pop() {
        Some(bracket) => Err(ValidationError::BracketNotOpenedOrClosed {
            bracket,
            expression: expression.to_string(),
        }),
        None => Ok(()),
    }
}

/// Split encoded text into brackets and whitespace-separated words.
pub(crate) fn tokenize(encoded: &Encoded) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut word_start = 0;
    for (offset, c) in encoded.text().char_indices() {
        match c {
            '(' | '[' | ')' | ']' => {
                if !word.is_empty() {
                    tokens.push(Token::Word(std::mem::take(&mut word), word_start));
                }
                tokens.push(if matches!(c, '(' | '[') {
                    Token::Open(c, offset)
                } else {
                    Token::Close(c, offset)
                });
            }
            c if c.is_whitespace() => {
                if !word.is_empty() {
                    tokens.push(Token::Word(std::mem::take(&mut word), word_start));
                }
            }
            c => {
                if word.is_empty() {
                    word_start = offset;
                }
                word.push(c);
            }
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word, word_start));
    }
    tokens
}

/// Index of the bracket closing the one opened at `open`.
pub(crate) fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::Open(..) => depth += 1,
            Token::Close(..) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            Token::Word(..) => {}
        }
    }
    None
}
