//! Source -> token stream, including synthetic INDENT/DEDENT framing derived
//! from a whitespace stack. The pattern table follows the maximal-munch,
//! ordered-rule-set style of the hand-rolled teacher lexer (keywords before
//! identifiers, multi-character operators before their single-character
//! prefixes); the indentation bookkeeping follows the stack algorithm used
//! by the language's own reference lexer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use once_cell::sync::Lazy;

use crate::token::{Position, Token, TokenKind};

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("if", TokenKind::If),
        ("elif", TokenKind::Elif),
        ("else", TokenKind::Else),
        ("while", TokenKind::While),
        ("for", TokenKind::For),
        ("return", TokenKind::Return),
        ("break", TokenKind::Break),
        ("continue", TokenKind::Continue),
        ("def", TokenKind::Def),
        ("and", TokenKind::And),
        ("or", TokenKind::Or),
        ("not", TokenKind::Not),
        ("true", TokenKind::Boolean),
        ("false", TokenKind::Boolean),
    ])
});

/// Multi-character punctuation, checked before their single-character
/// prefixes so that e.g. `==` is never lexed as `=` followed by `=`.
const MULTI_CHAR_OPS: &[(&str, TokenKind)] = &[
    ("==", TokenKind::Equal),
    ("!=", TokenKind::NotEqual),
    ("<=", TokenKind::LessEq),
    (">=", TokenKind::GreaterEq),
];

const SINGLE_CHAR_OPS: &[(char, TokenKind)] = &[
    ('(', TokenKind::LParen),
    (')', TokenKind::RParen),
    ('{', TokenKind::LBrace),
    ('}', TokenKind::RBrace),
    ('[', TokenKind::LBracket),
    (']', TokenKind::RBracket),
    (',', TokenKind::Comma),
    (':', TokenKind::Colon),
    (';', TokenKind::Semicolon),
    ('.', TokenKind::Dot),
    ('=', TokenKind::Assign),
    ('+', TokenKind::Plus),
    ('-', TokenKind::Minus),
    ('*', TokenKind::Mul),
    ('/', TokenKind::Div),
    ('<', TokenKind::Less),
    ('>', TokenKind::Greater),
];

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LexError {
    /// Stack top has no frame matching the new line's indent width.
    IndentationMismatch { pos: Position, width: usize },
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::IndentationMismatch { pos, width } => write!(
                f,
                "indentation mismatch at offset {pos}: width {width} does not match any enclosing block"
            ),
        }
    }
}

impl Error for LexError {}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `true` if `c` cannot continue an identifier/keyword — used for the
/// trailing "not identifier-continuation" keyword assertion.
fn is_word_boundary(c: Option<char>) -> bool {
    !matches!(c, Some(c) if is_ident_continue(c))
}

struct Lexer<'src> {
    src: &'src str,
    chars: Vec<char>,
    pos: usize,
    byte_offsets: Vec<usize>,
    tokens: Vec<Token>,
    indent_stack: Vec<usize>,
    at_bol: bool,
}

impl<'src> Lexer<'src> {
    fn new(src: &'src str) -> Self {
        let chars: Vec<char> = src.chars().collect();
        let mut byte_offsets = Vec::with_capacity(chars.len() + 1);
        let mut off = 0;
        for c in &chars {
            byte_offsets.push(off);
            off += c.len_utf8();
        }
        byte_offsets.push(off);
        Self {
            src,
            chars,
            pos: 0,
            byte_offsets,
            tokens: Vec::new(),
            indent_stack: vec![0],
            at_bol: true,
        }
    }

    fn byte_pos(&self) -> Position {
        self.byte_offsets[self.pos]
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn starts_with(&self, s: &str) -> bool {
        let mut it = s.chars();
        let mut i = 0;
        loop {
            match it.next() {
                None => return true,
                Some(expected) => match self.peek_at(i) {
                    Some(actual) if actual == expected => i += 1,
                    _ => return false,
                },
            }
        }
    }

    fn push(&mut self, kind: TokenKind, literal: Option<String>, pos: Position) {
        self.tokens.push(Token::new(kind, literal, pos));
    }

    fn last_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|t| t.kind)
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            if self.at_bol {
                self.handle_indentation()?;
                self.at_bol = false;
                continue;
            }

            let Some(c) = self.peek() else { break };

            if c == '\n' {
                let pos = self.byte_pos();
                self.advance();
                self.push(TokenKind::Newline, None, pos);
                self.at_bol = true;
                continue;
            }

            if c == ' ' || c == '\t' {
                self.advance();
                continue;
            }

            if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            if c == '"' {
                self.lex_string()?;
                continue;
            }

            if c.is_ascii_digit() {
                self.lex_numeric();
                continue;
            }

            if is_ident_start(c) {
                self.lex_alphanumeric();
                continue;
            }

            self.lex_operator_or_illegal();
        }

        if self.last_kind() != Some(TokenKind::Newline) {
            self.push(TokenKind::Newline, None, self.byte_pos());
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, None, self.byte_pos());
            log::trace!("lexer: dedent at eof");
        }

        self.push(TokenKind::Eof, None, self.byte_pos());
        Ok(self.tokens)
    }

    /// Counts indent steps (one tab or exactly four spaces each) at the
    /// start of a line, then emits INDENT/DEDENT relative to the stack.
    /// Blank and comment-only lines are skipped without touching the stack.
    fn handle_indentation(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let mut width = 0usize;
        loop {
            if self.starts_with("\t") {
                self.pos += 1;
                width += 1;
            } else if self.starts_with("    ") {
                self.pos += 4;
                width += 1;
            } else {
                break;
            }
        }

        match self.peek() {
            None | Some('\n') | Some('#') => {
                // blank or comment-only line: leave indentation stack untouched
                return Ok(());
            }
            _ => {}
        }

        let pos = self.byte_offsets[start];
        let top = *self.indent_stack.last().unwrap();
        if width > top {
            self.indent_stack.push(width);
            self.push(TokenKind::Indent, None, pos);
            log::trace!("lexer: indent to {width} at {pos}");
        } else if width < top {
            while *self.indent_stack.last().unwrap() > width {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent, None, pos);
                log::trace!("lexer: dedent towards {width} at {pos}");
            }
            if *self.indent_stack.last().unwrap() != width {
                return Err(LexError::IndentationMismatch { pos, width });
            }
        }
        Ok(())
    }

    fn lex_numeric(&mut self) {
        let start = self.pos;
        let pos = self.byte_pos();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        // INVALID_IDENTIFIER: a digit-led name, e.g. `3x`.
        if matches!(self.peek(), Some(c) if is_ident_start(c)) {
            while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
                self.advance();
            }
            let text: String = self.chars[start..self.pos].iter().collect();
            self.push(TokenKind::InvalidIdentifier, Some(text), pos);
            return;
        }

        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            let text: String = self.chars[start..self.pos].iter().collect();
            self.push(TokenKind::Float, Some(text), pos);
            return;
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        self.push(TokenKind::Number, Some(text), pos);
    }

    fn lex_alphanumeric(&mut self) {
        let start = self.pos;
        let pos = self.byte_pos();
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();

        if let Some(kind) = KEYWORDS.get(text.as_str()) {
            if is_word_boundary(self.peek()) {
                self.push(*kind, Some(text), pos);
                return;
            }
        }
        self.push(TokenKind::Identifier, Some(text), pos);
    }

    fn lex_string(&mut self) -> Result<(), LexError> {
        let pos = self.byte_pos();
        let triple = self.starts_with("\"\"\"");
        if triple {
            self.pos += 3;
        } else {
            self.advance();
        }

        let mut value = String::new();
        loop {
            if triple {
                if self.starts_with("\"\"\"") {
                    self.pos += 3;
                    break;
                }
            } else if self.peek() == Some('"') {
                self.advance();
                break;
            }

            match self.advance() {
                None => break,
                Some('\\') => {
                    let escaped = self.advance();
                    match escaped {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some('b') => value.push('\u{8}'),
                        Some('f') => value.push('\u{c}'),
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => value.push('\\'),
                    }
                }
                Some(c) => value.push(c),
            }
        }

        self.push(TokenKind::String, Some(value), pos);
        Ok(())
    }

    fn lex_operator_or_illegal(&mut self) {
        let pos = self.byte_pos();
        for (pat, kind) in MULTI_CHAR_OPS {
            if self.starts_with(pat) {
                self.pos += pat.chars().count();
                self.push(*kind, None, pos);
                return;
            }
        }

        if let Some(c) = self.peek() {
            if let Some((_, kind)) = SINGLE_CHAR_OPS.iter().find(|(ch, _)| *ch == c) {
                self.advance();
                self.push(*kind, None, pos);
                return;
            }
        }

        let illegal = self.advance().unwrap();
        self.push(TokenKind::IllegalCharacter, Some(illegal.to_string()), pos);
    }
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    log::debug!("lexing {} bytes of source", src.len());
    Lexer::new(src).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_assignment() {
        use TokenKind::*;
        assert_eq!(kinds("x=10\n"), vec![Identifier, Assign, Number, Newline, Eof]);
    }

    #[test]
    fn indent_dedent_balance() {
        use TokenKind::*;
        let toks = kinds("if true:\n    x=1\ny=2\n");
        assert_eq!(
            toks,
            vec![
                If, Boolean, Colon, Newline, Indent, Identifier, Assign, Number, Newline, Dedent,
                Identifier, Assign, Number, Newline, Eof
            ]
        );
    }

    #[test]
    fn multiple_dedents_at_eof() {
        use TokenKind::*;
        let toks = kinds("if true:\n    if true:\n        x=1\n");
        let dedents = toks.iter().filter(|k| **k == Dedent).count();
        let indents = toks.iter().filter(|k| **k == Indent).count();
        assert_eq!(dedents, indents);
    }

    #[test]
    fn indentation_mismatch_errors() {
        let result = tokenize("if true:\n    x=1\n  y=2\n");
        assert!(matches!(result, Err(LexError::IndentationMismatch { .. })));
    }

    #[test]
    fn illegal_character_does_not_abort() {
        let toks = kinds("x = 1 $ 2\n");
        assert!(toks.contains(&TokenKind::IllegalCharacter));
        assert_eq!(*toks.last().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn digit_led_name_is_invalid_identifier() {
        assert_eq!(kinds("3x\n")[0], TokenKind::InvalidIdentifier);
    }

    #[test]
    fn keyword_boundary_disambiguation() {
        assert_eq!(kinds("if_x\n"), vec![TokenKind::Identifier, TokenKind::Newline, TokenKind::Eof]);
    }

    #[test]
    fn triple_quoted_string_allows_newlines() {
        let toks = tokenize("x = \"\"\"a\nb\"\"\"\n").unwrap();
        let s = toks.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(s.literal.as_deref(), Some("a\nb"));
    }

    #[test]
    fn multi_char_ops_before_prefixes() {
        assert_eq!(
            kinds("a<=b\n"),
            vec![
                TokenKind::Identifier,
                TokenKind::LessEq,
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn comment_to_end_of_line() {
        assert_eq!(
            kinds("x=1 # trailing\n"),
            vec![
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
    }
}
