//! Caret-style error rendering: turns a byte offset plus the original
//! source into a highlighted line-and-column excerpt. Grounded on
//! `why_lib::lexer::token::Span::to_string`, which does the same line/caret
//! composition over a `(line, col)` span; this version works from a single
//! point offset rather than a range, since every error type in this crate
//! carries a `Position` rather than a span.

use colored::Colorize;

use crate::token::Position;

/// Resolves a byte offset to a 1-based `(line, column)` pair.
fn locate(source: &str, offset: Position) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Renders `message` against `source` at `offset` as a framed, colored excerpt:
///
/// ```text
///   |
/// 3 |    x = 1 +
///   |            ^--- expected one of {NUMBER, IDENTIFIER}, got NEWLINE
///   |
/// ```
pub fn render(source: &str, offset: Position, message: impl std::fmt::Display) -> String {
    let (line, col) = locate(source, offset);
    let lines: Vec<&str> = source.lines().collect();
    let line_str = lines.get(line.saturating_sub(1)).copied().unwrap_or("");

    let margin = line.to_string().len();
    let fill = " ".repeat(margin);
    let caret_pad = " ".repeat(col.saturating_sub(1));

    format!(
        "{fill} |\n{line} |{line_str}\n{fill} |{caret_pad}{caret} {msg}\n{fill} |",
        caret = "^---".red(),
        msg = message.to_string().red(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_first_line_offset() {
        assert_eq!(locate("abc\ndef", 1), (1, 2));
    }

    #[test]
    fn locates_second_line_offset() {
        assert_eq!(locate("abc\ndef", 5), (2, 2));
    }

    #[test]
    fn render_includes_message() {
        let out = render("x = 1 +\ny = 2", 8, "unexpected end of expression");
        assert!(out.contains("unexpected end of expression"));
        assert!(out.contains("x = 1 +"));
    }
}
