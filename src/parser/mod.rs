//! Recursive-descent parser with operator precedence climbing. Follows the
//! `FromTokens`-style single-pass-over-a-token-vector dispatch of the
//! teacher's hand-rolled parser, generalized to the full precedence ladder
//! and postfix-chaining rules this grammar needs.

use std::error::Error;
use std::fmt::Display;

use crate::ast::{BinOp, Block, Expr, PrefixOp, Program, Stmt};
use crate::token::{Position, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParseError {
    pub expected: Vec<TokenKind>,
    pub found: TokenKind,
    pub pos: Position,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let expected = self
            .expected
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "expected one of {{{expected}}}, got {:?} at offset {}",
            self.found, self.pos
        )
    }
}

impl Error for ParseError {}

/// Sentinel returned by `parse_*` once the first error has latched: every
/// subsequent production is a no-op that returns this same unit failure.
type PResult<T> = Result<T, ()>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    error: Option<ParseError>,
}

pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokens);
    match parser.parse_program() {
        Ok(program) => Ok(program),
        Err(()) => Err(parser.error.expect("latched error must be set on failure")),
    }
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            error: None,
        }
    }

    // --- token stream primitives -------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn fail(&mut self, expected: &[TokenKind]) -> PResult<Token> {
        if self.error.is_none() {
            self.error = Some(ParseError {
                expected: expected.to_vec(),
                found: self.peek().kind,
                pos: self.peek().pos,
            });
        }
        Err(())
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.error.is_some() {
            return Err(());
        }
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.fail(&[kind])
        }
    }

    fn skip_newlines(&mut self) {
        while self.error.is_none() && self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    // --- entry point ----------------------------------------------------

    fn parse_program(&mut self) -> PResult<Program> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while self.error.is_none() && !self.check(TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
        if self.error.is_some() {
            return Err(());
        }
        Ok(stmts)
    }

    fn parse_block(&mut self) -> PResult<Block> {
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let mut stmts = Vec::new();
        self.skip_newlines();
        while self.error.is_none() && !self.check(TokenKind::Dedent) {
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
        self.expect(TokenKind::Dedent)?;
        if self.error.is_some() {
            return Err(());
        }
        Ok(stmts)
    }

    // --- statements -------------------------------------------------------

    fn parse_statement(&mut self) -> PResult<Stmt> {
        if self.error.is_some() {
            return Err(());
        }
        match self.peek().kind {
            TokenKind::Def => self.parse_function_definition(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_conditional(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Break => {
                let token = self.advance();
                Ok(Stmt::BreakStatement { token })
            }
            TokenKind::Continue => {
                let token = self.advance();
                Ok(Stmt::ContinueStatement { token })
            }
            _ => self.parse_assignment_or_expression(),
        }
    }

    /// Tries an assignment target (identifier + zero or more `[expr]`
    /// segments) followed by `=`; on mismatch, rewinds and re-parses the
    /// same prefix as a plain expression statement.
    fn parse_assignment_or_expression(&mut self) -> PResult<Stmt> {
        let checkpoint = self.pos;

        if self.check(TokenKind::Identifier) {
            let ident_tok = self.advance();
            let mut target = Expr::Identifier {
                name: ident_tok.text().to_string(),
                token: ident_tok.clone(),
            };
            while self.check(TokenKind::LBracket) {
                let tok = self.advance();
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket)?;
                target = Expr::BracketAccess {
                    target: Box::new(target),
                    index: Box::new(index),
                    token: tok,
                };
            }

            if self.error.is_none() && self.check(TokenKind::Assign) {
                let token = self.advance();
                let value = self.parse_expression()?;
                return Ok(Stmt::Assignment {
                    target,
                    value,
                    token,
                });
            }

            // not an assignment: rewind and fall through to a full
            // expression parse (handles calls chained onto the identifier).
            self.error = None;
            self.pos = checkpoint;
        }

        let expr = self.parse_expression()?;
        Ok(Stmt::Expression { expr })
    }

    fn parse_function_definition(&mut self) -> PResult<Stmt> {
        let token = self.expect(TokenKind::Def)?;
        let name_tok = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let p = self.expect(TokenKind::Identifier)?;
                params.push(p.text().to_string());
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::FunctionDefinition {
            name: name_tok.text().to_string(),
            params,
            body,
            token,
        })
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let token = self.expect(TokenKind::Return)?;
        if self.check(TokenKind::Newline) {
            return self
                .fail(&[
                    TokenKind::Number,
                    TokenKind::Float,
                    TokenKind::String,
                    TokenKind::Boolean,
                    TokenKind::Identifier,
                    TokenKind::LParen,
                    TokenKind::LBracket,
                ])
                .map(|_| unreachable!());
        }
        let value = self.parse_expression()?;
        Ok(Stmt::ReturnStatement { value, token })
    }

    fn parse_conditional(&mut self) -> PResult<Stmt> {
        let token = self.expect(TokenKind::If)?;
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        let otherwise = self.parse_elif_or_else()?;
        Ok(Stmt::Conditional {
            cond,
            body,
            otherwise,
            token,
        })
    }

    fn parse_elif_or_else(&mut self) -> PResult<Option<Box<Stmt>>> {
        if self.check(TokenKind::Elif) {
            let token = self.advance();
            let cond = self.parse_expression()?;
            let body = self.parse_block()?;
            let otherwise = self.parse_elif_or_else()?;
            return Ok(Some(Box::new(Stmt::Conditional {
                cond,
                body,
                otherwise,
                token,
            })));
        }
        if self.check(TokenKind::Else) {
            let token = self.advance();
            let body = self.parse_block()?;
            return Ok(Some(Box::new(Stmt::Conditional {
                cond: Expr::Bool {
                    value: true,
                    token: token.clone(),
                },
                body,
                otherwise: None,
                token,
            })));
        }
        Ok(None)
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let token = self.expect(TokenKind::While)?;
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::While { cond, body, token })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let token = self.expect(TokenKind::For)?;
        let pre = self.parse_statement()?;
        self.expect(TokenKind::Semicolon)?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        let post = self.parse_statement()?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            pre: Box::new(pre),
            cond,
            post: Box::new(post),
            body,
            token,
        })
    }

    // --- expressions: precedence ladder, low to high ---------------------

    fn parse_expression(&mut self) -> PResult<Expr> {
        self.parse_logical()
    }

    fn parse_logical(&mut self) -> PResult<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::And => BinOp::And,
                TokenKind::Or => BinOp::Or,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_comparison()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Equal => BinOp::Equal,
                TokenKind::NotEqual => BinOp::NotEqual,
                TokenKind::Less => BinOp::Less,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_additive()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Mul => BinOp::Mul,
                TokenKind::Div => BinOp::Div,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                token,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        match self.peek().kind {
            TokenKind::Minus => {
                let token = self.advance();
                let value = self.parse_unary()?;
                Ok(Expr::PrefixOp {
                    op: PrefixOp::Neg,
                    value: Box::new(value),
                    token,
                })
            }
            TokenKind::Not => {
                let token = self.advance();
                let value = self.parse_unary()?;
                Ok(Expr::PrefixOp {
                    op: PrefixOp::Not,
                    value: Box::new(value),
                    token,
                })
            }
            _ => self.parse_postfix(),
        }
    }

    /// Elemental expression plus greedy postfix chaining: `[idx]` and
    /// `(args)` suffixes may repeat in any order (`f(x)[0](y)`).
    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_elemental()?;
        loop {
            match self.peek().kind {
                TokenKind::LBracket => {
                    let token = self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::BracketAccess {
                        target: Box::new(expr),
                        index: Box::new(index),
                        token,
                    };
                }
                TokenKind::LParen => {
                    let token = self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if self.check(TokenKind::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::FunctionCall {
                        callee: Box::new(expr),
                        args,
                        token,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_elemental(&mut self) -> PResult<Expr> {
        match self.peek().kind {
            TokenKind::Number => {
                let token = self.advance();
                let value: i64 = token.text().parse().unwrap_or(0);
                Ok(Expr::Integer { value, token })
            }
            TokenKind::Float => {
                let token = self.advance();
                let value: f64 = token.text().parse().unwrap_or(0.0);
                Ok(Expr::Float { value, token })
            }
            TokenKind::String => {
                let token = self.advance();
                Ok(Expr::String {
                    value: token.text().to_string(),
                    token,
                })
            }
            TokenKind::Boolean => {
                let token = self.advance();
                Ok(Expr::Bool {
                    value: token.text() == "true",
                    token,
                })
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Expr::Identifier {
                    name: token.text().to_string(),
                    token,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                let token = self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if self.check(TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::Array { elements, token })
            }
            _ => self.fail(&[
                TokenKind::Number,
                TokenKind::Float,
                TokenKind::String,
                TokenKind::Boolean,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::LBracket,
            ])
            .map(|_| unreachable!()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> Result<Program, ParseError> {
        parse(tokenize(src).unwrap())
    }

    #[test]
    fn parses_assignment() {
        let program = parse_src("x=10\n").unwrap();
        assert_eq!(program.len(), 1);
        assert!(matches!(program[0], Stmt::Assignment { .. }));
    }

    #[test]
    fn parses_operator_precedence() {
        let program = parse_src("x=1+2*3\n").unwrap();
        let Stmt::Assignment { value, .. } = &program[0] else {
            panic!("expected assignment")
        };
        // multiplication binds tighter, so the outer node is the addition
        assert!(matches!(
            value,
            Expr::BinaryOp {
                op: BinOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn parses_bracket_access_chain() {
        let program = parse_src("x=a[0][1]\n").unwrap();
        let Stmt::Assignment { value, .. } = &program[0] else {
            panic!("expected assignment")
        };
        assert!(matches!(value, Expr::BracketAccess { .. }));
    }

    #[test]
    fn parses_elif_else_as_nested_conditional() {
        let program =
            parse_src("if a:\n    x=1\nelif b:\n    x=2\nelse:\n    x=3\n").unwrap();
        let Stmt::Conditional { otherwise, .. } = &program[0] else {
            panic!("expected conditional")
        };
        let elif = otherwise.as_ref().unwrap();
        let Stmt::Conditional {
            cond, otherwise, ..
        } = elif.as_ref()
        else {
            panic!("expected nested conditional")
        };
        assert!(matches!(cond, Expr::Identifier { .. }));
        let els = otherwise.as_ref().unwrap();
        let Stmt::Conditional { cond, otherwise, .. } = els.as_ref() else {
            panic!("expected else-as-conditional")
        };
        assert!(matches!(cond, Expr::Bool { value: true, .. }));
        assert!(otherwise.is_none());
    }

    #[test]
    fn parses_for_loop() {
        let program = parse_src("for i=1; i<=5; i=i+1:\n    sum=sum+i\n").unwrap();
        assert!(matches!(program[0], Stmt::For { .. }));
    }

    #[test]
    fn first_error_latches() {
        let err = parse_src("x=\n").unwrap_err();
        assert_eq!(err.found, TokenKind::Newline);
    }

    #[test]
    fn parses_function_definition_and_call() {
        let program = parse_src("def f(a,b):\n    return a+b\nf(1,2)\n").unwrap();
        assert!(matches!(program[0], Stmt::FunctionDefinition { .. }));
        assert!(matches!(program[1], Stmt::Expression { .. }));
    }
}
