//! Flat, tagged AST node sums. Collapses the deep ASTNode -> TokenizedASTNode
//! -> Statement -> Expression -> BinaryOperation -> PlusOperation style
//! hierarchy into two sums with the operator kind carried as a field.

use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PrefixOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    Identifier {
        name: String,
        token: Token,
    },
    Integer {
        value: i64,
        token: Token,
    },
    Float {
        value: f64,
        token: Token,
    },
    String {
        value: String,
        token: Token,
    },
    Bool {
        value: bool,
        token: Token,
    },
    Array {
        elements: Vec<Expr>,
        token: Token,
    },
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        token: Token,
    },
    PrefixOp {
        op: PrefixOp,
        value: Box<Expr>,
        token: Token,
    },
    FunctionCall {
        callee: Box<Expr>,
        args: Vec<Expr>,
        token: Token,
    },
    BracketAccess {
        target: Box<Expr>,
        index: Box<Expr>,
        token: Token,
    },
}

impl Expr {
    pub fn token(&self) -> &Token {
        match self {
            Expr::Identifier { token, .. }
            | Expr::Integer { token, .. }
            | Expr::Float { token, .. }
            | Expr::String { token, .. }
            | Expr::Bool { token, .. }
            | Expr::Array { token, .. }
            | Expr::BinaryOp { token, .. }
            | Expr::PrefixOp { token, .. }
            | Expr::FunctionCall { token, .. }
            | Expr::BracketAccess { token, .. } => token,
        }
    }
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Stmt {
    Assignment {
        target: Expr,
        value: Expr,
        token: Token,
    },
    Conditional {
        cond: Expr,
        body: Block,
        otherwise: Option<Box<Stmt>>,
        token: Token,
    },
    While {
        cond: Expr,
        body: Block,
        token: Token,
    },
    For {
        pre: Box<Stmt>,
        cond: Expr,
        post: Box<Stmt>,
        body: Block,
        token: Token,
    },
    FunctionDefinition {
        name: String,
        params: Vec<String>,
        body: Block,
        token: Token,
    },
    ReturnStatement {
        value: Expr,
        token: Token,
    },
    BreakStatement {
        token: Token,
    },
    ContinueStatement {
        token: Token,
    },
    Expression {
        expr: Expr,
    },
}

impl Stmt {
    pub fn token(&self) -> &Token {
        match self {
            Stmt::Assignment { token, .. }
            | Stmt::Conditional { token, .. }
            | Stmt::While { token, .. }
            | Stmt::For { token, .. }
            | Stmt::FunctionDefinition { token, .. }
            | Stmt::ReturnStatement { token, .. }
            | Stmt::BreakStatement { token }
            | Stmt::ContinueStatement { token } => token,
            Stmt::Expression { expr } => expr.token(),
        }
    }
}

pub type Program = Block;
