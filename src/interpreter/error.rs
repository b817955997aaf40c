use std::error::Error;
use std::fmt::Display;

use crate::token::Position;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RuntimeError {
    UndefinedName { name: String, pos: Position },
    OperatorTypeMismatch { op: String, pos: Position },
    DivisionByZero { pos: Position },
    IndexOutOfRange { index: i64, len: usize, pos: Position },
    NotCallable { pos: Position },
    NotSubscriptable { pos: Position },
    LoopControlOutsideLoop { keyword: &'static str, pos: Position },
    Io { message: String, pos: Position },
    InvalidArgument { message: String, pos: Position },
}

impl RuntimeError {
    pub fn pos(&self) -> Position {
        match self {
            RuntimeError::UndefinedName { pos, .. }
            | RuntimeError::OperatorTypeMismatch { pos, .. }
            | RuntimeError::DivisionByZero { pos }
            | RuntimeError::IndexOutOfRange { pos, .. }
            | RuntimeError::NotCallable { pos }
            | RuntimeError::NotSubscriptable { pos }
            | RuntimeError::LoopControlOutsideLoop { pos, .. }
            | RuntimeError::Io { pos, .. }
            | RuntimeError::InvalidArgument { pos, .. } => *pos,
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::UndefinedName { name, .. } => write!(f, "name '{name}' is not defined"),
            RuntimeError::OperatorTypeMismatch { op, .. } => {
                write!(f, "operator '{op}' is not defined for the given operand types")
            }
            RuntimeError::DivisionByZero { .. } => write!(f, "division by zero"),
            RuntimeError::IndexOutOfRange { index, len, .. } => {
                write!(f, "index {index} out of range for length {len}")
            }
            RuntimeError::NotCallable { .. } => write!(f, "value is not callable"),
            RuntimeError::NotSubscriptable { .. } => write!(f, "value is not subscriptable"),
            RuntimeError::LoopControlOutsideLoop { keyword, .. } => {
                write!(f, "'{keyword}' used outside of a loop")
            }
            RuntimeError::Io { message, .. } => write!(f, "I/O error: {message}"),
            RuntimeError::InvalidArgument { message, .. } => write!(f, "{message}"),
        }
    }
}

impl Error for RuntimeError {}
