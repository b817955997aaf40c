//! Structured type-check error, one sub-struct per violation kind, mirroring
//! the teacher's `TypeCheckError` enum-of-structs shape.

use std::error::Error;
use std::fmt::Display;

use crate::token::{Position, Token};
use crate::types::Type;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TypeMismatch {
    pub expected: Type,
    pub actual: Type,
}

impl Display for TypeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "type mismatch: expected {:?}, got {:?}",
            self.expected, self.actual
        )
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArrayElementMismatch {
    pub expected: Type,
    pub actual: Type,
}

impl Display for ArrayElementMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Array elements must be of the same type")
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArrayAssignMismatch {
    pub array_elem: Type,
    pub value: Type,
}

impl Display for ArrayAssignMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cannot assign {:?} to array of {:?}",
            self.value, self.array_elem
        )
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NotIndexable {
    pub actual: Type,
}

impl Display for NotIndexable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type {:?} cannot be indexed", self.actual)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConditionNotBool {
    pub actual: Type,
}

impl Display for ConditionNotBool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "condition must be BOOL, got {:?}", self.actual)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InvalidOperandTypes {
    pub op: String,
    pub left: Type,
    pub right: Type,
}

impl Display for InvalidOperandTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "operator '{}' is not defined for {:?} and {:?}",
            self.op, self.left, self.right
        )
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TypeCheckError {
    TypeMismatch(TypeMismatch, Position),
    ArrayElementMismatch(ArrayElementMismatch, Position),
    ArrayAssignMismatch(ArrayAssignMismatch, Position),
    NotIndexable(NotIndexable, Position),
    ConditionNotBool(ConditionNotBool, Position),
    InvalidOperandTypes(InvalidOperandTypes, Position),
}

impl TypeCheckError {
    pub fn pos(&self) -> Position {
        match self {
            TypeCheckError::TypeMismatch(_, p)
            | TypeCheckError::ArrayElementMismatch(_, p)
            | TypeCheckError::ArrayAssignMismatch(_, p)
            | TypeCheckError::NotIndexable(_, p)
            | TypeCheckError::ConditionNotBool(_, p)
            | TypeCheckError::InvalidOperandTypes(_, p) => *p,
        }
    }

    pub fn at(token: &Token) -> Position {
        token.pos
    }
}

impl Display for TypeCheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeCheckError::TypeMismatch(e, _) => write!(f, "{e}"),
            TypeCheckError::ArrayElementMismatch(e, _) => write!(f, "{e}"),
            TypeCheckError::ArrayAssignMismatch(e, _) => write!(f, "{e}"),
            TypeCheckError::NotIndexable(e, _) => write!(f, "{e}"),
            TypeCheckError::ConditionNotBool(e, _) => write!(f, "{e}"),
            TypeCheckError::InvalidOperandTypes(e, _) => write!(f, "{e}"),
        }
    }
}

impl Error for TypeCheckError {}
