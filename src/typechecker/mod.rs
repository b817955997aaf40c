//! Single-pass static checker. Mirrors the teacher's recursive
//! `check_statement`/`check_expression` dispatch, but propagates failures
//! through `Result` instead of `panic!`/`unreachable!`, and treats `Unknown`
//! as absorbing rather than rejecting.

pub mod error;

use std::collections::HashMap;

use crate::ast::{BinOp, Block, Expr, PrefixOp, Program, Stmt};
use crate::token::Token;
use crate::types::Type;
use error::{
    ArrayAssignMismatch, ArrayElementMismatch, ConditionNotBool, InvalidOperandTypes, NotIndexable,
    TypeCheckError, TypeMismatch,
};

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Equal => "==",
        BinOp::NotEqual => "!=",
        BinOp::Less => "<",
        BinOp::Greater => ">",
        BinOp::LessEq => "<=",
        BinOp::GreaterEq => ">=",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

fn is_concrete_numeric(t: &Type) -> bool {
    matches!(t, Type::Int | Type::Float)
}

/// A chain of scope frames; function bodies push a child frame, `if`/
/// `while`/`for` bodies share their enclosing function's frame.
pub struct TypeChecker {
    scopes: Vec<HashMap<String, Type>>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn check_program(&mut self, program: &Program) -> Result<(), TypeCheckError> {
        self.check_block(program)
    }

    fn lookup(&self, name: &str) -> Type {
        for scope in self.scopes.iter().rev() {
            if let Some(t) = scope.get(name) {
                return t.clone();
            }
        }
        Type::Unknown
    }

    fn bind(&mut self, name: &str, ty: Type) {
        for scope in self.scopes.iter_mut().rev() {
            if scope.contains_key(name) {
                scope.insert(name.to_string(), ty);
                return;
            }
        }
        self.scopes
            .last_mut()
            .expect("at least one scope frame always exists")
            .insert(name.to_string(), ty);
    }

    fn check_block(&mut self, block: &Block) -> Result<(), TypeCheckError> {
        for stmt in block {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_condition(&mut self, cond: &Expr, token: &Token) -> Result<(), TypeCheckError> {
        let ty = self.check_expr(cond)?;
        if matches!(ty, Type::Bool | Type::Unknown) {
            Ok(())
        } else {
            Err(TypeCheckError::ConditionNotBool(
                ConditionNotBool { actual: ty },
                token.pos,
            ))
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<(), TypeCheckError> {
        match stmt {
            Stmt::Assignment {
                target,
                value,
                token,
            } => {
                let value_ty = self.check_expr(value)?;
                match target {
                    Expr::Identifier { name, .. } => {
                        self.bind(name, value_ty);
                        Ok(())
                    }
                    Expr::BracketAccess { target, index, .. } => {
                        let target_ty = self.check_expr(target)?;
                        let idx_ty = self.check_expr(index)?;
                        if !matches!(idx_ty, Type::Int | Type::Unknown) {
                            return Err(TypeCheckError::TypeMismatch(
                                TypeMismatch {
                                    expected: Type::Int,
                                    actual: idx_ty,
                                },
                                token.pos,
                            ));
                        }
                        match target_ty {
                            Type::Array(elem) => {
                                if elem.does_eq(&value_ty) {
                                    Ok(())
                                } else {
                                    Err(TypeCheckError::ArrayAssignMismatch(
                                        ArrayAssignMismatch {
                                            array_elem: *elem,
                                            value: value_ty,
                                        },
                                        token.pos,
                                    ))
                                }
                            }
                            Type::Unknown => Ok(()),
                            other => Err(TypeCheckError::NotIndexable(
                                NotIndexable { actual: other },
                                token.pos,
                            )),
                        }
                    }
                    _ => unreachable!("assignment target is always Identifier or BracketAccess (I1)"),
                }
            }
            Stmt::Conditional {
                cond,
                body,
                otherwise,
                token,
            } => {
                self.check_condition(cond, token)?;
                self.check_block(body)?;
                if let Some(o) = otherwise {
                    self.check_stmt(o)?;
                }
                Ok(())
            }
            Stmt::While { cond, body, token } => {
                self.check_condition(cond, token)?;
                self.check_block(body)
            }
            Stmt::For {
                pre,
                cond,
                post,
                body,
                token,
            } => {
                self.check_stmt(pre)?;
                self.check_condition(cond, token)?;
                self.check_stmt(post)?;
                self.check_block(body)
            }
            Stmt::FunctionDefinition {
                name,
                params,
                body,
                ..
            } => {
                self.bind(name, Type::Function);
                self.scopes.push(HashMap::new());
                for p in params {
                    self.scopes
                        .last_mut()
                        .unwrap()
                        .insert(p.clone(), Type::Unknown);
                }
                let result = self.check_block(body);
                self.scopes.pop();
                result
            }
            Stmt::ReturnStatement { value, .. } => self.check_expr(value).map(|_| ()),
            Stmt::BreakStatement { .. } | Stmt::ContinueStatement { .. } => Ok(()),
            Stmt::Expression { expr } => self.check_expr(expr).map(|_| ()),
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> Result<Type, TypeCheckError> {
        match expr {
            Expr::Identifier { name, .. } => Ok(self.lookup(name)),
            Expr::Integer { .. } => Ok(Type::Int),
            Expr::Float { .. } => Ok(Type::Float),
            Expr::String { .. } => Ok(Type::String),
            Expr::Bool { .. } => Ok(Type::Bool),
            Expr::Array { elements, token } => {
                if elements.is_empty() {
                    return Ok(Type::Array(Box::new(Type::Unknown)));
                }
                let first = self.check_expr(&elements[0])?;
                for e in &elements[1..] {
                    let t = self.check_expr(e)?;
                    if core::mem::discriminant(&t) != core::mem::discriminant(&first) {
                        return Err(TypeCheckError::ArrayElementMismatch(
                            ArrayElementMismatch {
                                expected: first,
                                actual: t,
                            },
                            token.pos,
                        ));
                    }
                }
                Ok(Type::Array(Box::new(first)))
            }
            Expr::BinaryOp {
                op,
                left,
                right,
                token,
            } => self.check_binary(*op, left, right, token),
            Expr::PrefixOp { op, value, .. } => self.check_prefix(*op, value),
            Expr::FunctionCall { callee, args, .. } => {
                self.check_expr(callee)?;
                for a in args {
                    self.check_expr(a)?;
                }
                Ok(Type::Unknown)
            }
            Expr::BracketAccess {
                target,
                index,
                token,
            } => {
                let target_ty = self.check_expr(target)?;
                self.check_expr(index)?;
                match target_ty {
                    Type::Array(elem) => Ok(*elem),
                    Type::String => Ok(Type::String),
                    Type::Unknown => Ok(Type::Unknown),
                    other => Err(TypeCheckError::NotIndexable(
                        NotIndexable { actual: other },
                        token.pos,
                    )),
                }
            }
        }
    }

    fn check_prefix(&mut self, op: PrefixOp, value: &Expr) -> Result<Type, TypeCheckError> {
        let ty = self.check_expr(value)?;
        match op {
            PrefixOp::Neg => {
                if is_concrete_numeric(&ty) {
                    Ok(ty)
                } else {
                    Ok(Type::Unknown)
                }
            }
            PrefixOp::Not => Ok(Type::Bool),
        }
    }

    fn check_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        token: &Token,
    ) -> Result<Type, TypeCheckError> {
        let l = self.check_expr(left)?;
        let r = self.check_expr(right)?;
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                self.check_arith(op, l, r, token)
            }
            BinOp::Equal | BinOp::NotEqual => {
                if l.does_eq(&r) {
                    Ok(Type::Bool)
                } else {
                    Err(TypeCheckError::InvalidOperandTypes(
                        InvalidOperandTypes {
                            op: op_symbol(op).to_string(),
                            left: l,
                            right: r,
                        },
                        token.pos,
                    ))
                }
            }
            BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
                if l.does_eq(&r) && l.is_numeric() && r.is_numeric() {
                    Ok(Type::Bool)
                } else {
                    Err(TypeCheckError::InvalidOperandTypes(
                        InvalidOperandTypes {
                            op: op_symbol(op).to_string(),
                            left: l,
                            right: r,
                        },
                        token.pos,
                    ))
                }
            }
            BinOp::And | BinOp::Or => {
                if matches!(l, Type::Bool | Type::Unknown) && matches!(r, Type::Bool | Type::Unknown)
                {
                    Ok(Type::Bool)
                } else {
                    Err(TypeCheckError::InvalidOperandTypes(
                        InvalidOperandTypes {
                            op: op_symbol(op).to_string(),
                            left: l,
                            right: r,
                        },
                        token.pos,
                    ))
                }
            }
        }
    }

    fn check_arith(
        &self,
        op: BinOp,
        l: Type,
        r: Type,
        token: &Token,
    ) -> Result<Type, TypeCheckError> {
        match (&l, &r) {
            (Type::Unknown, other) | (other, Type::Unknown) => {
                if is_concrete_numeric(other) {
                    Ok(other.clone())
                } else {
                    Ok(Type::Unknown)
                }
            }
            (Type::Int, Type::Int) => Ok(Type::Int),
            (Type::Float, Type::Float) => Ok(Type::Float),
            (Type::String, Type::String) if op == BinOp::Add => Ok(Type::String),
            _ => Err(TypeCheckError::InvalidOperandTypes(
                InvalidOperandTypes {
                    op: op_symbol(op).to_string(),
                    left: l,
                    right: r,
                },
                token.pos,
            )),
        }
    }
}

pub fn check(program: &Program) -> Result<(), TypeCheckError> {
    TypeChecker::new().check_program(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn check_src(src: &str) -> Result<(), TypeCheckError> {
        check(&parse(tokenize(src).unwrap()).unwrap())
    }

    #[test]
    fn array_element_mismatch_is_rejected() {
        let err = check_src("a=[1,true]\n").unwrap_err();
        assert!(matches!(err, TypeCheckError::ArrayElementMismatch(..)));
    }

    #[test]
    fn array_assign_mismatch_is_rejected() {
        let err = check_src("arr=[1,2]\narr[0]=\"x\"\n").unwrap_err();
        assert!(matches!(err, TypeCheckError::ArrayAssignMismatch(..)));
    }

    #[test]
    fn unknown_identifier_is_permissive() {
        check_src("print(undefined_name)\n").unwrap();
    }

    #[test]
    fn numeric_arithmetic_accepted() {
        check_src("x=1+2\ny=1.0+2.0\n").unwrap();
    }

    #[test]
    fn mixed_int_float_is_rejected() {
        let err = check_src("x=1+2.0\n").unwrap_err();
        assert!(matches!(err, TypeCheckError::InvalidOperandTypes(..)));
    }

    #[test]
    fn string_concatenation_accepted() {
        check_src("x=\"a\"+\"b\"\n").unwrap();
    }

    #[test]
    fn condition_must_be_bool() {
        let err = check_src("if 1:\n    x=1\n").unwrap_err();
        assert!(matches!(err, TypeCheckError::ConditionNotBool(..)));
    }

    #[test]
    fn function_params_are_unknown_and_permissive() {
        check_src("def f(a,b):\n    return a+b\nf(1,2)\n").unwrap();
    }
}
