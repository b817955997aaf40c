//! Runtime value model. Extends the teacher's `VariableType` enum with
//! arrays and closures; equality is by value for scalars/strings and by
//! identity for arrays/functions per the data model.

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use crate::ast::Block;
use crate::interpreter::environment::Environment;

#[derive(Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(Rc<String>),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<UserFunction>),
    /// Tagged by name; dispatched by the interpreter (see `interpreter::builtins`)
    /// rather than carrying a bare fn pointer, since `print`/`input` need
    /// access to the interpreter's output sink.
    Builtin(&'static str),
    /// The value a function body produces if it falls off the end.
    Null,
}

pub struct UserFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub env: Rc<RefCell<Environment>>,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::Bool(_) => "BOOL",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Function(_) | Value::Builtin(_) => "FUNCTION",
            Value::Null => "NULL",
        }
    }

    /// Nonzero numbers, nonempty strings/arrays, and `true` are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.borrow().is_empty(),
            Value::Function(_) | Value::Builtin(_) => true,
            Value::Null => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(elems) => {
                let parts: Vec<String> = elems.borrow().iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Function(func) => write!(f, "<function {}>", func.name),
            Value::Builtin(name) => write!(f, "<builtin {name}>"),
            Value::Null => write!(f, "null"),
        }
    }
}
