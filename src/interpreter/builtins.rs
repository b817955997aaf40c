//! Builtin function table, registered in the root environment at startup.
//! `print` and `input` are dispatched directly by the interpreter (they need
//! its output sink / stdin); everything else is a pure function over values.

use std::cell::RefCell;
use std::rc::Rc;

use crate::token::Position;
use crate::value::Value;

use super::error::RuntimeError;

pub const NAMES: &[&str] = &[
    "print", "input", "len", "chr", "ord", "int", "float", "str", "abs", "read_file",
    "read_lines",
];

pub fn is_builtin(name: &str) -> bool {
    NAMES.contains(&name)
}

/// Builtins other than `print`/`input`, which the interpreter handles itself.
pub fn call(name: &str, args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    match name {
        "len" => len(args, pos),
        "chr" => chr(args, pos),
        "ord" => ord(args, pos),
        "int" => to_int(args, pos),
        "float" => to_float(args, pos),
        "str" => to_str(args, pos),
        "abs" => abs(args, pos),
        "read_file" => read_file(args, pos),
        "read_lines" => read_lines(args, pos),
        other => unreachable!("call() does not dispatch '{other}'"),
    }
}

fn arg(args: &[Value], i: usize, pos: Position, what: &str) -> Result<Value, RuntimeError> {
    args.get(i).cloned().ok_or_else(|| RuntimeError::InvalidArgument {
        message: format!("{what} expects an argument"),
        pos,
    })
}

fn len(args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    match arg(args, 0, pos, "len")? {
        Value::Array(elems) => Ok(Value::Int(elems.borrow().len() as i64)),
        Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
        _ => Err(RuntimeError::InvalidArgument {
            message: "len() requires an ARRAY or STRING".into(),
            pos,
        }),
    }
}

fn chr(args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    match arg(args, 0, pos, "chr")? {
        Value::Int(i) => {
            let c = char::from_u32(i as u32).ok_or_else(|| RuntimeError::InvalidArgument {
                message: format!("{i} is not a valid codepoint"),
                pos,
            })?;
            Ok(Value::String(Rc::new(c.to_string())))
        }
        _ => Err(RuntimeError::InvalidArgument {
            message: "chr() requires an INT".into(),
            pos,
        }),
    }
}

fn ord(args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    match arg(args, 0, pos, "ord")? {
        Value::String(s) => {
            let c = s.chars().next().ok_or_else(|| RuntimeError::InvalidArgument {
                message: "ord() requires a non-empty STRING".into(),
                pos,
            })?;
            Ok(Value::Int(c as i64))
        }
        _ => Err(RuntimeError::InvalidArgument {
            message: "ord() requires a STRING".into(),
            pos,
        }),
    }
}

fn to_int(args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    match arg(args, 0, pos, "int")? {
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Float(f) => Ok(Value::Int(f as i64)),
        Value::Bool(b) => Ok(Value::Int(b as i64)),
        Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            RuntimeError::InvalidArgument {
                message: format!("cannot convert '{s}' to INT"),
                pos,
            }
        }),
        _ => Err(RuntimeError::InvalidArgument {
            message: "int() requires a scalar value".into(),
            pos,
        }),
    }
}

fn to_float(args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    match arg(args, 0, pos, "float")? {
        Value::Int(i) => Ok(Value::Float(i as f64)),
        Value::Float(f) => Ok(Value::Float(f)),
        Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            RuntimeError::InvalidArgument {
                message: format!("cannot convert '{s}' to FLOAT"),
                pos,
            }
        }),
        _ => Err(RuntimeError::InvalidArgument {
            message: "float() requires a scalar value".into(),
            pos,
        }),
    }
}

fn to_str(args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    let v = arg(args, 0, pos, "str")?;
    Ok(Value::String(Rc::new(v.to_string())))
}

fn abs(args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    match arg(args, 0, pos, "abs")? {
        Value::Int(i) => Ok(Value::Int(i.abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        _ => Err(RuntimeError::InvalidArgument {
            message: "abs() requires an INT or FLOAT".into(),
            pos,
        }),
    }
}

fn read_file(args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    match arg(args, 0, pos, "read_file")? {
        Value::String(path) => {
            std::fs::read_to_string(path.as_str())
                .map(|s| Value::String(Rc::new(s)))
                .map_err(|e| RuntimeError::Io {
                    message: e.to_string(),
                    pos,
                })
        }
        _ => Err(RuntimeError::InvalidArgument {
            message: "read_file() requires a STRING path".into(),
            pos,
        }),
    }
}

fn read_lines(args: &[Value], pos: Position) -> Result<Value, RuntimeError> {
    match arg(args, 0, pos, "read_lines")? {
        Value::String(path) => {
            let contents = std::fs::read_to_string(path.as_str()).map_err(|e| RuntimeError::Io {
                message: e.to_string(),
                pos,
            })?;
            let lines: Vec<Value> = contents
                .lines()
                .map(|l| Value::String(Rc::new(l.to_string())))
                .collect();
            Ok(Value::Array(Rc::new(RefCell::new(lines))))
        }
        _ => Err(RuntimeError::InvalidArgument {
            message: "read_lines() requires a STRING path".into(),
            pos,
        }),
    }
}
