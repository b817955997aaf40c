//! Tree-walking evaluator. Follows the teacher's `Interpreter`/`Scope`
//! dispatch shape (one method per statement/expression variant), but
//! replaces panics with `Result`, and replaces the exception-like "return"
//! signal the source uses with an explicit control-flow result type per the
//! non-local-return design note: every statement evaluation returns
//! `Result<Signal, RuntimeError>`, where `Signal` carries `Return`/`Break`/
//! `Continue` and genuine failures travel through `Result::Err` instead of
//! being folded into the same enum — the idiomatic split for a language with
//! `?`.

pub mod builtins;
pub mod environment;
pub mod error;

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

use crate::ast::{BinOp, Block, Expr, PrefixOp, Program, Stmt};
use crate::token::Position;
use crate::value::{UserFunction, Value};

use environment::Environment;
use error::RuntimeError;

#[derive(Debug)]
enum Signal {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter<R: BufRead, W: Write> {
    input: RefCell<R>,
    output: RefCell<W>,
    globals: Rc<RefCell<Environment>>,
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        let globals = Environment::root();
        for name in builtins::NAMES {
            globals.borrow_mut().assign_current(name, Value::Builtin(name));
        }
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
            globals,
        }
    }

    pub fn run(&self, program: &Program) -> Result<(), RuntimeError> {
        let env = Rc::clone(&self.globals);
        match self.eval_block(program, &env)? {
            Signal::Normal | Signal::Return(_) => Ok(()),
            Signal::Break => Err(RuntimeError::LoopControlOutsideLoop {
                keyword: "break",
                pos: 0,
            }),
            Signal::Continue => Err(RuntimeError::LoopControlOutsideLoop {
                keyword: "continue",
                pos: 0,
            }),
        }
    }

    fn eval_block(
        &self,
        block: &Block,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Signal, RuntimeError> {
        for stmt in block {
            match self.eval_stmt(stmt, env)? {
                Signal::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Signal::Normal)
    }

    fn eval_stmt(
        &self,
        stmt: &Stmt,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Signal, RuntimeError> {
        match stmt {
            Stmt::Assignment { target, value, token } => {
                let v = self.eval_expr(value, env)?;
                self.assign_target(target, v, env, token.pos)?;
                Ok(Signal::Normal)
            }
            Stmt::Conditional {
                cond,
                body,
                otherwise,
                ..
            } => {
                if self.eval_expr(cond, env)?.is_truthy() {
                    self.eval_block(body, env)
                } else if let Some(o) = otherwise {
                    self.eval_stmt(o, env)
                } else {
                    Ok(Signal::Normal)
                }
            }
            Stmt::While { cond, body, .. } => {
                while self.eval_expr(cond, env)?.is_truthy() {
                    match self.eval_block(body, env)? {
                        Signal::Normal | Signal::Continue => {}
                        Signal::Break => break,
                        Signal::Return(v) => return Ok(Signal::Return(v)),
                    }
                }
                Ok(Signal::Normal)
            }
            Stmt::For {
                pre,
                cond,
                post,
                body,
                ..
            } => {
                self.eval_stmt(pre, env)?;
                while self.eval_expr(cond, env)?.is_truthy() {
                    match self.eval_block(body, env)? {
                        Signal::Normal | Signal::Continue => {}
                        Signal::Break => break,
                        Signal::Return(v) => return Ok(Signal::Return(v)),
                    }
                    self.eval_stmt(post, env)?;
                }
                Ok(Signal::Normal)
            }
            Stmt::FunctionDefinition {
                name, params, body, ..
            } => {
                let func = Value::Function(Rc::new(UserFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    env: Rc::clone(env),
                }));
                env.borrow_mut().assign(name, func);
                Ok(Signal::Normal)
            }
            Stmt::ReturnStatement { value, .. } => {
                let v = self.eval_expr(value, env)?;
                Ok(Signal::Return(v))
            }
            Stmt::BreakStatement { .. } => Ok(Signal::Break),
            Stmt::ContinueStatement { .. } => Ok(Signal::Continue),
            Stmt::Expression { expr } => {
                self.eval_expr(expr, env)?;
                Ok(Signal::Normal)
            }
        }
    }

    fn assign_target(
        &self,
        target: &Expr,
        value: Value,
        env: &Rc<RefCell<Environment>>,
        pos: Position,
    ) -> Result<(), RuntimeError> {
        match target {
            Expr::Identifier { name, .. } => {
                env.borrow_mut().assign(name, value);
                Ok(())
            }
            Expr::BracketAccess { target, index, .. } => {
                let container = self.eval_expr(target, env)?;
                let idx = self.eval_expr(index, env)?;
                match (container, idx) {
                    (Value::Array(arr), Value::Int(i)) => {
                        let mut arr = arr.borrow_mut();
                        if i < 0 || i as usize >= arr.len() {
                            return Err(RuntimeError::IndexOutOfRange {
                                index: i,
                                len: arr.len(),
                                pos,
                            });
                        }
                        arr[i as usize] = value;
                        Ok(())
                    }
                    (Value::Array(_), _) => Err(RuntimeError::InvalidArgument {
                        message: "array index must be INT".into(),
                        pos,
                    }),
                    _ => Err(RuntimeError::NotSubscriptable { pos }),
                }
            }
            _ => unreachable!("assignment target is always Identifier or BracketAccess (I1)"),
        }
    }

    fn eval_expr(&self, expr: &Expr, env: &Rc<RefCell<Environment>>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Identifier { name, token } => env
                .borrow()
                .get(name)
                .ok_or_else(|| RuntimeError::UndefinedName {
                    name: name.clone(),
                    pos: token.pos,
                }),
            Expr::Integer { value, .. } => Ok(Value::Int(*value)),
            Expr::Float { value, .. } => Ok(Value::Float(*value)),
            Expr::String { value, .. } => Ok(Value::String(Rc::new(value.clone()))),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    values.push(self.eval_expr(e, env)?);
                }
                Ok(Value::Array(Rc::new(RefCell::new(values))))
            }
            Expr::BinaryOp {
                op, left, right, token,
            } => self.eval_binary(*op, left, right, env, token.pos),
            Expr::PrefixOp { op, value, token } => {
                let v = self.eval_expr(value, env)?;
                self.eval_prefix(*op, v, token.pos)
            }
            Expr::FunctionCall { callee, args, token } => {
                let callee_val = self.eval_expr(callee, env)?;
                let mut arg_vals = Vec::with_capacity(args.len());
                for a in args {
                    arg_vals.push(self.eval_expr(a, env)?);
                }
                self.call_value(callee_val, arg_vals, token.pos)
            }
            Expr::BracketAccess { target, index, token } => {
                let t = self.eval_expr(target, env)?;
                let i = self.eval_expr(index, env)?;
                self.index_value(t, i, token.pos)
            }
        }
    }

    fn eval_prefix(&self, op: PrefixOp, v: Value, pos: Position) -> Result<Value, RuntimeError> {
        match op {
            PrefixOp::Neg => match v {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                _ => Err(RuntimeError::OperatorTypeMismatch {
                    op: "-".into(),
                    pos,
                }),
            },
            PrefixOp::Not => Ok(Value::Bool(!v.is_truthy())),
        }
    }

    fn eval_binary(
        &self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        env: &Rc<RefCell<Environment>>,
        pos: Position,
    ) -> Result<Value, RuntimeError> {
        // `and`/`or` short-circuit and return the deciding operand itself.
        if matches!(op, BinOp::And | BinOp::Or) {
            let l = self.eval_expr(left, env)?;
            return match op {
                BinOp::And if !l.is_truthy() => Ok(l),
                BinOp::And => self.eval_expr(right, env),
                BinOp::Or if l.is_truthy() => Ok(l),
                BinOp::Or => self.eval_expr(right, env),
                _ => unreachable!(),
            };
        }

        let l = self.eval_expr(left, env)?;
        let r = self.eval_expr(right, env)?;

        match op {
            BinOp::Add => self.eval_add(l, r, pos),
            BinOp::Sub => self.eval_numeric(l, r, pos, "-", |a, b| a - b, |a, b| a - b),
            BinOp::Mul => self.eval_numeric(l, r, pos, "*", |a, b| a * b, |a, b| a * b),
            BinOp::Div => self.eval_div(l, r, pos),
            BinOp::Equal => Ok(Value::Bool(l == r)),
            BinOp::NotEqual => Ok(Value::Bool(l != r)),
            BinOp::Less => self.eval_cmp(l, r, pos, "<", |o| o.is_lt()),
            BinOp::Greater => self.eval_cmp(l, r, pos, ">", |o| o.is_gt()),
            BinOp::LessEq => self.eval_cmp(l, r, pos, "<=", |o| o.is_le()),
            BinOp::GreaterEq => self.eval_cmp(l, r, pos, ">=", |o| o.is_ge()),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_add(&self, l: Value, r: Value, pos: Position) -> Result<Value, RuntimeError> {
        match (&l, &r) {
            (Value::String(a), Value::String(b)) => {
                Ok(Value::String(Rc::new(format!("{a}{b}"))))
            }
            _ => self.eval_numeric(l, r, pos, "+", |a, b| a + b, |a, b| a + b),
        }
    }

    fn eval_numeric(
        &self,
        l: Value,
        r: Value,
        pos: Position,
        op: &str,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, RuntimeError> {
        match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(a, b))),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(a, b))),
            (Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_op(a as f64, b))),
            (Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_op(a, b as f64))),
            _ => Err(RuntimeError::OperatorTypeMismatch {
                op: op.to_string(),
                pos,
            }),
        }
    }

    fn eval_div(&self, l: Value, r: Value, pos: Position) -> Result<Value, RuntimeError> {
        match (l, r) {
            (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero { pos }),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a / b)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
            (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 / b)),
            (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a / b as f64)),
            _ => Err(RuntimeError::OperatorTypeMismatch {
                op: "/".into(),
                pos,
            }),
        }
    }

    fn eval_cmp(
        &self,
        l: Value,
        r: Value,
        pos: Position,
        op: &str,
        accept: fn(std::cmp::Ordering) -> bool,
    ) -> Result<Value, RuntimeError> {
        let ordering = match (&l, &r) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            _ => {
                return Err(RuntimeError::OperatorTypeMismatch {
                    op: op.to_string(),
                    pos,
                })
            }
        };
        match ordering {
            Some(o) => Ok(Value::Bool(accept(o))),
            None => Ok(Value::Bool(false)),
        }
    }

    fn index_value(&self, target: Value, index: Value, pos: Position) -> Result<Value, RuntimeError> {
        match (target, index) {
            (Value::Array(arr), Value::Int(i)) => {
                let arr = arr.borrow();
                if i < 0 || i as usize >= arr.len() {
                    return Err(RuntimeError::IndexOutOfRange {
                        index: i,
                        len: arr.len(),
                        pos,
                    });
                }
                Ok(arr[i as usize].clone())
            }
            (Value::String(s), Value::Int(i)) => {
                let chars: Vec<char> = s.chars().collect();
                if i < 0 || i as usize >= chars.len() {
                    return Err(RuntimeError::IndexOutOfRange {
                        index: i,
                        len: chars.len(),
                        pos,
                    });
                }
                Ok(Value::String(Rc::new(chars[i as usize].to_string())))
            }
            (Value::Array(_) | Value::String(_), _) => Err(RuntimeError::InvalidArgument {
                message: "index must be INT".into(),
                pos,
            }),
            _ => Err(RuntimeError::NotSubscriptable { pos }),
        }
    }

    fn call_value(&self, callee: Value, args: Vec<Value>, pos: Position) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(func) => {
                let child = Environment::create_child(&func.env);
                for (i, param) in func.params.iter().enumerate() {
                    if let Some(v) = args.get(i).cloned() {
                        child.borrow_mut().assign_current(param, v);
                    }
                }
                match self.eval_block(&func.body, &child)? {
                    Signal::Return(v) => Ok(v),
                    Signal::Normal => Ok(Value::Null),
                    Signal::Break => Err(RuntimeError::LoopControlOutsideLoop {
                        keyword: "break",
                        pos,
                    }),
                    Signal::Continue => Err(RuntimeError::LoopControlOutsideLoop {
                        keyword: "continue",
                        pos,
                    }),
                }
            }
            Value::Builtin("print") => {
                self.do_print(&args);
                Ok(Value::Null)
            }
            Value::Builtin("input") => self.do_input(&args),
            Value::Builtin(name) => builtins::call(name, &args, pos),
            _ => Err(RuntimeError::NotCallable { pos }),
        }
    }

    fn do_print(&self, args: &[Value]) {
        let rendered: Vec<String> = args.iter().map(|v| v.to_string()).collect();
        let mut out = self.output.borrow_mut();
        let _ = writeln!(out, "{}", rendered.join(" "));
    }

    fn do_input(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        if let Some(Value::String(prompt)) = args.first() {
            let mut out = self.output.borrow_mut();
            let _ = write!(out, "{prompt}");
            let _ = out.flush();
        }
        let mut line = String::new();
        self.input
            .borrow_mut()
            .read_line(&mut line)
            .map_err(|e| RuntimeError::Io {
                message: e.to_string(),
                pos: 0,
            })?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Value::String(Rc::new(line)))
    }
}
