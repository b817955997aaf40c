//! Codegen-time state: the LLVM context/module/builder plus scope and
//! function tables. Shape follows `why_lib::codegen::context::CodegenContext`
//! almost directly — a `RefCell`-guarded stack of scope frames addressed by
//! name, rather than a parent-linked handle graph, since function bodies
//! here are lowered with all of their locals known up front.

use std::cell::RefCell;
use std::collections::HashMap;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::{BasicTypeEnum, StructType};
use inkwell::values::{FunctionValue, GlobalValue, PointerValue};
use inkwell::AddressSpace;

use crate::types::Type;

pub struct ScopeFrame<'ctx> {
    variables: HashMap<String, (PointerValue<'ctx>, Type)>,
}

impl<'ctx> Default for ScopeFrame<'ctx> {
    fn default() -> Self {
        Self {
            variables: HashMap::new(),
        }
    }
}

pub struct CodegenContext<'ctx> {
    pub context: &'ctx Context,
    pub module: Module<'ctx>,
    pub builder: Builder<'ctx>,
    pub array_type: StructType<'ctx>,
    scopes: RefCell<Vec<ScopeFrame<'ctx>>>,
    functions: RefCell<HashMap<String, (FunctionValue<'ctx>, Type, Vec<Type>)>>,
    string_literals: RefCell<HashMap<String, GlobalValue<'ctx>>>,
    temp_counter: RefCell<u64>,
    label_counter: RefCell<u64>,
}

impl<'ctx> CodegenContext<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();

        // opaque struct { i64 length, ptr data }
        let array_type = context.opaque_struct_type("array");
        array_type.set_body(
            &[context.i64_type().into(), context.ptr_type(AddressSpace::default()).into()],
            false,
        );

        Self {
            context,
            module,
            builder,
            array_type,
            scopes: RefCell::new(vec![ScopeFrame::default()]),
            functions: RefCell::new(HashMap::new()),
            string_literals: RefCell::new(HashMap::new()),
            temp_counter: RefCell::new(0),
            label_counter: RefCell::new(0),
        }
    }

    pub fn ptr_type(&self) -> inkwell::types::PointerType<'ctx> {
        self.context.ptr_type(AddressSpace::default())
    }

    pub fn llvm_type_of(&self, ty: &Type) -> BasicTypeEnum<'ctx> {
        match ty {
            Type::Int => self.context.i64_type().into(),
            Type::Float => self.context.f64_type().into(),
            Type::Bool => self.context.bool_type().into(),
            Type::String => self.ptr_type().into(),
            Type::Array(_) => self.ptr_type().into(),
            Type::Function => self.ptr_type().into(),
            Type::Unknown => self.context.i64_type().into(),
        }
    }

    pub fn enter_scope(&self) {
        self.scopes.borrow_mut().push(ScopeFrame::default());
    }

    pub fn exit_scope(&self) {
        self.scopes.borrow_mut().pop();
    }

    pub fn declare_variable(&self, name: &str, slot: PointerValue<'ctx>, ty: Type) {
        self.scopes
            .borrow_mut()
            .last_mut()
            .expect("at least one scope frame always exists")
            .variables
            .insert(name.to_string(), (slot, ty));
    }

    pub fn find_variable(&self, name: &str) -> Option<(PointerValue<'ctx>, Type)> {
        self.scopes
            .borrow()
            .iter()
            .rev()
            .find_map(|frame| frame.variables.get(name).cloned())
    }

    pub fn store_function(&self, name: &str, value: FunctionValue<'ctx>, ret: Type, params: Vec<Type>) {
        self.functions
            .borrow_mut()
            .insert(name.to_string(), (value, ret, params));
    }

    pub fn find_function(&self, name: &str) -> Option<(FunctionValue<'ctx>, Type, Vec<Type>)> {
        self.functions.borrow().get(name).cloned()
    }

    pub fn intern_string(&self, text: &str) -> PointerValue<'ctx> {
        let mut literals = self.string_literals.borrow_mut();
        if let Some(g) = literals.get(text) {
            return g.as_pointer_value();
        }
        let name = format!("str_{}", literals.len());
        let global = self
            .builder
            .build_global_string_ptr(text, &name)
            .expect("global string constant");
        literals.insert(text.to_string(), global);
        global.as_pointer_value()
    }

    pub fn next_temp(&self) -> String {
        let mut c = self.temp_counter.borrow_mut();
        *c += 1;
        format!("t{c}")
    }

    pub fn next_label(&self, hint: &str) -> String {
        let mut c = self.label_counter.borrow_mut();
        *c += 1;
        format!("{hint}{c}")
    }
}
