//! End-to-end scenarios run through the full lex/parse/typecheck/interpret
//! pipeline via the crate's public `run_to_string`/`type_check_source`
//! helpers, in the teacher's in-process integration-test style rather than
//! shelling out to a compiled binary.

#[test]
fn hello_world() {
    let out = culebra::run_to_string(r#"print("Hello, World!")"#, "").unwrap();
    assert_eq!(out, "Hello, World!\n");
}

#[test]
fn integer_arithmetic() {
    let out = culebra::run_to_string("x=10\ny=20\nprint(x+y)", "").unwrap();
    assert_eq!(out, "30\n");
}

#[test]
fn recursive_factorial() {
    let src = "def fact(n):\n    if n<=1:\n        return 1\n    return n*fact(n-1)\nprint(fact(5))";
    let out = culebra::run_to_string(src, "").unwrap();
    assert_eq!(out, "120\n");
}

#[test]
fn c_style_for_loop_sum() {
    let src = "sum=0\nfor i=1; i<=5; i=i+1:\n    sum=sum+i\nprint(sum)";
    let out = culebra::run_to_string(src, "").unwrap();
    assert_eq!(out, "15\n");
}

#[test]
fn array_mutation() {
    let src = "a=[1,2,3]\na[1]=42\nprint(a[1])";
    let out = culebra::run_to_string(src, "").unwrap();
    assert_eq!(out, "42\n");
}

#[test]
fn array_element_type_mismatch_is_rejected() {
    let err = culebra::type_check_source("a=[1,true]").unwrap_err();
    assert!(err.to_string().contains("Array elements must be of the same type"));
}

#[test]
fn array_assignment_type_mismatch_is_rejected() {
    let err = culebra::type_check_source("arr=[1,2]\narr[0]=\"x\"").unwrap_err();
    assert!(err.to_string().contains("Cannot assign STRING to array of INT"));
}

#[test]
fn while_loop_with_break() {
    let src = "i=0\nwhile true:\n    i=i+1\n    if i==3:\n        break\nprint(i)";
    let out = culebra::run_to_string(src, "").unwrap();
    assert_eq!(out, "3\n");
}

#[test]
fn continue_skips_rest_of_body() {
    let src = "sum=0\nfor i=0; i<5; i=i+1:\n    if i==2:\n        continue\n    sum=sum+i\nprint(sum)";
    let out = culebra::run_to_string(src, "").unwrap();
    assert_eq!(out, "8\n");
}

#[test]
fn closures_capture_outer_scope_by_reference() {
    let src = "def make_adder(n):\n    def add(x):\n        return x+n\n    return add\nadder=make_adder(10)\nprint(adder(5))";
    let out = culebra::run_to_string(src, "").unwrap();
    assert_eq!(out, "15\n");
}

#[test]
fn string_concatenation() {
    let out = culebra::run_to_string(r#"print("foo"+"bar")"#, "").unwrap();
    assert_eq!(out, "foobar\n");
}

#[test]
fn builtin_len_on_string_and_array() {
    let out = culebra::run_to_string(r#"print(len("abcd"))
print(len([1,2,3]))"#, "").unwrap();
    assert_eq!(out, "4\n3\n");
}

#[test]
fn emits_llvm_ir_with_runtime_abi_declarations() {
    let ir = culebra::emit_llvm_ir(r#"print("Hello, World!")"#).unwrap();
    assert!(ir.contains("declare"));
    assert!(ir.contains("culebra_print_string"));
    assert!(ir.contains("define i32 @main"));
}
