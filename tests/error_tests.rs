// Runtime errors halt the stepper with a snapshot of the state they left behind

use minic::interpreter::{Fault, RuntimeError, Stepper};
use minic::memory::value::Value;
use minic::parser::parse_program;

fn run_to_fault(source: &str) -> (Stepper, Fault) {
    let program = parse_program(source).expect("Parsing failed");
    let mut stepper = Stepper::new(program).expect("Startup failed");
    let fault = stepper.run().expect_err("Execution should fail");
    (stepper, fault)
}

#[test]
fn test_index_out_of_range_before_write() {
    let (s, fault) = run_to_fault(
        r#"int main() {
    int a[3];
    a[5] = 1;
    return 0;
}
"#,
    );
    assert!(matches!(
        fault.error,
        RuntimeError::IndexOutOfRange {
            index: 5,
            length: 3,
            ..
        }
    ));
    assert_eq!(fault.snapshot.line, 3);
    // Nothing was written
    let a = s.current_value_of("a").unwrap().elements().unwrap().to_vec();
    assert_eq!(a, vec![Value::int(0); 3]);
    assert_eq!(s.history_of("a").unwrap().len(), 1);
}

#[test]
fn test_index_bounds() {
    let (_, at_length) = run_to_fault("int main() {\n  int a[2];\n  int x = a[2];\n}\n");
    assert!(matches!(at_length.error, RuntimeError::IndexOutOfRange { index: 2, .. }));

    let (_, negative) = run_to_fault("int main() {\n  int a[2];\n  a[-1] = 4;\n}\n");
    assert!(matches!(negative.error, RuntimeError::IndexOutOfRange { index: -1, .. }));
}

#[test]
fn test_argument_count_mismatch() {
    let (_, fault) = run_to_fault(
        r#"int add(int a, int b) {
    return a + b;
}
int main() {
    int r = add(1);
    return 0;
}
"#,
    );
    assert!(matches!(
        fault.error,
        RuntimeError::ArgumentCountMismatch {
            expected: 2,
            got: 1,
            ..
        }
    ));
}

#[test]
fn test_void_signature_rejects_arguments() {
    let (_, fault) = run_to_fault(
        r#"int seven(void) {
    return 7;
}
int main() {
    int r = seven(1);
    return 0;
}
"#,
    );
    assert!(matches!(
        fault.error,
        RuntimeError::ArgumentCountMismatch {
            expected: 0,
            got: 1,
            ..
        }
    ));
}

#[test]
fn test_argument_type_mismatch() {
    let (_, fault) = run_to_fault(
        r#"int first(int v) {
    return v;
}
int main() {
    int b[2];
    int r = first(b);
    return 0;
}
"#,
    );
    assert!(matches!(
        fault.error,
        RuntimeError::ArgumentTypeMismatch { position: 1, .. }
    ));
}

#[test]
fn test_void_function_returning_value() {
    let (_, fault) = run_to_fault(
        r#"void f() {
    return 1;
}
int main() {
    f();
    return 0;
}
"#,
    );
    assert!(matches!(fault.error, RuntimeError::ReturnTypeMismatch { .. }));
}

#[test]
fn test_missing_return_in_value_function() {
    let (_, fault) = run_to_fault(
        r#"int f() {
    int unused = 1;
}
int main() {
    int r = f();
    return 0;
}
"#,
    );
    assert!(matches!(
        fault.error,
        RuntimeError::ReturnTypeMismatch { ref function, ref got, .. } if function == "f" && got == "void"
    ));

    // Discarding the result does not hide it
    let (_, fault) = run_to_fault("int f() {\n  int unused = 1;\n}\nint main() {\n  f();\n}\n");
    assert!(matches!(fault.error, RuntimeError::ReturnTypeMismatch { .. }));
}

#[test]
fn test_oversized_array_is_a_runtime_error() {
    let (s, fault) = run_to_fault("int main() {\n  int a[1000000000000000000];\n  return 0;\n}\n");
    assert!(matches!(fault.error, RuntimeError::TypeError { .. }));
    assert_eq!(fault.snapshot.line, 2);
    assert!(s.symbol("a").is_none());

    let program = parse_program("int big[1000000000000000000];\nint main() {\n  return 0;\n}\n").unwrap();
    let fault = Stepper::new(program).err().unwrap();
    assert!(matches!(fault.error, RuntimeError::TypeError { .. }));
}

#[test]
fn test_duplicate_declaration() {
    let (_, fault) = run_to_fault(
        r#"int main() {
    int x = 1;
    int x = 2;
    return 0;
}
"#,
    );
    assert!(matches!(fault.error, RuntimeError::DuplicateSymbol { ref name, .. } if name == "x"));
    assert_eq!(fault.snapshot.line, 3);
}

#[test]
fn test_undefined_symbols() {
    let (_, variable) = run_to_fault("int main() {\n  int x = y + 1;\n}\n");
    assert!(matches!(variable.error, RuntimeError::UndefinedSymbol { ref name, .. } if name == "y"));

    let (_, function) = run_to_fault("int main() {\n  int x = g();\n}\n");
    assert!(matches!(function.error, RuntimeError::UndefinedSymbol { ref name, .. } if name == "g"));
}

#[test]
fn test_uninitialized_read() {
    let (_, fault) = run_to_fault("int main() {\n  int x;\n  int y = x + 1;\n}\n");
    assert!(matches!(fault.error, RuntimeError::UninitializedRead { ref name, .. } if name == "x"));
}

#[test]
fn test_division_by_zero() {
    let (_, fault) = run_to_fault("int main() {\n  int z = 0;\n  int q = 4 / z;\n}\n");
    assert!(matches!(fault.error, RuntimeError::DivisionByZero { .. }));
}

#[test]
fn test_break_outside_loop() {
    let (_, fault) = run_to_fault("int main() {\n  break;\n}\n");
    assert!(matches!(fault.error, RuntimeError::MisplacedJump { .. }));
}

#[test]
fn test_fault_snapshot_keeps_state() {
    let (s, fault) = run_to_fault(
        r#"int main() {
    int count = 2;
    int a[2];
    count = count + 1;
    a[count] = 9;
    return 0;
}
"#,
    );
    let count = fault.snapshot.find("count").unwrap();
    assert_eq!(count.value, Some(Value::int(3)));
    assert_eq!(count.writes, 2);
    assert_eq!(fault.snapshot.calls, vec!["main".to_string()]);
    assert!(!s.is_finished());
    assert!(s.fault().is_some());
}

#[test]
fn test_fault_in_global_initializer() {
    let program = parse_program("int g = 1 / 0;\nint main() {\n  return 0;\n}\n").unwrap();
    let fault = Stepper::new(program).err().unwrap();
    assert!(matches!(fault.error, RuntimeError::DivisionByZero { .. }));
    assert_eq!(fault.snapshot.line, 1);
}
