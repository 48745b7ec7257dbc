// Line stepping, value history and control flow through the public API

use minic::interpreter::Stepper;
use minic::memory::scope::ScopeKind;
use minic::memory::value::Value;
use minic::parser::parse_program;

fn stepper(source: &str) -> Stepper {
    let program = parse_program(source).expect("Parsing failed");
    Stepper::new(program).expect("Startup failed")
}

fn finished(source: &str) -> Stepper {
    let mut s = stepper(source);
    let result = s.run();
    assert!(result.is_ok(), "Execution failed: {:?}", result);
    assert!(s.is_finished());
    s
}

fn int(s: &Stepper, name: &str) -> i64 {
    match s.current_value_of(name) {
        Some(value) => value.as_int().expect("not an int"),
        None => panic!("'{}' has no value", name),
    }
}

#[test]
fn test_assignment_history() {
    let s = finished(
        r#"int main() {
    int x = 5;
    x = x + 1;
    return 0;
}
"#,
    );

    assert_eq!(int(&s, "x"), 6);
    let history = s.history_of("x").unwrap();
    let writes: Vec<(Value, usize)> = history.iter().map(|e| (e.value.clone(), e.line)).collect();
    assert_eq!(writes, vec![(Value::int(5), 2), (Value::int(6), 3)]);
    assert_eq!(history.last().map(|e| &e.value), s.current_value_of("x"));
}

#[test]
fn test_straight_line_visits_each_line() {
    let mut s = stepper(
        r#"int main() {
    int a = 1;

    int b = a * 2;
    a = b + a;
    return 0;
}
"#,
    );

    let mut visited = vec![s.current_line()];
    while !s.is_finished() {
        s.advance(1).unwrap();
        if !s.is_finished() {
            visited.push(s.current_line());
        }
    }
    assert_eq!(visited, vec![2, 4, 5, 6]);
    assert_eq!(int(&s, "a"), 3);
}

#[test]
fn test_function_call_result() {
    let s = finished(
        r#"int f() {
    return 2 + 3 * 4;
}
int main() {
    int r = f();
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "r"), 14);
}

#[test]
fn test_stepping_enters_callee() {
    let mut s = stepper(
        r#"int f() {
    return 2 + 3 * 4;
}
int main() {
    int r = f();
    return 0;
}
"#,
    );
    assert_eq!(s.current_line(), 5);

    s.advance(1).unwrap();
    assert_eq!(s.current_line(), 2);
    let calls: Vec<&str> = s.call_stack().iter().map(|c| c.function.as_str()).collect();
    assert_eq!(calls, vec!["main", "f"]);
    // The callee cannot see the caller's locals
    assert!(s.symbol("r").is_none());

    s.advance(1).unwrap();
    assert_eq!(s.current_line(), 5);
    assert_eq!(s.call_stack().len(), 1);

    s.advance(1).unwrap();
    assert_eq!(int(&s, "r"), 14);
    assert_eq!(s.current_line(), 6);
}

#[test]
fn test_parameters_and_recursion() {
    let s = finished(
        r#"int add(int a, int b) {
    return a + b;
}

int fact(int n) {
    if (n < 2) {
        return 1;
    }
    return n * fact(n - 1);
}

int main() {
    int s = add(3, 4);
    int f = fact(5);
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "s"), 7);
    assert_eq!(int(&s, "f"), 120);
}

#[test]
fn test_void_parameter_list() {
    let s = finished(
        r#"int seven(void) {
    return 7;
}
int main() {
    int r = seven();
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "r"), 7);
}

#[test]
fn test_for_loop() {
    let s = finished(
        r#"int main() {
    int i;
    int n = 0;
    for (i = 0; i < 3; i++) {
        n = n + 1;
    }
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "i"), 3);
    assert_eq!(int(&s, "n"), 3);
}

#[test]
fn test_loop_revisits_header() {
    let mut s = stepper(
        r#"int main() {
    int i;
    for (i = 0; i < 2; i++) {
        i = i;
    }
    return 0;
}
"#,
    );

    let mut visited = vec![s.current_line()];
    while !s.is_finished() {
        s.advance(1).unwrap();
        if !s.is_finished() {
            visited.push(s.current_line());
        }
    }
    assert_eq!(visited, vec![2, 3, 4, 3, 4, 3, 6]);
}

#[test]
fn test_while_loop() {
    let s = finished(
        r#"int main() {
    int i = 0;
    int sum = 0;
    while (i < 4) {
        sum = sum + i;
        i = i + 1;
    }
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "i"), 4);
    assert_eq!(int(&s, "sum"), 6);
}

#[test]
fn test_break_and_continue() {
    let s = finished(
        r#"int main() {
    int i;
    int sum = 0;
    for (i = 0; i < 10; i++) {
        if (i == 5) {
            break;
        }
        if (i == 2) {
            continue;
        }
        sum = sum + i;
    }
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "i"), 5);
    assert_eq!(int(&s, "sum"), 8);
}

#[test]
fn test_if_else() {
    let s = finished(
        r#"int main() {
    int x = 3;
    int y;
    if (x > 5) {
        y = 1;
    } else {
        y = 2;
    }
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "y"), 2);
}

#[test]
fn test_postfix_yields_old_value() {
    let mut s = stepper(
        r#"int main() {
    int x = 1;
    int y = x++ + x;
    return 0;
}
"#,
    );
    s.advance(2).unwrap();
    // Both reads in the statement saw 1
    assert_eq!(int(&s, "y"), 2);
    assert_eq!(int(&s, "x"), 2);
    let lines: Vec<usize> = s.history_of("x").unwrap().iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![2, 3]);
}

#[test]
fn test_prefix_yields_new_value() {
    let s = finished(
        r#"int main() {
    int x = 1;
    int y = ++x + x;
    int z = --x;
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "y"), 4);
    assert_eq!(int(&s, "z"), 1);
    assert_eq!(int(&s, "x"), 1);
}

#[test]
fn test_array_elements() {
    let s = finished(
        r#"int main() {
    int a[3];
    int b[] = {4, 5, 6};
    a[1] = b[2] + b[0];
    a[2] = a[1] * 2;
    return 0;
}
"#,
    );
    let a = s.current_value_of("a").unwrap().elements().unwrap().to_vec();
    assert_eq!(a, vec![Value::int(0), Value::int(10), Value::int(20)]);
    let b = s.current_value_of("b").unwrap().elements().unwrap().to_vec();
    assert_eq!(b, vec![Value::int(4), Value::int(5), Value::int(6)]);
}

#[test]
fn test_float_arithmetic_and_casts() {
    let s = finished(
        r#"int main() {
    float f = 7 / 2;
    int t = (int) f;
    int m = 7 % 3;
    return 0;
}
"#,
    );
    assert_eq!(s.current_value_of("f"), Some(&Value::float(3.5)));
    assert_eq!(int(&s, "t"), 3);
    assert_eq!(int(&s, "m"), 1);
}

#[test]
fn test_shadowing_in_nested_block() {
    let mut s = stepper(
        r#"int main() {
    int x = 1;
    {
        int x = 2;
        x = 3;
    }
    x = x + 10;
    return 0;
}
"#,
    );

    s.advance(3).unwrap();
    assert_eq!(s.current_line(), 5);
    assert_eq!(int(&s, "x"), 2);
    let chain = s.scope_chain();
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[0].kind, ScopeKind::Block);
    assert_eq!(chain[2].kind, ScopeKind::Global);

    s.advance(1).unwrap();
    assert_eq!(s.current_line(), 7);
    assert_eq!(int(&s, "x"), 1);

    s.run().unwrap();
    assert_eq!(int(&s, "x"), 11);
}

#[test]
fn test_globals_visible_in_functions() {
    let s = finished(
        r#"int base = 100;

int offset(int v) {
    return base + v;
}

int main() {
    int r = offset(5);
    base = 1;
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "r"), 105);
    assert_eq!(int(&s, "base"), 1);
}

#[test]
fn test_call_in_global_initializer() {
    let s = stepper(
        r#"int f() {
    return 3;
}
int g = f();
int h = 4;
int main() {
    int r = h;
    int q = g;
    return 0;
}
"#,
    );
    assert!(s.call_stack().iter().all(|call| call.function == "main"));
    let chain = s.scope_chain();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1].kind, ScopeKind::Global);
    assert_eq!(int(&s, "g"), 3);
    assert_eq!(int(&s, "h"), 4);

    let s = finished(
        r#"int f() {
    return 3;
}
int g = f();
int h = 4;
int main() {
    int r = h;
    int q = g;
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "r"), 4);
    assert_eq!(int(&s, "q"), 3);
}

#[test]
fn test_global_initializers_chain_calls() {
    let s = finished(
        r#"int twice(int v) {
    return v * 2;
}
int quad(int v) {
    return twice(twice(v));
}
int a = quad(2);
int b = twice(a) + 1;
int main() {
    int r = a + b;
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "a"), 8);
    assert_eq!(int(&s, "b"), 17);
    assert_eq!(int(&s, "r"), 25);
    assert_eq!(s.call_stack().len(), 1);
}

#[test]
fn test_for_loop_without_init() {
    let s = finished(
        r#"int main() {
    int i = 1;
    for (; i < 5; ) {
        i = i * 2;
    }
    return 0;
}
"#,
    );
    assert_eq!(int(&s, "i"), 8);
}

#[test]
fn test_advance_stops_at_end() {
    let mut s = stepper("int main() {\n  int x = 1;\n}\n");
    assert_eq!(s.advance(10).unwrap(), 1);
    assert!(s.is_finished());
    assert_eq!(s.advance(1).unwrap(), 0);
}
