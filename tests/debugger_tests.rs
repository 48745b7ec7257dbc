// Debugger commands over a live session

use minic::debugger::{OutputKind, OutputLine, Session};
use minic::interpreter::Stepper;
use minic::parser::parse_program;

const PROGRAM: &str = r#"int main() {
    int x = 5;
    int y;
    x = x + 1;
    return 0;
}
"#;

fn session(source: &str) -> Session {
    let program = parse_program(source).expect("Parsing failed");
    let stepper = Stepper::new(program).expect("Startup failed");
    Session::new(stepper, source)
}

fn texts(lines: &[OutputLine]) -> Vec<&str> {
    lines.iter().map(|line| line.text.as_str()).collect()
}

#[test]
fn test_location_line_shows_next_line() {
    let s = session(PROGRAM);
    assert_eq!(s.location_line().text, "Next line (2): int x = 5;");
}

#[test]
fn test_next_and_empty_input() {
    let mut s = session(PROGRAM);
    let out = s.execute_line("next");
    assert_eq!(texts(&out), vec!["Next line (3): int y;"]);

    let out = s.execute_line("");
    assert_eq!(texts(&out), vec!["Next line (4): x = x + 1;"]);

    let out = s.execute_line("next 5");
    assert_eq!(texts(&out), vec!["End of program"]);
    assert!(s.stepper().is_finished());
}

#[test]
fn test_print() {
    let mut s = session(PROGRAM);
    let out = s.execute_line("print x");
    assert_eq!(out[0].kind, OutputKind::Error);
    assert_eq!(out[0].text, "Invisible variable 'x'");

    s.execute_line("next 2");
    assert_eq!(texts(&s.execute_line("print x")), vec!["x = 5"]);
    assert_eq!(texts(&s.execute_line("p y")), vec!["y = <uninitialized>"]);
    assert_eq!(texts(&s.execute_line("print main")), vec!["main = <function>"]);
}

#[test]
fn test_trace() {
    let mut s = session(PROGRAM);
    s.execute_line("next 2");
    assert_eq!(texts(&s.execute_line("trace y")), vec!["y has never been assigned"]);

    s.execute_line("next");
    assert_eq!(
        texts(&s.execute_line("trace x")),
        vec!["x = 5 at line 2", "x = 6 at line 4"]
    );
}

#[test]
fn test_scope_lists_chain() {
    let mut s = session(PROGRAM);
    s.execute_line("next");
    let out = s.execute_line("scope");
    assert_eq!(out[0].text, "[0] main (Function)");
    assert!(out[1].text.contains("int x = 5 @ 0x"));
    assert!(out.iter().any(|line| line.text == "  [1] global (Global)"));
}

#[test]
fn test_inspection_does_not_change_state() {
    let mut s = session(PROGRAM);
    s.execute_line("next");
    let line = s.stepper().current_line();
    let chain = s.stepper().scope_chain();
    let history = s.stepper().history_of("x").map(<[_]>::to_vec);

    for command in ["print x", "trace x", "scope", "log", "help", "print nope"] {
        s.execute_line(command);
    }

    assert_eq!(s.stepper().current_line(), line);
    assert_eq!(s.stepper().scope_chain(), chain);
    assert_eq!(s.stepper().history_of("x").map(<[_]>::to_vec), history);
}

#[test]
fn test_log_covers_last_next() {
    let mut s = session(PROGRAM);
    assert_eq!(texts(&s.execute_line("log")), vec!["Nothing executed yet"]);

    s.execute_line("next");
    let out = s.execute_line("log");
    assert!(!out.is_empty());
    assert!(out.iter().all(|line| line.kind == OutputKind::Log));
    assert!(out.iter().any(|line| line.text.contains("Declaration")));
}

#[test]
fn test_fault_reported_and_sticky() {
    let mut s = session("int main() {\n  int a[3];\n  a[5] = 1;\n}\n");
    s.execute_line("next");
    let out = s.execute_line("next");
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|line| line.kind == OutputKind::Error));
    assert_eq!(out[1].text, "Execution halted at line 3");

    let again = s.execute_line("next");
    assert_eq!(texts(&again), texts(&out));
}

#[test]
fn test_command_errors_and_exit() {
    let mut s = session(PROGRAM);
    let out = s.execute_line("jump");
    assert_eq!(out[0].kind, OutputKind::Error);
    assert!(out[0].text.starts_with("Unknown command 'jump'"));

    let out = s.execute_line("print 1x");
    assert_eq!(out[0].text, "Invalid variable name '1x'");
    assert!(!s.should_exit());

    assert_eq!(texts(&s.execute_line("exit")), vec!["Bye"]);
    assert!(s.should_exit());
}
