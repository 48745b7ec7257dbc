//! Line stepper
//!
//! [`Stepper`] owns a parsed [`Program`] and its [`Environment`] and advances
//! execution one source line at a time.
//!
//! # Stepping
//!
//! One step executes frames until a statement blocks on a later line, the
//! line cursor moves, or the program ends. If the cursor did not move it
//! advances by one. Queued postfix updates are flushed, then the cursor
//! settles on the next line that holds something to execute, so blank and
//! brace-only lines are never reported as the current line.
//!
//! # Faults
//!
//! A runtime error halts the stepper. The error is returned together with a
//! [`Snapshot`] of the environment, and every later `advance` returns the same
//! fault.

use crate::interpreter::constants::ENTRY_FUNCTION;
use crate::interpreter::environment::{Activation, Environment, LogEntry};
use crate::interpreter::errors::{Fault, RuntimeError};
use crate::interpreter::frame::{Phase, Progress};
use crate::memory::scope::{HistoryEntry, Symbol};
use crate::memory::value::Value;
use crate::parser::ast::{NodeKind, Program};
use crate::snapshot::{scope_chain, ScopeView, Snapshot};
use tracing::{debug, info, warn};

pub struct Stepper {
    program: Program,
    env: Environment,
    fault: Option<Fault>,
    log_mark: usize,
}

impl Stepper {
    /// Run the global declarations, enter `main` and stop on its first line
    pub fn new(program: Program) -> Result<Self, Fault> {
        let mut stepper = Stepper {
            program,
            env: Environment::new(),
            fault: None,
            log_mark: 0,
        };
        if let Err(error) = stepper.start() {
            return Err(stepper.halt(error));
        }
        Ok(stepper)
    }

    fn start(&mut self) -> Result<(), RuntimeError> {
        let program = &self.program;
        let env = &mut self.env;

        env.push_node(program.root);
        while env.run_to_completion(program)? == Progress::Blocked {
            // Globals are not gated by stepping; move the cursor to whatever waits
            if let Some(frame) = env.control.last() {
                env.line = program.span(frame.node).start_line();
            }
        }
        env.values.clear();

        let main = program
            .functions
            .get(ENTRY_FUNCTION)
            .copied()
            .ok_or(RuntimeError::NoMainFunction)?;
        if let NodeKind::FunctionDefinition { body, .. } = program.node(main).kind {
            // `main` returns to the end of its own body
            env.line = program.span(body).end_line();
        }

        env.push_node(program.entry);
        while env.calls.is_empty() && !env.control.is_empty() {
            env.execute(program)?;
        }
        self.settle();
        self.log_mark = self.env.log.len();
        debug!(line = self.env.line, "entered main");
        Ok(())
    }

    /// Perform up to `count` line steps. Returns the number of steps taken.
    pub fn advance(&mut self, count: usize) -> Result<usize, Fault> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }

        self.log_mark = self.env.log.len();
        let mut taken = 0;
        while taken < count && !self.is_finished() {
            if let Err(error) = self.step() {
                return Err(self.halt(error));
            }
            taken += 1;
        }

        if self.is_finished() {
            info!(line = self.env.line, "program finished");
        }
        Ok(taken)
    }

    /// Step until the program ends
    pub fn run(&mut self) -> Result<usize, Fault> {
        let mut total = 0;
        while !self.is_finished() {
            total += self.advance(1)?;
        }
        Ok(total)
    }

    fn step(&mut self) -> Result<(), RuntimeError> {
        let start = self.env.line;
        while !self.env.control.is_empty() {
            if self.env.execute(&self.program)? == Progress::Blocked || self.env.line != start {
                break;
            }
        }
        if self.env.line == start {
            self.env.line += 1;
        }
        self.env.flush_booked_updates()?;
        self.settle();
        debug!(from = start, to = self.env.line, "step");
        Ok(())
    }

    /// Move the cursor forward to the next line the top frame can execute
    fn settle(&mut self) {
        let Some(frame) = self.env.control.last() else {
            return;
        };
        let node = self.program.node(frame.node);

        let next_line = match (&node.kind, &frame.phase) {
            _ if !frame.entered && node.is_statement() => Some(node.span.start_line()),
            (NodeKind::Compound(items), Phase::Block { next, .. }) => items
                .get(*next)
                .map(|&item| self.program.span(item).start_line()),
            _ => None,
        };

        if let Some(line) = next_line.filter(|&line| line > self.env.line) {
            self.env.line = line;
        }
    }

    fn halt(&mut self, error: RuntimeError) -> Fault {
        let line = error.location().map_or(self.env.line, |location| location.line);
        warn!(line, %error, "execution halted");
        let fault = Fault {
            error,
            snapshot: Snapshot::capture(&self.env),
        };
        self.fault = Some(fault.clone());
        fault
    }

    // ===== Read-only queries =====

    pub fn current_line(&self) -> usize {
        self.env.line
    }

    pub fn is_finished(&self) -> bool {
        self.env.control.is_empty()
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.env.lookup(name)
    }

    /// Current value of `name` as seen from the current scope
    pub fn current_value_of(&self, name: &str) -> Option<&Value> {
        self.symbol(name).and_then(|symbol| symbol.value.as_ref())
    }

    /// Every recorded write to `name`, oldest first
    pub fn history_of(&self, name: &str) -> Option<&[HistoryEntry]> {
        self.symbol(name).map(|symbol| symbol.history.as_slice())
    }

    /// Scopes from the current one up to the root
    pub fn scope_chain(&self) -> Vec<ScopeView> {
        scope_chain(&self.env)
    }

    pub fn call_stack(&self) -> &[Activation] {
        &self.env.calls
    }

    /// Nodes executed by the last `advance`
    pub fn execution_log(&self) -> &[LogEntry] {
        self.env.log.get(self.log_mark..).unwrap_or_default()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn stepper(source: &str) -> Stepper {
        Stepper::new(parse_program(source).unwrap()).unwrap()
    }

    #[test]
    fn test_starts_on_first_statement_of_main() {
        let s = stepper("int main() {\n\n  int x = 1;\n}\n");
        assert_eq!(s.current_line(), 3);
        assert!(s.current_value_of("x").is_none());
    }

    #[test]
    fn test_globals_initialized_before_main() {
        let s = stepper("int g = 7;\nint main() {\n  int x = g;\n}\n");
        assert_eq!(s.current_value_of("g"), Some(&Value::int(7)));
        assert_eq!(s.call_stack().len(), 1);
        assert_eq!(s.call_stack()[0].function, "main");
    }

    #[test]
    fn test_missing_main() {
        let program = parse_program("int f() { return 1; }").unwrap();
        let fault = Stepper::new(program).err().unwrap();
        assert_eq!(fault.error, RuntimeError::NoMainFunction);
    }

    #[test]
    fn test_one_line_per_step() {
        let mut s = stepper("int main() {\n  int x = 1;\n  x = 2;\n  x = 3;\n}\n");
        assert_eq!(s.advance(1).unwrap(), 1);
        assert_eq!(s.current_value_of("x"), Some(&Value::int(1)));
        assert_eq!(s.current_line(), 3);
        s.advance(1).unwrap();
        assert_eq!(s.current_value_of("x"), Some(&Value::int(2)));
        s.run().unwrap();
        assert!(s.is_finished());
        assert_eq!(s.current_value_of("x"), Some(&Value::int(3)));
    }

    #[test]
    fn test_fault_is_sticky() {
        let mut s = stepper("int main() {\n  int a[2];\n  a[2] = 1;\n}\n");
        let first = s.run().unwrap_err();
        assert!(matches!(first.error, RuntimeError::IndexOutOfRange { .. }));
        let again = s.advance(1).unwrap_err();
        assert_eq!(first.error, again.error);
    }

    #[test]
    fn test_execution_log_covers_last_advance() {
        let mut s = stepper("int main() {\n  int x = 1 + 2;\n}\n");
        s.advance(1).unwrap();
        let log = s.execution_log();
        assert!(log.iter().any(|entry| entry.node == "BinaryOp"));
        assert!(log.iter().all(|entry| entry.line == 2));
    }
}
