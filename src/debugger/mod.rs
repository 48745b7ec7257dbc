//! Debugger command layer
//!
//! [`Command`] parses one line of user input; [`Session`] executes commands
//! against a [`Stepper`] and returns the resulting [`OutputLine`]s. Both the
//! TUI console and batch mode go through this module, so they accept the
//! same commands and print the same text.
//!
//! | command | effect |
//! |---|---|
//! | `next [n]` (or empty input) | advance `n` lines, default 1 |
//! | `print <name>` | current value of `name` |
//! | `trace <name>` | every value `name` has held, with the line of each write |
//! | `scope` | the scope chain, innermost first |
//! | `log` | nodes executed by the last `next` |
//! | `help` | command summary |
//! | `exit` | end the session |
//!
//! Only `next` changes the interpreter; every other command is read-only.

use crate::interpreter::Stepper;
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &[&str] = &[
    "next [n]      execute n lines (default 1); empty input means next 1",
    "print <name>  show the current value of a variable",
    "trace <name>  show every value a variable has held",
    "scope         show the scope chain and its symbols",
    "log           show the nodes executed by the last next",
    "help          show this help",
    "exit          quit",
];

/// A parsed debugger command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next(usize),
    Print(String),
    Trace(String),
    Scope,
    Log,
    Help,
    Exit,
}

/// Malformed command input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}' - use next, print, trace, scope, log, help or exit")]
    Unknown(String),

    #[error("Incorrect usage: try \"{0}\"")]
    Usage(&'static str),

    #[error("Invalid variable name '{0}'")]
    InvalidName(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = input.split_whitespace().collect();
        let Some((&cmd, args)) = words.split_first() else {
            return Ok(Command::Next(1));
        };

        match cmd {
            "next" | "n" => match args {
                [] => Ok(Command::Next(1)),
                [count] => count
                    .parse()
                    .map(Command::Next)
                    .map_err(|_| CommandError::Usage("next [lines]")),
                _ => Err(CommandError::Usage("next [lines]")),
            },
            "print" | "p" => Ok(Command::Print(name_argument(args, "print <name>")?)),
            "trace" | "t" => Ok(Command::Trace(name_argument(args, "trace <name>")?)),
            "scope" => no_arguments(args, "scope", Command::Scope),
            "log" => no_arguments(args, "log", Command::Log),
            "help" | "?" => no_arguments(args, "help", Command::Help),
            "exit" | "quit" | "q" => no_arguments(args, "exit", Command::Exit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn no_arguments(args: &[&str], usage: &'static str, command: Command) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::Usage(usage))
    }
}

fn name_argument(args: &[&str], usage: &'static str) -> Result<String, CommandError> {
    match args {
        [name] if is_identifier(name) => Ok(name.to_string()),
        [name] => Err(CommandError::InvalidName(name.to_string())),
        _ => Err(CommandError::Usage(usage)),
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// How an output line should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Info,
    /// The command as typed
    Echo,
    Value,
    Error,
    Log,
}

/// One line of command output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub kind: OutputKind,
    pub text: String,
}

impl OutputLine {
    pub fn echo(input: &str) -> Self {
        OutputLine {
            kind: OutputKind::Echo,
            text: format!("> {}", input),
        }
    }

    fn info(text: impl Into<String>) -> Self {
        OutputLine {
            kind: OutputKind::Info,
            text: text.into(),
        }
    }

    fn value(text: impl Into<String>) -> Self {
        OutputLine {
            kind: OutputKind::Value,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        OutputLine {
            kind: OutputKind::Error,
            text: text.into(),
        }
    }

    fn log(text: impl Into<String>) -> Self {
        OutputLine {
            kind: OutputKind::Log,
            text: text.into(),
        }
    }
}

/// A debugging session over one program
pub struct Session {
    stepper: Stepper,
    source: Vec<String>,
    should_exit: bool,
}

impl Session {
    pub fn new(stepper: Stepper, source: &str) -> Self {
        Session {
            stepper,
            source: source.lines().map(str::to_string).collect(),
            should_exit: false,
        }
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    pub fn source(&self) -> &[String] {
        &self.source
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// Parse and run one line of input
    pub fn execute_line(&mut self, input: &str) -> Vec<OutputLine> {
        match input.parse::<Command>() {
            Ok(command) => self.execute(&command),
            Err(err) => vec![OutputLine::error(err.to_string())],
        }
    }

    pub fn execute(&mut self, command: &Command) -> Vec<OutputLine> {
        match command {
            Command::Next(count) => self.next(*count),
            Command::Print(name) => self.print(name),
            Command::Trace(name) => self.trace(name),
            Command::Scope => self.scope(),
            Command::Log => self.log(),
            Command::Help => HELP.iter().map(|line| OutputLine::info(*line)).collect(),
            Command::Exit => {
                self.should_exit = true;
                vec![OutputLine::info("Bye")]
            }
        }
    }

    /// The line about to run, as shown after every `next`
    pub fn location_line(&self) -> OutputLine {
        if self.stepper.is_finished() {
            return OutputLine::info("End of program");
        }
        let line = self.stepper.current_line();
        let text = self
            .source
            .get(line.wrapping_sub(1))
            .map(|s| s.trim())
            .unwrap_or("");
        OutputLine::info(format!("Next line ({}): {}", line, text))
    }

    fn next(&mut self, count: usize) -> Vec<OutputLine> {
        match self.stepper.advance(count) {
            Ok(_) => vec![self.location_line()],
            Err(fault) => vec![
                OutputLine::error(fault.to_string()),
                OutputLine::error(format!("Execution halted at line {}", fault.snapshot.line)),
            ],
        }
    }

    fn print(&self, name: &str) -> Vec<OutputLine> {
        let line = match self.stepper.symbol(name) {
            None => OutputLine::error(format!("Invisible variable '{}'", name)),
            Some(symbol) if symbol.is_function() => {
                OutputLine::value(format!("{} = <function>", name))
            }
            Some(symbol) => match &symbol.value {
                Some(value) => OutputLine::value(format!("{} = {}", name, value)),
                None => OutputLine::value(format!("{} = <uninitialized>", name)),
            },
        };
        vec![line]
    }

    fn trace(&self, name: &str) -> Vec<OutputLine> {
        match self.stepper.history_of(name) {
            None => vec![OutputLine::error(format!("Invisible variable '{}'", name))],
            Some([]) => vec![OutputLine::info(format!("{} has never been assigned", name))],
            Some(history) => history
                .iter()
                .map(|entry| {
                    OutputLine::value(format!("{} = {} at line {}", name, entry.value, entry.line))
                })
                .collect(),
        }
    }

    fn scope(&self) -> Vec<OutputLine> {
        let mut out = Vec::new();
        for (depth, scope) in self.stepper.scope_chain().iter().enumerate() {
            out.push(OutputLine::info(format!(
                "{}[{}] {} ({:?})",
                "  ".repeat(depth),
                depth,
                scope.label,
                scope.kind
            )));
            for symbol in &scope.symbols {
                out.push(OutputLine::value(format!(
                    "{}  {} {} = {} @ 0x{:08x}",
                    "  ".repeat(depth),
                    symbol.ty,
                    symbol.name,
                    symbol.display_value(),
                    symbol.address
                )));
            }
        }
        out
    }

    fn log(&self) -> Vec<OutputLine> {
        let log = self.stepper.execution_log();
        if log.is_empty() {
            return vec![OutputLine::info("Nothing executed yet")];
        }
        log.iter()
            .map(|entry| {
                OutputLine::log(format!(
                    "line {:>4}  {:<24} control {:>3}  values {:>3}",
                    entry.line, entry.node, entry.control_depth, entry.value_depth
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("".parse::<Command>(), Ok(Command::Next(1)));
        assert_eq!("next".parse::<Command>(), Ok(Command::Next(1)));
        assert_eq!("next 5".parse::<Command>(), Ok(Command::Next(5)));
        assert_eq!("print x".parse::<Command>(), Ok(Command::Print("x".to_string())));
        assert_eq!(
            "trace _a1".parse::<Command>(),
            Ok(Command::Trace("_a1".to_string()))
        );
        assert_eq!("scope".parse::<Command>(), Ok(Command::Scope));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Exit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "jump 3".parse::<Command>(),
            Err(CommandError::Unknown(_))
        ));
        assert!(matches!(
            "next two".parse::<Command>(),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            "next 1 2".parse::<Command>(),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            "print 9x".parse::<Command>(),
            Err(CommandError::InvalidName(_))
        ));
        assert!(matches!(
            "print".parse::<Command>(),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn test_identifier_rule() {
        assert!(is_identifier("x"));
        assert!(is_identifier("_tmp2"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
