// minic: line-stepping mini-C interpreter with a terminal debugger

use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use minic::debugger::{OutputKind, OutputLine, Session};
use minic::interpreter::Stepper;
use minic::parser::parse_program;
use minic::ui::App;

#[derive(Parser)]
#[command(name = "minic")]
#[command(about = "Step through a mini-C program line by line", long_about = None)]
struct Cli {
    /// Source file to debug
    file: PathBuf,

    /// Read commands line by line instead of starting the TUI
    #[arg(long)]
    batch: bool,

    /// Command script for batch mode (default: stdin)
    #[arg(long, value_name = "PATH", requires = "batch")]
    script: Option<PathBuf>,

    /// Print the parsed node tree and exit
    #[arg(long)]
    dump_ast: bool,

    /// Write logs to this file (the only log sink in TUI mode)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `minic::interpreter=trace`
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading '{}': {}", cli.file.display(), e);
            process::exit(1);
        }
    };

    let program = match parse_program(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            process::exit(1);
        }
    };
    info!(file = %cli.file.display(), nodes = program.nodes.len(), "parsed");

    if cli.dump_ast {
        print!("{}", program.dump());
        return Ok(());
    }

    let stepper = match Stepper::new(program) {
        Ok(stepper) => stepper,
        Err(fault) => {
            eprintln!("Runtime error: {}", fault);
            eprintln!("Execution halted at line {}", fault.snapshot.line);
            process::exit(1);
        }
    };
    let session = Session::new(stepper, &source);

    if cli.batch {
        let halted = run_batch(session, cli.script.as_deref())?;
        if halted {
            process::exit(1);
        }
        Ok(())
    } else {
        run_tui(session)
    }
}

/// Batch logs go to stderr; the TUI owns the terminal, so it only logs to a file
fn init_logging(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    match &cli.log_file {
        Some(path) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(File::create(path)?))
            .with_ansi(false)
            .init(),
        None if cli.batch || cli.dump_ast => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
        None => {}
    }
    Ok(())
}

/// Feed commands to the session until `exit`, end of input or a fault.
/// Returns whether execution halted on a fault.
fn run_batch(mut session: Session, script: Option<&Path>) -> Result<bool, Box<dyn Error>> {
    let input: Box<dyn BufRead> = match script {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut out = io::stdout().lock();

    write_lines(&mut out, &[session.location_line()])?;
    for line in input.lines() {
        let line = line?;
        let output = session.execute_line(&line);
        write_lines(&mut out, &output)?;

        if session.should_exit() || session.stepper().fault().is_some() {
            break;
        }
    }
    out.flush()?;

    Ok(session.stepper().fault().is_some())
}

fn write_lines(out: &mut impl Write, lines: &[OutputLine]) -> io::Result<()> {
    for line in lines {
        match line.kind {
            OutputKind::Error => writeln!(out, "error: {}", line.text)?,
            _ => writeln!(out, "{}", line.text)?,
        }
    }
    Ok(())
}

fn run_tui(session: Session) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
