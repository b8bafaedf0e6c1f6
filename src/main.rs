use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use lollipop::asm;
use lollipop::bytecode::{self, Image};
use lollipop::diagnostic::ansi::AnsiRenderer;
use lollipop::diagnostic::{Diagnostic, json, registry};
use lollipop::isa::Word;
use lollipop::vm::{EndReason, Engine};

/// Exit status for a run cut short by `--max-steps`.
const EXIT_STOPPED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "lollipop", version, about = "Assemble, inspect and run Lollipop programs")]
struct Cli {
    /// Emit diagnostics (and `disasm` output) as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable ANSI colors in diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    /// Log engine and loader decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a bytecode file
    Run {
        /// Bytecode file (prompted for when missing)
        file: Option<PathBuf>,

        /// Memory size in 64-bit words (prompted for when missing)
        #[arg(env = "LOLLIPOP_MEMORY")]
        memory: Option<usize>,

        /// Print Memory[0] and the line after every step
        #[arg(long)]
        trace: bool,

        /// Stop after this many executed instructions
        #[arg(long)]
        max_steps: Option<u64>,
    },
    /// Assemble a text program into bytecode
    Asm {
        /// Assembly source (prompted for when missing)
        source: Option<PathBuf>,

        /// Where to write the bytecode (prompted for when missing)
        output: Option<PathBuf>,
    },
    /// Print the text form of a bytecode file
    Disasm {
        /// Bytecode file (prompted for when missing)
        file: Option<PathBuf>,
    },
    /// Explain an error code, e.g. `lollipop explain LP-R002`
    Explain { code: String },
}

struct Reporter {
    json: bool,
    color: bool,
}

impl Reporter {
    fn emit(&self, d: &Diagnostic) {
        if self.json {
            eprintln!("{}", json::render(d));
        } else {
            eprint!("{}", AnsiRenderer { use_color: self.color }.render(d));
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,lollipop=debug")
    } else {
        // JSON consumers get a clean stderr unless they ask for logs.
        let default = if json { "off" } else { "warn" };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json);

    let reporter = Reporter {
        json: cli.json,
        color: !cli.no_color && io::stderr().is_terminal(),
    };

    let result = match cli.command {
        Command::Run { file, memory, trace, max_steps } => {
            run_file(&reporter, file, memory, trace, max_steps)
        }
        Command::Asm { source, output } => assemble_file(source, output),
        Command::Disasm { file } => disassemble_file(file, cli.json),
        Command::Explain { code } => explain(&code),
    };

    match result {
        Ok(code) => code,
        Err(d) => {
            reporter.emit(&d);
            ExitCode::FAILURE
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────

fn run_file(
    reporter: &Reporter,
    file: Option<PathBuf>,
    memory: Option<usize>,
    trace: bool,
    max_steps: Option<u64>,
) -> Result<ExitCode, Diagnostic> {
    let path = path_or_prompt(file, "Enter the file that you'd like to execute: ")?;
    let image = load_image(&path)?;

    let size = match memory {
        Some(n) => n,
        None => {
            let answer = prompt("Enter the amount of memory in units of 64 bits that you'd like: ")?;
            answer
                .parse()
                .map_err(|_| Diagnostic::error(format!("invalid memory size '{answer}'")))?
        }
    };
    let memory = image.memory(size).map_err(|e| Diagnostic::from(&e))?;
    debug!(file = %path.display(), memory = size, lines = image.program.len(), "starting run");

    let mut engine = Engine::new(&image.program, memory);
    let mut stdin = io::stdin().lock();
    let mut out = io::stdout().lock();

    loop {
        match engine.status() {
            EndReason::Null => {
                if max_steps.is_some_and(|limit| engine.steps() >= limit) {
                    reporter.emit(
                        &Diagnostic::warning(format!("stopped after {} steps", engine.steps()))
                            .with_note(format!("next line is {}", engine.line() + 1))
                            .with_suggestion("raise --max-steps or drop it to run to completion"),
                    );
                    return Ok(ExitCode::from(EXIT_STOPPED));
                }
                engine.step();
            }
            EndReason::Input => {
                let value = read_input(&mut stdin, engine.pending_input())?;
                engine.supply_input(value).map_err(|e| Diagnostic::from(&e))?;
                // the suspending step was already traced
                continue;
            }
            EndReason::Natural => return Ok(ExitCode::SUCCESS),
            EndReason::Error => {
                let d = engine
                    .fault()
                    .map(Diagnostic::from)
                    .unwrap_or_else(|| Diagnostic::error("the program crashed"));
                return Err(d.with_note(format!("at line {}", engine.line() + 1)));
            }
        }
        if trace {
            print_trace(&mut out, &engine).map_err(|e| io_error("stdout", &e))?;
        }
    }
}

fn assemble_file(source: Option<PathBuf>, output: Option<PathBuf>) -> Result<ExitCode, Diagnostic> {
    let source_path = path_or_prompt(source, "Enter the file that you'd like to assemble: ")?;
    let text = std::fs::read_to_string(&source_path).map_err(|e| io_error(&source_path.display().to_string(), &e))?;
    let image = asm::assemble(&text).map_err(|e| {
        Diagnostic::from(&e)
            .with_source(text.as_str())
            .with_note(format!("in {}", source_path.display()))
    })?;

    let output = path_or_prompt(output, "Enter the file to write the bytecode to: ")?;
    std::fs::write(&output, bytecode::encode(&image)).map_err(|e| io_error(&output.display().to_string(), &e))?;
    debug!(
        source = %source_path.display(),
        output = %output.display(),
        header = image.header.len(),
        lines = image.program.len(),
        "assembled"
    );
    Ok(ExitCode::SUCCESS)
}

fn disassemble_file(file: Option<PathBuf>, as_json: bool) -> Result<ExitCode, Diagnostic> {
    let path = path_or_prompt(file, "Enter the file that you'd like to disassemble: ")?;
    let image = load_image(&path)?;
    if as_json {
        let text = serde_json::to_string_pretty(&image)
            .map_err(|e| Diagnostic::error(format!("serialization error: {e}")))?;
        println!("{text}");
    } else {
        print!("{}", asm::disassemble(&image));
    }
    Ok(ExitCode::SUCCESS)
}

fn explain(code: &str) -> Result<ExitCode, Diagnostic> {
    match registry::lookup(code) {
        Some(entry) => {
            print!("{}", entry.long);
            Ok(ExitCode::SUCCESS)
        }
        None => Err(Diagnostic::error(format!("unknown error code '{code}'")).with_note(format!(
            "known codes: {}",
            registry::REGISTRY.iter().map(|e| e.code).collect::<Vec<_>>().join(", ")
        ))),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn io_error(what: &str, e: &io::Error) -> Diagnostic {
    Diagnostic::error(format!("failed to access {what}: {e}"))
}

fn prompt(message: &str) -> Result<String, Diagnostic> {
    println!("{message}");
    let mut line = String::new();
    io::stdin().read_line(&mut line).map_err(|e| io_error("stdin", &e))?;
    Ok(line.trim().to_string())
}

fn path_or_prompt(path: Option<PathBuf>, message: &str) -> Result<PathBuf, Diagnostic> {
    if let Some(p) = path {
        return Ok(p);
    }
    let answer = prompt(message)?;
    if answer.is_empty() {
        return Err(Diagnostic::error("no file given"));
    }
    Ok(PathBuf::from(answer))
}

fn load_image(path: &Path) -> Result<Image, Diagnostic> {
    let bytes = std::fs::read(path).map_err(|e| io_error(&path.display().to_string(), &e))?;
    bytecode::decode(&bytes).map_err(|e| Diagnostic::from(&e).with_note(format!("in {}", path.display())))
}

/// Read one value for a suspended INPUT. Negative numbers are stored as
/// their two's complement; anything unparsable becomes 0.
fn read_input(stdin: &mut impl BufRead, target: Option<Word>) -> Result<Word, Diagnostic> {
    if io::stdin().is_terminal() {
        eprint!("input for mem[{}]: ", target.unwrap_or_default());
        io::stderr().flush().ok();
    }
    let mut line = String::new();
    let read = stdin.read_line(&mut line).map_err(|e| io_error("stdin", &e))?;
    if read == 0 {
        return Err(Diagnostic::error("input ended while the program was waiting for a value"));
    }
    let text = line.trim();
    let value = text
        .parse::<Word>()
        .or_else(|_| text.parse::<i64>().map(|v| v as Word))
        .unwrap_or_else(|_| {
            warn!(input = text, "not a number, using 0");
            0
        });
    Ok(value)
}

fn print_trace(out: &mut impl Write, engine: &Engine<'_>) -> io::Result<()> {
    match engine.memory().as_slice().first() {
        Some(first) => writeln!(out, "Memory[0]: {first}")?,
        None => writeln!(out, "Memory[0]: -")?,
    }
    writeln!(out, "Line: {}", engine.line())
}
