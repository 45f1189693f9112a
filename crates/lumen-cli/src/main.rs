//! Lumen CLI - command-line interface for the Lumen expression language

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lumen_core::bytecode::disassemble_chunk;
use lumen_core::vm::{InterpretError, DEFAULT_STACK_MAX};
use lumen_core::{compile, Heap, VmConfig, VM};
use std::path::{Path, PathBuf};
use std::{fs, process};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod repl;

/// Exit status when the input file cannot be read (sysexits `EX_IOERR`)
const EXIT_IO_ERROR: i32 = 74;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(version = lumen_core::VERSION)]
#[command(about = "The Lumen expression language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    vm: VmArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive REPL (the default)
    Repl,

    /// Run a Lumen source file
    Run {
        /// Path to the source file
        file: PathBuf,
    },

    /// Evaluate a Lumen expression
    Eval {
        /// Expression to evaluate
        expression: String,
    },

    /// Compile a source file and print its bytecode without running it
    Disasm {
        /// Path to the source file
        file: PathBuf,
    },
}

/// Interpreter settings shared by every command
#[derive(Args, Debug, Clone)]
struct VmArgs {
    /// Trace the operand stack and each instruction to stderr
    #[arg(long, global = true)]
    trace: bool,

    /// Print the bytecode of each compiled expression to stderr
    #[arg(long, global = true)]
    print_code: bool,

    /// Operand stack capacity
    #[arg(long, global = true, default_value_t = DEFAULT_STACK_MAX)]
    stack_size: usize,
}

impl VmArgs {
    fn config(&self) -> VmConfig {
        VmConfig::new()
            .with_stack_max(self.stack_size)
            .with_trace_execution(self.trace)
            .with_print_code(self.print_code)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.vm);
    let config = cli.vm.config();

    match cli.command {
        None | Some(Commands::Repl) => {
            let mut repl = repl::Repl::new(config)?;
            repl.run()?;
        }

        Some(Commands::Run { file }) => run_file(&file, config),

        Some(Commands::Eval { expression }) => {
            let mut vm = VM::with_config(config);
            exit_on_error(vm.interpret(&expression));
        }

        Some(Commands::Disasm { file }) => {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("could not read {}", file.display()))?;
            debug!(path = %file.display(), bytes = source.len(), "read source file");
            match disassemble_source(&source, &file.display().to_string()) {
                Ok(listing) => print!("{listing}"),
                Err(err) => exit_on_error::<()>(Err(err)),
            }
        }
    }

    Ok(())
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` picks the general level (default `warn`). `--trace` raises
/// `lumen_core` to TRACE and `--print-code` to DEBUG. The execution trace and
/// bytecode listing targets are always let through so the REPL toggles work;
/// the VM only emits them when its config asks for them.
fn init_tracing(args: &VmArgs) {
    let base = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|directives| !directives.trim().is_empty())
        .unwrap_or_else(|| "warn".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_directives(&base, args)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn log_directives(base: &str, args: &VmArgs) -> String {
    let mut directives = vec![base];
    if args.trace {
        directives.push("lumen_core=trace");
    } else if args.print_code {
        directives.push("lumen_core=debug");
    }
    directives.push("lumen_core::trace=trace");
    directives.push("lumen_core::code=debug");
    directives.join(",")
}

/// Interpret a whole file, exiting with the conventional status on failure
fn run_file(path: &Path, config: VmConfig) {
    let source = match fs::read_to_string(path) {
        Ok(source) => {
            debug!(path = %path.display(), bytes = source.len(), "read source file");
            source
        }
        Err(err) => {
            eprintln!("Could not open file \"{}\": {err}", path.display());
            process::exit(EXIT_IO_ERROR);
        }
    };

    let mut vm = VM::with_config(config);
    exit_on_error(vm.interpret(&source));
}

/// Compile `source` and render its bytecode listing
fn disassemble_source(source: &str, name: &str) -> Result<String, InterpretError> {
    let mut heap = Heap::new();
    let chunk = compile(source, &mut heap).map_err(InterpretError::Compile)?;
    Ok(disassemble_chunk(&chunk, &heap, name))
}

fn exit_on_error<T>(result: Result<T, InterpretError>) {
    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(err.exit_code());
    }
}
