//! REPL (Read-Eval-Print Loop) for Lumen
//!
//! Each input is compiled and run on one long-lived VM, so interned strings
//! persist between lines while every expression still compiles fresh.

use anyhow::Result;
use lumen_core::{VmConfig, VM};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// REPL prompt shown at the start of each line
const PROMPT: &str = "> ";
/// Continuation prompt while parentheses or a string are still open
const CONTINUATION_PROMPT: &str = ". ";
/// History file name
const HISTORY_FILE: &str = ".lumen_history";

/// Result of processing a REPL command
#[derive(Debug, PartialEq, Eq)]
enum CommandResult {
    /// Not a command; evaluate the input
    Continue,
    /// Exit the REPL
    Exit,
    /// Input was handled as a command
    Handled,
}

/// The Lumen REPL
pub struct Repl {
    vm: VM,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(config: VmConfig) -> Result<Self> {
        let vm = VM::with_config(config);
        let mut editor = DefaultEditor::new()?;

        if let Some(home) = home_dir() {
            let _ = editor.load_history(&home.join(HISTORY_FILE));
        }

        Ok(Self { vm, editor })
    }

    /// Run the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!("Lumen v{}", lumen_core::VERSION);
        println!("Type :help for help, :quit to exit");

        loop {
            match self.read_input() {
                Ok(Some(input)) => match self.handle_command(&input) {
                    CommandResult::Exit => break,
                    CommandResult::Handled => {}
                    CommandResult::Continue => self.eval_and_print(&input),
                },
                Ok(None) => {}
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error reading input: {err}");
                    break;
                }
            }
        }

        if let Some(home) = home_dir() {
            let _ = self.editor.save_history(&home.join(HISTORY_FILE));
        }

        Ok(())
    }

    /// Read one complete input, prompting again while it is unbalanced
    fn read_input(&mut self) -> Result<Option<String>, ReadlineError> {
        let mut input = String::new();
        let mut prompt = PROMPT;

        loop {
            let line = self.editor.readline(prompt)?;

            if input.is_empty() && line.trim().is_empty() {
                return Ok(None);
            }

            if !input.is_empty() {
                input.push('\n');
            }
            input.push_str(&line);

            if is_complete(&input) {
                let _ = self.editor.add_history_entry(&input);
                return Ok(Some(input));
            }

            prompt = CONTINUATION_PROMPT;
        }
    }

    /// Handle REPL commands (starting with :)
    fn handle_command(&mut self, input: &str) -> CommandResult {
        let trimmed = input.trim();
        let Some(cmd) = trimmed.strip_prefix(':') else {
            return CommandResult::Continue;
        };

        match cmd.trim().to_lowercase().as_str() {
            "quit" | "q" | "exit" => CommandResult::Exit,

            "help" | "h" | "?" => {
                print_help();
                CommandResult::Handled
            }

            "trace" => {
                let config = self.vm.config_mut();
                config.trace_execution = !config.trace_execution;
                println!("Execution tracing {}", on_off(config.trace_execution));
                CommandResult::Handled
            }

            "code" => {
                let config = self.vm.config_mut();
                config.print_code = !config.print_code;
                println!("Bytecode listing {}", on_off(config.print_code));
                CommandResult::Handled
            }

            "clear" | "cls" => {
                print!("\x1B[2J\x1B[1;1H");
                CommandResult::Handled
            }

            other => {
                println!("Unknown command: :{other}");
                println!("Type :help for available commands");
                CommandResult::Handled
            }
        }
    }

    /// Evaluate input; the VM prints the result itself
    fn eval_and_print(&mut self, input: &str) {
        if let Err(err) = self.vm.interpret(input) {
            eprintln!("{err}");
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Check if the input is complete (balanced parentheses, closed strings)
fn is_complete(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_string {
            if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '/' if chars.peek() == Some(&'/') => {
                // Line comment runs to end of line
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }

    !in_string && depth <= 0
}

fn print_help() {
    println!(
        r#"
Lumen REPL Commands:
  :help, :h, :?    Show this help message
  :quit, :q        Exit the REPL
  :trace           Toggle instruction tracing (shown on stderr)
  :code            Toggle bytecode listings (shown on stderr)
  :clear, :cls     Clear the screen

Each line is a single expression: numbers, strings, true, false, nil,
( ), unary - and !, and the binary operators + - * / == != < <= > >=.

Examples:
  > (1 + 2) * 3
  9
  > !nil == true
  true
"#
    );
}

fn home_dir() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(std::path::PathBuf::from)
}
