mod interpreter;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use interpreter::interface::TerminalInterface;
use interpreter::machine::Interpreter;

#[derive(Parser, Debug)]
#[command(
    name = "casm",
    about = "Interactive visualizer for the casm assembly language"
)]
struct Cli {
    /// Program file to load into the editor
    file: Option<PathBuf>,
    /// Run the program to completion and print the final machine state
    /// instead of opening the visualizer
    #[arg(long)]
    headless: bool,
    /// Log verbosity in headless mode (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let program = match cli.file.as_deref().map(fs::read_to_string).transpose() {
        Ok(program) => program,
        Err(err) => {
            eprintln!("casm: {err}");
            return ExitCode::FAILURE;
        }
    };

    if cli.headless {
        let level = match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        simple_logger::SimpleLogger::new()
            .with_level(level)
            .init()
            .unwrap();

        let Some(program) = program else {
            eprintln!("casm: --headless requires a program file");
            return ExitCode::FAILURE;
        };
        return run_headless(&program);
    }

    let terminal = ratatui::init();
    TerminalInterface::new(program).run(terminal);
    ratatui::restore();
    ExitCode::SUCCESS
}

/// Run a program without the visualizer and print what the machine ended
/// up with, the way the register panel would show it.
fn run_headless(program: &str) -> ExitCode {
    let lines: Vec<&str> = program.lines().collect();
    let mut interpreter = Interpreter::new();
    if interpreter.load(&lines).is_ok() {
        let _ = interpreter.run();
    }

    if let Some(report) = interpreter.error_report() {
        eprintln!("{report}");
    }
    let snapshot = interpreter.snapshot();
    println!("PC: {}", snapshot.pc);
    for (i, value) in snapshot.registers.iter().enumerate() {
        println!("R{}: {}", i + 1, value);
    }

    if interpreter.error().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
