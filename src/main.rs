use std::env;
use std::path::PathBuf;
use std::process;

use color_eyre::eyre::{eyre, Result};
use log::{error, LevelFilter};
use ls8::memory::parse::Program;
use ls8::processor::{Output, Processor, State, TextOutput};
use simple_logger::SimpleLogger;

const USAGE: &str = "usage: ls8 [-v|--verbose] [-t|--trace] <program.ls8>";

/// Settings taken from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Config {
    program: PathBuf,
    level: LevelFilter,
}

impl Config {
    fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut program = None;
        let mut level = LevelFilter::Warn;

        for arg in args {
            match arg.as_str() {
                "-v" | "--verbose" => level = level.max(LevelFilter::Debug),
                "-t" | "--trace" => level = LevelFilter::Trace,
                flag if flag.starts_with('-') => {
                    return Err(eyre!("Unknown option `{}`\n{}", flag, USAGE))
                }
                _ if program.is_some() => {
                    return Err(eyre!("Only one program can be run at a time\n{}", USAGE))
                }
                _ => program = Some(PathBuf::from(arg.as_str())),
            }
        }

        let program = program.ok_or_else(|| eyre!("No program file given\n{}", USAGE))?;
        Ok(Self { program, level })
    }
}

/// Loads and runs `program`, returning the process exit status
fn run_program<O: Output>(program: &Program, output: &mut O) -> i32 {
    let mut cpu = Processor::new();
    if let Err(fault) = cpu.load(program.bytes()) {
        error!("{}", fault);
        return fault.exit_code();
    }
    cpu.memory().dump();

    match cpu.run(output) {
        State::Faulted(fault) => {
            error!("{}", fault);
            fault.exit_code()
        }
        _ => 0,
    }
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling

    let config = Config::from_args(env::args().skip(1))?;
    SimpleLogger::new().with_level(config.level).init()?; // logging

    let program = Program::from_file(&config.program)?;

    match run_program(&program, &mut TextOutput::stdout()) {
        0 => Ok(()),
        code => process::exit(code),
    }
}
