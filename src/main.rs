use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{bail, Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use ls8::config::DEFAULT_MAX_INSTRUCTIONS;
use ls8::{Config, Processor, Program, StdMem};

#[derive(Parser, Debug)]
#[command(name = "ls8", version, about = "Runs a program on the LS-8 8-bit emulator")]
struct Cli {
    /// Path to the program, one binary byte per line
    program: PathBuf,
    /// Print the PC, the next three bytes and all registers before every instruction
    #[arg(short, long)]
    trace: bool,
    /// Abort if the program has not halted after this many instructions
    #[arg(long, default_value_t = DEFAULT_MAX_INSTRUCTIONS)]
    max_instructions: u64,
    /// Run without an instruction limit
    #[arg(long, conflicts_with = "max_instructions")]
    unbounded: bool,
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> Config {
        let max_instructions = if self.unbounded {
            None
        } else {
            Some(self.max_instructions)
        };

        Config::default()
            .with_trace(self.trace)
            .with_max_instructions(max_instructions)
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    let cli = Cli::parse();
    SimpleLogger::new().with_level(cli.log_level()).init()?; // logging

    let program = Program::from_file(&cli.program)?;
    if program.is_empty() {
        bail!("`{}` contains no instructions", cli.program.display());
    }

    let mut mem = StdMem::default();
    let mut cpu = Processor::new();
    cpu.load(&mut mem, &program)
        .wrap_err_with(|| format!("Failed to load `{}`", cli.program.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    cpu.execute_until_hlt(&mut mem, &mut out, &cli.config())
        .wrap_err_with(|| format!("Execution of `{}` failed", cli.program.display()))?;
    out.flush()?;

    Ok(())
}
