//! Register-machine CPU emulator CLI.
//!
//! Loads a textual binary program into RAM, runs the fetch-decode-execute
//! loop to completion, and prints a summary of the halted machine state.
//!
//! # Usage
//!
//! `rm64 <file> [base_address] [-c <config>] [-t] [-v]`

use clap::Parser;
use std::path::PathBuf;
use std::process;

use rm64_emulator::config::{self, Config};
use rm64_emulator::core::bus::Ram;
use rm64_emulator::core::registers::RegisterFile;
use rm64_emulator::core::Cpu;
use rm64_emulator::sim::loader;

/// Command-line arguments for the register-machine emulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "64-bit register-machine CPU emulator")]
struct Args {
    /// Program file: newline-separated 64-character binary words.
    file: PathBuf,

    /// Address to load the program at and start execution from. Accepts
    /// decimal or `0x`-prefixed hex. Defaults to `0`.
    #[arg(value_parser = parse_base_address)]
    base_address: Option<u64>,

    /// Optional TOML configuration file (RAM capacity, word width, trace
    /// default). Missing fields fall back to built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a one-line fetch/execute trace per cycle to stderr.
    #[arg(short, long)]
    trace: bool,

    /// Print a per-register-group breakdown in addition to the baseline
    /// summary.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_base_address(s: &str) -> Result<u64, String> {
    config::parse_address(s).ok_or_else(|| format!("invalid address '{s}'"))
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str::<Config>(&text) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("failed to parse config '{}': {e}", path.display());
                    process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("failed to read config '{}': {e}", path.display());
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let start_address = args
        .base_address
        .unwrap_or_else(|| config.general.start_address_val());
    let trace = args.trace || config.general.trace;

    let mut ram = Ram::new(config.ram.capacity, config.ram.word_bits);
    let load_result = match loader::load(&args.file, start_address, &mut ram) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let mut regs = RegisterFile::new();
    regs.pc = load_result.entry_point;
    regs.sp = config.ram.capacity as u64 - 1;

    let mut cpu = Cpu::new(regs, ram, trace);
    println!("program: {}", args.file.display());
    println!("entry point: {:#x}", load_result.entry_point);
    println!("initial SP: {:#x}", cpu.regs.sp);

    if let Err(e) = cpu.run() {
        eprintln!("fatal: {e}");
        cpu.regs.dump();
        cpu.stats.print();
        process::exit(1);
    }

    cpu.stats.print();
    if args.verbose {
        cpu.regs.dump_verbose();
    } else {
        cpu.regs.dump();
    }
}
