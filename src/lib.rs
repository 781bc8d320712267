//! 64-bit register-machine CPU emulator.
//!
//! This crate implements a software emulator of a custom register-machine
//! ISA: a decoder/execution engine, an ALU with integer, Q32.32
//! fixed-point, logical, and shift operations, a memory bus connecting the
//! CPU to a linear RAM, and a loader for the on-disk program format.
//!
//! # Architecture
//!
//! * **Core**: fetch-decode-execute loop over a ten-register general
//!   file, six special registers, and a four-flag condition set.
//! * **Memory**: a single linear RAM reached through a three-signal bus
//!   (`data`, `address`, `control`); no caching, paging, or MMIO devices.
//! * **Peripherals**: none — RAM is the machine's only device.
//!
//! # Modules
//!
//! * `common`: Shared types, constants, and error handling.
//! * `config`: Configuration loading and parsing.
//! * `core`: register file, ALU, memory bus, decoder, and execution engine.
//! * `sim`: the program loader.
//! * `stats`: run statistics (cycle count, wall-clock time).

/// Shared types, constants, and error handling.
///
/// Provides the word mask, sign-extension helper, and the error types
/// surfaced by the loader and the execution engine.
pub mod common;

/// TOML configuration for RAM sizing and default run behavior.
///
/// Loads and parses a TOML configuration file, falling back to built-in
/// defaults for any field the file omits.
pub mod config;

/// CPU core implementation: register file, ALU, memory bus, instruction
/// decoder, and the execution engine tying them together.
pub mod core;

/// The program loader: parses the textual binary format, relocates jump
/// targets, and populates RAM before execution begins.
pub mod sim;

/// Run statistics: cycle count and wall-clock time.
pub mod stats;
