//! Program loader.
//!
//! Parses a textual binary file of 64-bit words, relocates jump targets
//! so programs can be loaded position-independently, and writes the
//! result into RAM. This fixes the on-disk program format the decoder's
//! J-type opcodes rely on (`core::decode::JUMP_OPCODES`).

use crate::common::LoaderError;
use crate::core::bus::Ram;
use crate::core::decode::JUMP_OPCODES;
use std::fs;
use std::path::Path;

const LINE_LEN: usize = 64;
const J_TARGET_MASK: u64 = 0x00FF_FFFF_FFFF_FFFF;

/// Result of a successful load: where execution should begin, and the
/// first address past the loaded program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadResult {
    pub entry_point: u64,
    pub end_address: u64,
}

/// Reads a program file, relocates it, and writes it into `ram` starting
/// at `start_address`.
///
/// Lines are stripped of trailing whitespace; blank lines and lines
/// starting with `#` are skipped. Every other line must be exactly 64
/// characters of `'0'`/`'1'`, most significant bit first — anything else
/// is a [`LoaderError::BadLine`] naming the 1-indexed source line.
///
/// The entry point always equals `start_address`: there is no header in
/// this format directing execution to begin elsewhere.
pub fn load(path: &Path, start_address: u64, ram: &mut Ram) -> Result<LoadResult, LoaderError> {
    let text = fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut address = start_address;
    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let word = parse_line(line, index + 1)?;
        ram.write_direct(address, relocate(word, start_address));
        address += 1;
    }

    Ok(LoadResult {
        entry_point: start_address,
        end_address: address,
    })
}

fn parse_line(line: &str, line_no: usize) -> Result<u64, LoaderError> {
    if line.len() != LINE_LEN {
        return Err(LoaderError::BadLine {
            line: line_no,
            reason: format!("expected {LINE_LEN} characters, found {}", line.len()),
        });
    }
    if !line.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(LoaderError::BadLine {
            line: line_no,
            reason: "expected only '0' and '1' characters".to_string(),
        });
    }
    Ok(u64::from_str_radix(line, 2).expect("validated as 64 binary digits"))
}

/// If `word`'s top 8 bits are a J-type opcode, adds `start_address` to
/// the low-56-bit target field, preserving the opcode. Otherwise returns
/// `word` unchanged.
fn relocate(word: u64, start_address: u64) -> u64 {
    let opcode = (word >> 56) as u8;
    if JUMP_OPCODES.contains(&opcode) {
        let target = (word & J_TARGET_MASK).wrapping_add(start_address) & J_TARGET_MASK;
        (word & !J_TARGET_MASK) | target
    } else {
        word
    }
}
