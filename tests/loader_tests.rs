//! Black-box tests for the program loader.

use rm64_emulator::common::LoaderError;
use rm64_emulator::core::bus::Ram;
use rm64_emulator::sim::loader;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

struct ScratchFile(PathBuf);

impl ScratchFile {
    fn new(contents: &str) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!(
            "rm64-loader-integration-{}-{id}.txt",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn loads_a_valid_program_and_reports_entry_and_end() {
    let halt = "1".repeat(64);
    let nop = "0".repeat(64);
    let file = ScratchFile::new(&format!("{nop}\n{halt}\n"));
    let mut ram = Ram::new(64, 64);
    let result = loader::load(&file.0, 0, &mut ram).unwrap();
    assert_eq!(result.entry_point, 0);
    assert_eq!(result.end_address, 2);
    assert_eq!(ram.request(0, 0, 0), 0);
    assert_eq!(ram.request(0, 1, 0), 0xFFFF_FFFF_FFFF_FFFF);
}

#[test]
fn comments_and_blank_lines_do_not_consume_an_address() {
    let halt = "1".repeat(64);
    let file = ScratchFile::new(&format!("# header\n\n{halt}\n\n# trailer\n"));
    let mut ram = Ram::new(64, 64);
    let result = loader::load(&file.0, 10, &mut ram).unwrap();
    assert_eq!(result.entry_point, 10);
    assert_eq!(result.end_address, 11);
    assert_eq!(ram.request(0, 10, 0), 0xFFFF_FFFF_FFFF_FFFF);
}

#[test]
fn wrong_line_length_names_the_source_line() {
    let halt = "1".repeat(64);
    let file = ScratchFile::new(&format!("{halt}\nshort\n"));
    let mut ram = Ram::new(64, 64);
    let err = loader::load(&file.0, 0, &mut ram).unwrap_err();
    match err {
        LoaderError::BadLine { line, .. } => assert_eq!(line, 2),
        other => panic!("expected BadLine, got {other:?}"),
    }
}

#[test]
fn non_binary_character_is_rejected() {
    let mut bad = "1".repeat(63);
    bad.push('9');
    let file = ScratchFile::new(&format!("{bad}\n"));
    let mut ram = Ram::new(64, 64);
    assert!(matches!(
        loader::load(&file.0, 0, &mut ram).unwrap_err(),
        LoaderError::BadLine { .. }
    ));
}

#[test]
fn relocation_shifts_jump_targets_by_the_base_address() {
    // JMPZ (opcode 0x02) targeting address 0x05.
    let word = (0x02u64 << 56) | 0x05;
    let line = format!("{word:064b}");
    let file = ScratchFile::new(&format!("{line}\n"));
    let mut ram = Ram::new(256, 64);
    loader::load(&file.0, 0x100, &mut ram).unwrap();
    let loaded = ram.request(0, 0x100, 0);
    assert_eq!(loaded & 0x00FF_FFFF_FFFF_FFFF, 0x105);
    assert_eq!(loaded >> 56, 0x02);
}

#[test]
fn missing_file_reports_an_io_error() {
    let mut ram = Ram::new(16, 64);
    let err = loader::load(&PathBuf::from("/nonexistent/rm64-test.bin"), 0, &mut ram).unwrap_err();
    assert!(matches!(err, LoaderError::Io { .. }));
}
