//! TOML configuration for RAM sizing and default run behavior.
//!
//! Every field carries a `#[serde(default = "...")]` function, mirroring
//! the teacher's `GeneralConfig`/`SystemConfig` split, so a missing or
//! partial config file (or no `--config` flag at all) still produces a
//! fully-populated `Config`.

use serde::Deserialize;

const DEFAULT_RAM_CAPACITY: usize = 65536;
const DEFAULT_WORD_BITS: u32 = 64;
const DEFAULT_START_ADDRESS: &str = "0x0";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ram: RamConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ram: RamConfig::default(),
            general: GeneralConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RamConfig {
    #[serde(default = "default_ram_capacity")]
    pub capacity: usize,
    #[serde(default = "default_word_bits")]
    pub word_bits: u32,
}

impl Default for RamConfig {
    fn default() -> Self {
        Self {
            capacity: default_ram_capacity(),
            word_bits: default_word_bits(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub trace: bool,
    #[serde(default = "default_start_address")]
    pub start_address: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace: false,
            start_address: default_start_address(),
        }
    }
}

impl GeneralConfig {
    /// Parses `start_address` as decimal or `0x`-prefixed hex, falling
    /// back to `0` if the string is malformed.
    pub fn start_address_val(&self) -> u64 {
        parse_address(&self.start_address).unwrap_or(0)
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal address string.
pub fn parse_address(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse::<u64>().ok(),
    }
}

fn default_ram_capacity() -> usize {
    DEFAULT_RAM_CAPACITY
}

fn default_word_bits() -> u32 {
    DEFAULT_WORD_BITS
}

fn default_start_address() -> String {
    DEFAULT_START_ADDRESS.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = Config::default();
        assert_eq!(config.ram.capacity, 65536);
        assert_eq!(config.ram.word_bits, 64);
        assert!(!config.general.trace);
        assert_eq!(config.general.start_address_val(), 0);
    }

    #[test]
    fn parse_address_accepts_hex_and_decimal() {
        assert_eq!(parse_address("0x100"), Some(0x100));
        assert_eq!(parse_address("256"), Some(256));
        assert_eq!(parse_address("not-a-number"), None);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let toml_str = "[ram]\ncapacity = 1024\n";
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ram.capacity, 1024);
        assert_eq!(config.ram.word_bits, 64);
        assert!(!config.general.trace);
    }
}
