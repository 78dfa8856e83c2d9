//! Capture input: raw binary or hex text, from a file or stdin

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Read the whole capture into memory
pub fn read_capture(path: Option<&Path>, hex_text: bool) -> Result<Vec<u8>> {
    let raw = match path {
        Some(path) => fs::read(path).with_context(|| format!("Failed to read capture {:?}", path))?,
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read capture from stdin")?;
            buffer
        }
    };

    if hex_text {
        decode_hex_dump(&String::from_utf8_lossy(&raw))
    } else {
        Ok(raw)
    }
}

/// Decode a hex dump, tolerating whitespace, commas and `0x` prefixes
pub fn decode_hex_dump(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| token.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();
    hex::decode(&digits).context("Capture is not valid hex")
}
