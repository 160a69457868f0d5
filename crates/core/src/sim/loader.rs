//! Program image loaders.
//!
//! Two image formats:
//! 1. **Binary:** Raw little-endian bytes, loaded verbatim.
//! 2. **Hex:** One 32-bit word per line, optionally `0x`-prefixed; blank
//!    lines and `#` comments are ignored.

use std::fs;
use std::io;
use std::path::Path;

/// Reads a raw binary image.
pub fn load_binary(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
}

/// Reads a hex image: one 32-bit word per line.
///
/// # Errors
///
/// I/O failures, or `InvalidData` for a line that does not parse as a
/// 32-bit hex word.
pub fn load_hex(path: &Path) -> io::Result<Vec<u8>> {
    let text = fs::read_to_string(path)?;
    parse_hex(&text)
}

/// Parses hex text into a little-endian byte image.
pub fn parse_hex(text: &str) -> io::Result<Vec<u8>> {
    let mut image = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let word = match line.split('#').next() {
            Some(w) => w.trim(),
            None => "",
        };
        if word.is_empty() {
            continue;
        }
        let digits = word.strip_prefix("0x").unwrap_or(word);
        let value = u32::from_str_radix(digits, 16).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line {}: bad hex word '{}': {}", lineno + 1, word, e),
            )
        })?;
        image.extend_from_slice(&value.to_le_bytes());
    }
    Ok(image)
}
