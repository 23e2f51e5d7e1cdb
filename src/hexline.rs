//! Hex line codec shared with the HDL testbenches.
//!
//! Buffers are written most significant byte first: the last byte in memory
//! becomes the first two characters of the line, which is how the simulation
//! registers load them.

use std::io::{self, Write};

/// Append `buffer` to `stream` as one lowercase, byte-reversed hex line.
pub fn write_hex_line<W: Write>(stream: &mut W, buffer: &[u8]) -> io::Result<()> {
    let mut line = hex::encode(buffer.iter().rev().copied().collect::<Vec<u8>>());
    line.push('\n');
    stream.write_all(line.as_bytes())
}

/// Inverse of [`write_hex_line`]: decode a line and restore storage order.
pub fn parse_hex_line(line: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let mut bytes = hex::decode(line.trim_end_matches(['\n', '\r']))?;
    bytes.reverse();
    Ok(bytes)
}
