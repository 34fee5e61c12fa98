//! Scalar attribute files

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GadgetError, Result};

fn attr_path(dir: &Path, entry: &str, field: &str) -> PathBuf {
    if entry.is_empty() {
        dir.join(field)
    } else {
        dir.join(entry).join(field)
    }
}

/// Read the first line of `dir/entry/field`, without its newline
///
/// An empty `entry` addresses `dir/field` directly.
pub fn read_string(dir: &Path, entry: &str, field: &str) -> Result<String> {
    let path = attr_path(dir, entry, field);
    let file = File::open(&path).map_err(|e| GadgetError::from_io(&e, path.display().to_string()))?;

    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| GadgetError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

/// Read a decimal attribute
pub fn read_dec(dir: &Path, entry: &str, field: &str) -> Result<i64> {
    read_string(dir, entry, field).map(|s| parse_int(&s, 10))
}

/// Read a hexadecimal attribute (`0x` prefix optional)
pub fn read_hex(dir: &Path, entry: &str, field: &str) -> Result<i64> {
    read_string(dir, entry, field).map(|s| parse_int(&s, 16))
}

/// Lenient integer parse in the manner of `strtol`
///
/// Skips leading whitespace, accepts a sign and, for base 16, a `0x`
/// prefix, then consumes the longest run of valid digits. Anything after
/// that run is ignored. Input without a single digit yields 0.
pub fn parse_int(s: &str, base: u32) -> i64 {
    let mut rest = s.trim_start();

    let negative = match rest.as_bytes().first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    if base == 16 {
        if let Some(stripped) = rest
            .strip_prefix("0x")
            .or_else(|| rest.strip_prefix("0X"))
        {
            // "0x" with no hex digit after it parses as the single "0"
            if stripped.starts_with(|c: char| c.is_digit(16)) {
                rest = stripped;
            }
        }
    }

    let mut value: i64 = 0;
    for digit in rest.chars().map_while(|c| c.to_digit(base)) {
        value = value.saturating_mul(base as i64).saturating_add(digit as i64);
    }

    if negative {
        -value
    } else {
        value
    }
}

/// Write `value` to `dir/entry/field`
///
/// The complete buffer, including the trailing newline, goes out in a
/// single write() call; configfs parses the value on the first write.
pub fn write_string(dir: &Path, entry: &str, field: &str, value: &str) -> Result<()> {
    let path = attr_path(dir, entry, field);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .map_err(|e| GadgetError::from_io(&e, format!("Failed to open {}", path.display())))?;

    let mut buf = Vec::with_capacity(value.len() + 1);
    buf.extend_from_slice(value.as_bytes());
    if !value.ends_with('\n') {
        buf.push(b'\n');
    }

    file.write_all(&buf)
        .and_then(|_| file.flush())
        .map_err(|e| GadgetError::Io(format!("Failed to write to {}: {}", path.display(), e)))?;

    debug!("{} <- {:?}", path.display(), value);
    Ok(())
}

/// Write a decimal attribute
pub fn write_dec(dir: &Path, entry: &str, field: &str, value: i64) -> Result<()> {
    write_string(dir, entry, field, &value.to_string())
}

/// Write an 8-bit hex attribute (`0x%02x`)
pub fn write_hex8(dir: &Path, entry: &str, field: &str, value: u8) -> Result<()> {
    write_string(dir, entry, field, &format!("0x{:02x}", value))
}

/// Write a 16-bit hex attribute (`0x%04x`)
pub fn write_hex16(dir: &Path, entry: &str, field: &str, value: u16) -> Result<()> {
    write_string(dir, entry, field, &format!("0x{:04x}", value))
}
