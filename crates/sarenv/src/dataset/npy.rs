//! Minimal NumPy `.npy` codec for 2-D little-endian `f64` arrays.
//!
//! Writes format version 1.0 with a header padded to a multiple of 64 bytes. Reads versions
//! 1.0 and 2.0, C order only.
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;

/// A decoded row-major array.
#[derive(Clone, Debug, PartialEq)]
pub struct NpyArray {
    /// `(rows, columns)`.
    pub shape: (usize, usize),
    pub data: Vec<f64>,
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::Dataset(format!("npy: {}", msg.into()))
}

/// Encodes `data` (row-major, `rows * cols` values) as an `.npy` byte buffer.
pub fn encode(rows: usize, cols: usize, data: &[f64]) -> Result<Vec<u8>> {
    if data.len() != rows * cols {
        return Err(malformed(format!(
            "{} values do not fill a {rows}x{cols} array",
            data.len()
        )));
    }
    let mut header =
        format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    // magic + version + u16 length + header + newline
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
    header.extend(std::iter::repeat_n(' ', padding));
    header.push('\n');

    let header_len = u16::try_from(header.len()).map_err(|_| malformed("header too long"))?;
    let mut out = Vec::with_capacity(unpadded + padding + data.len() * 8);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in data {
        out.extend_from_slice(&v.to_le_bytes());
    }
    Ok(out)
}

/// Decodes an `.npy` byte buffer holding a 2-D `<f8` array.
pub fn decode(bytes: &[u8]) -> Result<NpyArray> {
    let rest = bytes
        .strip_prefix(MAGIC.as_slice())
        .ok_or_else(|| malformed("missing magic string"))?;
    let (header_len, rest) = match rest {
        [1, _, a, b, rest @ ..] => (u16::from_le_bytes([*a, *b]) as usize, rest),
        [2 | 3, _, a, b, c, d, rest @ ..] => {
            (u32::from_le_bytes([*a, *b, *c, *d]) as usize, rest)
        }
        [major, ..] => return Err(malformed(format!("unsupported format version {major}"))),
        [] => return Err(malformed("truncated preamble")),
    };
    if rest.len() < header_len {
        return Err(malformed("truncated header"));
    }
    let (header, body) = rest.split_at(header_len);
    let header = std::str::from_utf8(header).map_err(|_| malformed("header is not text"))?;

    let descr = header_value(header, "descr")
        .and_then(|v| v.strip_prefix('\''))
        .and_then(|v| v.split('\'').next())
        .ok_or_else(|| malformed("header has no descr"))?;
    if descr != "<f8" {
        return Err(malformed(format!("unsupported dtype '{descr}'")));
    }
    let fortran = header_value(header, "fortran_order")
        .ok_or_else(|| malformed("header has no fortran_order"))?;
    if !fortran.starts_with("False") {
        return Err(malformed("Fortran-ordered arrays are not supported"));
    }
    let dims = header_value(header, "shape")
        .and_then(|v| v.strip_prefix('('))
        .and_then(|v| v.split(')').next())
        .ok_or_else(|| malformed("header has no shape"))?
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<usize>().map_err(|_| malformed(format!("bad dimension '{d}'"))))
        .collect::<Result<Vec<_>>>()?;
    let shape = match dims.as_slice() {
        [rows, cols] => (*rows, *cols),
        _ => return Err(malformed(format!("expected 2 dimensions, got {}", dims.len()))),
    };

    let count = shape.0 * shape.1;
    if body.len() != count * 8 {
        return Err(malformed(format!(
            "expected {} data bytes, found {}",
            count * 8,
            body.len()
        )));
    }
    let data = body
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();
    Ok(NpyArray { shape, data })
}

fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let quoted = format!("'{key}'");
    let start = header.find(&quoted)? + quoted.len();
    Some(header[start..].trim_start().strip_prefix(':')?.trim_start())
}

pub fn write(path: &Path, rows: usize, cols: usize, data: &[f64]) -> Result<()> {
    fs::write(path, encode(rows, cols, data)?)?;
    Ok(())
}

pub fn read(path: &Path) -> Result<NpyArray> {
    decode(&fs::read(path)?)
}
