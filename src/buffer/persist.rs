//! Dense `.npy` (format 1.0, little-endian `f8`, C order) files for the history.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::error::BufferError;

const MAGIC: &[u8] = b"\x93NUMPY";
const ALIGN: usize = 64;

/// A row-major matrix read from or written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl DenseMatrix {
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BufferError + '_ {
    move |source| BufferError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn invalid(path: &Path, reason: impl Into<String>) -> BufferError {
    BufferError::InvalidFormat {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn header(rows: usize, cols: usize) -> Vec<u8> {
    let dict = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    // magic + version + u16 length prefix
    let prefix = MAGIC.len() + 2 + 2;
    let unpadded = prefix + dict.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
    let mut text = dict.into_bytes();
    text.extend(std::iter::repeat(b' ').take(padding));
    text.push(b'\n');

    let mut out = Vec::with_capacity(prefix + text.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(text.len() as u16).to_le_bytes());
    out.extend_from_slice(&text);
    out
}

/// Writes `rows` (each of length `cols`) as a `[rows.len(), cols]` array.
pub fn write_matrix<'a, I>(path: &Path, cols: usize, rows: I) -> Result<(), BufferError>
where
    I: ExactSizeIterator<Item = &'a [f64]>,
{
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&header(rows.len(), cols))
        .map_err(io_error(path))?;
    for row in rows {
        if row.len() != cols {
            return Err(invalid(
                path,
                format!("row of length {} in a {cols}-column matrix", row.len()),
            ));
        }
        for v in row {
            writer.write_all(&v.to_le_bytes()).map_err(io_error(path))?;
        }
    }
    writer.flush().map_err(io_error(path))
}

fn parse_shape(path: &Path, dict: &str) -> Result<(usize, usize), BufferError> {
    let start = dict
        .find("'shape':")
        .ok_or_else(|| invalid(path, "missing shape"))?;
    let rest = &dict[start..];
    let open = rest.find('(').ok_or_else(|| invalid(path, "malformed shape"))?;
    let close = rest.find(')').ok_or_else(|| invalid(path, "malformed shape"))?;
    let dims: Vec<usize> = rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|e| invalid(path, format!("bad dimension: {e}")))?;
    match dims.as_slice() {
        [rows, cols] => Ok((*rows, *cols)),
        other => Err(invalid(path, format!("expected 2 dimensions, got {}", other.len()))),
    }
}

/// Reads a two-dimensional `<f8` C-order array.
pub fn read_matrix(path: &Path) -> Result<DenseMatrix, BufferError> {
    let file = File::open(path).map_err(io_error(path))?;
    let file_len = file.metadata().map_err(io_error(path))?.len();
    let mut reader = BufReader::new(file);

    let mut preamble = [0u8; 8];
    reader.read_exact(&mut preamble).map_err(io_error(path))?;
    if &preamble[..6] != MAGIC {
        return Err(invalid(path, "not an npy file"));
    }
    let (header_len, prefix_len) = match preamble[6] {
        1 => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len).map_err(io_error(path))?;
            (u16::from_le_bytes(len) as usize, 10)
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len).map_err(io_error(path))?;
            (u32::from_le_bytes(len) as usize, 12)
        }
        v => return Err(invalid(path, format!("unsupported version {v}"))),
    };
    let payload_len = file_len
        .checked_sub(prefix_len + header_len as u64)
        .ok_or_else(|| invalid(path, "header runs past the end of the file"))?;
    let mut text = vec![0u8; header_len];
    reader.read_exact(&mut text).map_err(io_error(path))?;
    let dict = String::from_utf8_lossy(&text);

    if !dict.contains("'descr': '<f8'") {
        return Err(invalid(path, "only little-endian f8 arrays are supported"));
    }
    if !dict.contains("'fortran_order': False") {
        return Err(invalid(path, "only C-order arrays are supported"));
    }
    let (rows, cols) = parse_shape(path, &dict)?;

    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(8))
        .ok_or_else(|| invalid(path, format!("shape ({rows}, {cols}) overflows")))?;
    if expected as u64 != payload_len {
        return Err(invalid(
            path,
            format!("shape ({rows}, {cols}) needs {expected} data bytes, file holds {payload_len}"),
        ));
    }
    let mut bytes = vec![0u8; expected];
    reader.read_exact(&mut bytes).map_err(io_error(path))?;
    let data = bytes
        .chunks_exact(8)
        .map(|c| {
            let mut b = [0u8; 8];
            b.copy_from_slice(c);
            f64::from_le_bytes(b)
        })
        .collect();
    Ok(DenseMatrix { rows, cols, data })
}
