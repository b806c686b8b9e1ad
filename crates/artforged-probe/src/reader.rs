//! Bounds-checked fixed-width integer reads over a byte slice.

use crate::error::{ProbeError, Result};

fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let end = offset.checked_add(len).ok_or(ProbeError::Truncated {
        need: usize::MAX,
        have: data.len(),
    })?;
    data.get(offset..end).ok_or(ProbeError::Truncated {
        need: end,
        have: data.len(),
    })
}

/// Read a big-endian `u16` at `offset`.
pub fn be_u16(data: &[u8], offset: usize) -> Result<u16> {
    let b = slice(data, offset, 2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

/// Read a big-endian `u32` at `offset`.
pub fn be_u32(data: &[u8], offset: usize) -> Result<u32> {
    let b = slice(data, offset, 4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Read a little-endian `u16` at `offset`.
pub fn le_u16(data: &[u8], offset: usize) -> Result<u16> {
    let b = slice(data, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

/// Borrow exactly `len` bytes at `offset`.
pub fn bytes(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    slice(data, offset, len)
}
