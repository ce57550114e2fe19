//! Byte views of packed halo buffers and reduced elements.
//!
//! Elements are `Pod` and travel in native byte order; every domain of one
//! run is assumed to share an architecture.

use bytemuck::Pod;

use crate::thermo_error::ThermoError;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

/// Decode a received message into owned elements. The byte buffer of a
/// message carries no alignment guarantee, so elements are read unaligned.
pub fn decode_elements<T: Pod>(neighbor: usize, bytes: &[u8], expected: usize) -> Result<Vec<T>, ThermoError> {
    let size = std::mem::size_of::<T>();
    expect_exact_len(neighbor, bytes.len(), expected * size)?;
    if size == 0 {
        return Ok(vec![T::zeroed(); expected]);
    }
    Ok(bytes
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned::<T>)
        .collect())
}

pub fn expect_exact_len(neighbor: usize, actual: usize, expected: usize) -> Result<(), ThermoError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ThermoError::CommError {
            neighbor,
            reason: format!("expected {expected} bytes, got {actual}"),
        })
    }
}
