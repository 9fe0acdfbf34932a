//! Field decoding.
//!
//! Bounds-checked readers for the two kinds of moduledata fields: plain
//! address-sized scalars and slice headers. Both treat a zero-sized
//! [`FieldOffset`] as an absent field and return a zero value for it.

use object::endian::Endian;
use object::Endianness;

use crate::error::{Error, Result};
use crate::layout::FieldOffset;

/// A runtime slice header: data pointer, length and capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SliceDescriptor {
    pub data: u64,
    pub length: u64,
    pub capacity: u64,
}

impl SliceDescriptor {
    pub const fn new(data: u64, length: u64, capacity: u64) -> Self {
        Self {
            data,
            length,
            capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// `length <= capacity`, as for any slice the runtime could have built.
    pub fn is_well_formed(&self) -> bool {
        self.length <= self.capacity
    }
}

/// Maps the caller's byte order flag onto the `object` crate's type.
pub fn endianness(little_endian: bool) -> Endianness {
    if little_endian {
        Endianness::Little
    } else {
        Endianness::Big
    }
}

/// Returns the bytes covered by `offset`, or a bounds error.
fn field_bytes(data: &[u8], offset: FieldOffset) -> Result<&[u8]> {
    let out_of_bounds = || Error::OutOfBounds {
        offset: offset.offset,
        size: offset.size,
        len: data.len(),
    };
    let end = offset.end().ok_or_else(out_of_bounds)?;
    if end > data.len() as u64 {
        return Err(out_of_bounds());
    }
    Ok(&data[offset.offset as usize..end as usize])
}

/// Decodes one unsigned word of 4 or 8 bytes. `bytes` must be exactly that long.
fn read_word(bytes: &[u8], endian: Endianness) -> Result<u64> {
    match bytes.len() {
        4 => {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(bytes);
            Ok(u64::from(endian.read_u32_bytes(raw)))
        }
        8 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Ok(endian.read_u64_bytes(raw))
        }
        n => Err(Error::UnsupportedSize(n as u64)),
    }
}

/// Reads a scalar field.
///
/// Absent fields read as zero. Sizes other than 4 and 8 are rejected rather
/// than truncated.
pub fn read_scalar(data: &[u8], offset: FieldOffset, endian: Endianness) -> Result<u64> {
    if !offset.is_present() {
        return Ok(0);
    }
    let bytes = field_bytes(data, offset)?;
    let value = read_word(bytes, endian)?;
    tracing::trace!("scalar at {:#x}/{}: {:#x}", offset.offset, offset.size, value);
    Ok(value)
}

/// Reads a slice header of three consecutive pointer-width words.
///
/// The `length <= capacity` invariant is not checked here; see [`crate::validate`].
pub fn read_slice(
    data: &[u8],
    offset: FieldOffset,
    ptr_size: u64,
    endian: Endianness,
) -> Result<SliceDescriptor> {
    if !offset.is_present() {
        return Ok(SliceDescriptor::default());
    }
    if ptr_size != 4 && ptr_size != 8 {
        return Err(Error::UnsupportedSize(ptr_size));
    }
    let bytes = field_bytes(data, offset)?;
    let width = ptr_size as usize;
    if bytes.len() < 3 * width {
        return Err(Error::UnsupportedSize(offset.size));
    }

    let slice = SliceDescriptor {
        data: read_word(&bytes[..width], endian)?,
        length: read_word(&bytes[width..2 * width], endian)?,
        capacity: read_word(&bytes[2 * width..3 * width], endian)?,
    };
    tracing::trace!(
        "slice at {:#x}/{}: data={:#x} len={} cap={}",
        offset.offset,
        offset.size,
        slice.data,
        slice.length,
        slice.capacity
    );
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_read_as_zero() {
        let data = [0xffu8; 4];
        let absent = FieldOffset::new(0x1000, 0);
        assert_eq!(read_scalar(&data, absent, Endianness::Little).unwrap(), 0);
        assert_eq!(
            read_slice(&data, absent, 8, Endianness::Big).unwrap(),
            SliceDescriptor::default()
        );
        assert_eq!(read_scalar(&[], absent, Endianness::Big).unwrap(), 0);
    }

    #[test]
    fn scalar_byte_order() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let word = FieldOffset::new(0, 4);
        let dword = FieldOffset::new(0, 8);
        assert_eq!(read_scalar(&data, word, Endianness::Little).unwrap(), 0x0403_0201);
        assert_eq!(read_scalar(&data, word, Endianness::Big).unwrap(), 0x0102_0304);
        assert_eq!(
            read_scalar(&data, dword, Endianness::Little).unwrap(),
            0x0807_0605_0403_0201
        );
        assert_eq!(
            read_scalar(&data, dword, Endianness::Big).unwrap(),
            0x0102_0304_0506_0708
        );
    }

    #[test]
    fn scalar_out_of_bounds() {
        let data = [0u8; 8];
        let err = read_scalar(&data, FieldOffset::new(6, 4), Endianness::Little).unwrap_err();
        assert_eq!(
            err,
            Error::OutOfBounds {
                offset: 6,
                size: 4,
                len: 8
            }
        );
        assert!(read_scalar(&data, FieldOffset::new(1, 8), Endianness::Big).is_err());
    }

    #[test]
    fn offset_overflow_is_a_bounds_error() {
        let data = [0u8; 8];
        let err = read_scalar(&data, FieldOffset::new(u64::MAX - 1, 4), Endianness::Little);
        assert!(matches!(err, Err(Error::OutOfBounds { .. })));
        let err = read_slice(&data, FieldOffset::new(u64::MAX, 24), 8, Endianness::Little);
        assert!(matches!(err, Err(Error::OutOfBounds { .. })));
    }

    #[test]
    fn unsupported_scalar_size() {
        let data = [0u8; 16];
        for size in [1, 2, 3, 5, 12, 16] {
            let err = read_scalar(&data, FieldOffset::new(0, size), Endianness::Little);
            assert_eq!(err, Err(Error::UnsupportedSize(size)));
        }
    }

    #[test]
    fn slice_words_in_order() {
        let mut data = vec![0u8; 12];
        data[0..4].copy_from_slice(&0x1000u32.to_be_bytes());
        data[4..8].copy_from_slice(&3u32.to_be_bytes());
        data[8..12].copy_from_slice(&7u32.to_be_bytes());
        let slice = read_slice(&data, FieldOffset::new(0, 12), 4, Endianness::Big).unwrap();
        assert_eq!(slice, SliceDescriptor::new(0x1000, 3, 7));
        assert!(slice.is_well_formed());
        assert!(!slice.is_empty());
    }

    #[test]
    fn slice_does_not_check_capacity() {
        let mut data = vec![0u8; 24];
        data[8..16].copy_from_slice(&11u64.to_le_bytes());
        data[16..24].copy_from_slice(&10u64.to_le_bytes());
        let slice = read_slice(&data, FieldOffset::new(0, 24), 8, Endianness::Little).unwrap();
        assert_eq!(slice.length, 11);
        assert!(!slice.is_well_formed());
    }

    #[test]
    fn slice_rejects_bad_pointer_width_and_short_fields() {
        let data = [0u8; 32];
        assert_eq!(
            read_slice(&data, FieldOffset::new(0, 24), 6, Endianness::Little),
            Err(Error::UnsupportedSize(6))
        );
        assert_eq!(
            read_slice(&data, FieldOffset::new(0, 12), 8, Endianness::Little),
            Err(Error::UnsupportedSize(12))
        );
        assert!(matches!(
            read_slice(&data, FieldOffset::new(16, 24), 8, Endianness::Little),
            Err(Error::OutOfBounds { .. })
        ));
    }
}
