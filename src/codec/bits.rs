//! # Bit-Vector and Bit-List Layouts
//!
//! Bits pack little-endian: bit 0 is the least-significant bit of byte 0.
//!
//! A bit-vector of `size` bits occupies exactly `ceil(size/8)` bytes with
//! every bit above `size` zero. A bit-list additionally carries a delimiter
//! bit one position past its highest payload bit; the encoding is trimmed
//! to the minimal byte count that holds the delimiter, so the last byte of
//! a well-formed bit-list is never zero. The empty bit-list is the single
//! byte `0x01`.

use crate::error::{Result, SszError};

/// Encodes a bit-list, appending the delimiter bit past the highest set
/// payload bit and trimming trailing zero bytes.
pub fn encode_bitlist(bits: &[u8], max_bits: usize) -> Result<Vec<u8>> {
    if bits.is_empty() {
        return Ok(vec![0x01]);
    }

    let mut out = bits.to_vec();

    let mut last_non_zero = out.len();
    while last_non_zero > 0 && out[last_non_zero - 1] == 0 {
        last_non_zero -= 1;
    }
    if last_non_zero == 0 {
        return Ok(vec![0x01]);
    }
    out.truncate(last_non_zero);

    // The logical length is the position one past the highest set bit.
    let last = out[out.len() - 1];
    let num_bits = (out.len() - 1) * 8 + (8 - last.leading_zeros() as usize);
    if max_bits > 0 && num_bits > max_bits {
        return Err(SszError::LimitExceeded {
            limit: max_bits,
            got: num_bits,
        });
    }

    // Delimiter goes one position above the highest set bit of the last
    // byte; when that position does not exist, a fresh 0x01 byte holds it.
    let mut delimiter = 0x80u8;
    while delimiter > last {
        delimiter >>= 1;
    }
    match delimiter.checked_shl(1) {
        Some(d) if d != 0 => {
            let at = out.len() - 1;
            out[at] |= d;
        }
        _ => out.push(0x01),
    }

    Ok(out)
}

/// Decodes a bit-list, returning the payload bytes (delimiter cleared,
/// trailing zeros trimmed) and the number of payload bits.
pub fn decode_bitlist(data: &[u8], max_bits: usize) -> Result<(Vec<u8>, usize)> {
    if data.is_empty() {
        return Err(SszError::InvalidBitlist(
            "empty data, missing delimiter bit".into(),
        ));
    }
    if data.len() == 1 && data[0] == 0x01 {
        return Ok((Vec::new(), 0));
    }

    let last = data[data.len() - 1];
    if last == 0 {
        return Err(SszError::InvalidBitlist("trailing byte is zero".into()));
    }

    let delimiter_pos = 7 - last.leading_zeros() as usize;
    let num_bits = (data.len() - 1) * 8 + delimiter_pos;
    if max_bits > 0 && num_bits > max_bits {
        return Err(SszError::LimitExceeded {
            limit: max_bits,
            got: num_bits,
        });
    }

    let mut out = data.to_vec();
    let at = out.len() - 1;
    out[at] &= !(1 << delimiter_pos);
    while out.last() == Some(&0) {
        out.pop();
    }

    Ok((out, num_bits))
}

/// Encodes a bit-vector of `size` bits. The byte length must be exactly
/// `ceil(size/8)`; bits above `size` in the last byte are cleared.
pub fn encode_bitvector(bits: &[u8], size: usize) -> Result<Vec<u8>> {
    let expected = size.div_ceil(8);
    if bits.len() != expected {
        return Err(SszError::SizeMismatch {
            expected,
            got: bits.len(),
        });
    }

    let mut out = bits.to_vec();
    let extra = size % 8;
    if extra > 0 {
        let mask = (1u8 << extra) - 1;
        let at = out.len() - 1;
        out[at] &= mask;
    }
    Ok(out)
}

/// Decodes a bit-vector of `size` bits, rejecting stray bits above `size`.
pub fn decode_bitvector(data: &[u8], size: usize) -> Result<Vec<u8>> {
    let expected = size.div_ceil(8);
    if data.len() != expected {
        return Err(SszError::SizeMismatch {
            expected,
            got: data.len(),
        });
    }

    let extra = size % 8;
    if extra > 0 {
        let mask = (1u8 << extra) - 1;
        if data[data.len() - 1] & !mask != 0 {
            return Err(SszError::InvalidBitlist(format!(
                "bits set beyond bitvector size {size}"
            )));
        }
    }
    Ok(data.to_vec())
}

/// Sets the bit at `index`.
pub fn set_bit(bits: &mut [u8], index: usize) -> Result<()> {
    let byte = index / 8;
    if byte >= bits.len() {
        return Err(SszError::InvalidBitlist(format!(
            "bit index {index} out of range for {} bytes",
            bits.len()
        )));
    }
    bits[byte] |= 1 << (index % 8);
    Ok(())
}

/// Reads the bit at `index`.
pub fn get_bit(bits: &[u8], index: usize) -> Result<bool> {
    let byte = index / 8;
    if byte >= bits.len() {
        return Err(SszError::InvalidBitlist(format!(
            "bit index {index} out of range for {} bytes",
            bits.len()
        )));
    }
    Ok(bits[byte] & (1 << (index % 8)) != 0)
}

/// Allocates a zeroed bit-list holding `num_bits` bits.
pub fn new_bitlist(num_bits: usize) -> Vec<u8> {
    vec![0u8; num_bits.div_ceil(8)]
}

/// Allocates a zeroed bit-vector holding `num_bits` bits.
pub fn new_bitvector(num_bits: usize) -> Vec<u8> {
    vec![0u8; num_bits.div_ceil(8)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bitlist_encodes_as_delimiter_only() {
        assert_eq!(encode_bitlist(&[], 8).unwrap(), vec![0x01]);
        assert_eq!(encode_bitlist(&[0x00, 0x00], 16).unwrap(), vec![0x01]);
    }

    #[test]
    fn single_bit_bitlist() {
        // bit 0 = payload, bit 1 = delimiter
        assert_eq!(encode_bitlist(&[0x01], 8).unwrap(), vec![0x03]);
        let (bits, n) = decode_bitlist(&[0x03], 8).unwrap();
        assert_eq!(bits, vec![0x01]);
        assert_eq!(n, 1);
    }

    #[test]
    fn trailing_zero_bytes_are_trimmed_before_delimiting() {
        // Four payload bits, delimiter lands at bit 4.
        assert_eq!(encode_bitlist(&[0x0F, 0x00, 0x00], 24).unwrap(), vec![0x1F]);
    }

    #[test]
    fn limit_applies_to_logical_length_not_byte_count() {
        // Three bytes in, but only four payload bits.
        assert_eq!(encode_bitlist(&[0x0F, 0x00, 0x00], 5).unwrap(), vec![0x1F]);
        assert_eq!(encode_bitlist(&[0x0F, 0x00, 0x00], 4).unwrap(), vec![0x1F]);
        let err = encode_bitlist(&[0x0F, 0x00, 0x00], 3).unwrap_err();
        assert!(matches!(err, SszError::LimitExceeded { limit: 3, got: 4 }));
    }

    #[test]
    fn full_byte_needs_extra_delimiter_byte() {
        assert_eq!(encode_bitlist(&[0xFF], 8).unwrap(), vec![0xFF, 0x01]);
        let (bits, n) = decode_bitlist(&[0xFF, 0x01], 8).unwrap();
        assert_eq!(bits, vec![0xFF]);
        assert_eq!(n, 8);
    }

    #[test]
    fn bitlist_roundtrip_various_patterns() {
        for (pattern, max) in [
            (vec![0x55u8], 8),
            (vec![0xAA, 0x01], 16),
            (vec![0x01, 0x00, 0x80], 24),
            (vec![0xFF, 0xFF, 0xFF], 24),
        ] {
            let encoded = encode_bitlist(&pattern, max).unwrap();
            assert_ne!(*encoded.last().unwrap(), 0, "delimiter byte present");
            let (decoded, _) = decode_bitlist(&encoded, max).unwrap();
            let mut trimmed = pattern.clone();
            while trimmed.last() == Some(&0) {
                trimmed.pop();
            }
            assert_eq!(decoded, trimmed, "pattern {pattern:02x?}");
        }
    }

    #[test]
    fn bitlist_over_limit_fails_both_ways() {
        let err = encode_bitlist(&[0xFF, 0xFF], 8).unwrap_err();
        assert!(matches!(err, SszError::LimitExceeded { limit: 8, got: 16 }));

        // 9 payload bits against a max of 8.
        let err = decode_bitlist(&[0xFF, 0x03], 8).unwrap_err();
        assert!(matches!(err, SszError::LimitExceeded { limit: 8, got: 9 }));
    }

    #[test]
    fn bitlist_decode_rejects_zero_trailing_byte() {
        let err = decode_bitlist(&[0x01, 0x00], 16).unwrap_err();
        assert!(matches!(err, SszError::InvalidBitlist(_)));
    }

    #[test]
    fn bitlist_decode_rejects_empty_input() {
        assert!(decode_bitlist(&[], 8).is_err());
    }

    #[test]
    fn bitvector_clears_bits_above_size() {
        assert_eq!(encode_bitvector(&[0xFF], 5).unwrap(), vec![0x1F]);
        assert_eq!(encode_bitvector(&[0xFF, 0xFF], 16).unwrap(), vec![0xFF, 0xFF]);
    }

    #[test]
    fn bitvector_encode_rejects_wrong_byte_count() {
        let err = encode_bitvector(&[0xFF, 0xFF], 8).unwrap_err();
        assert!(matches!(err, SszError::SizeMismatch { expected: 1, got: 2 }));
    }

    #[test]
    fn bitvector_decode_rejects_stray_bits() {
        let err = decode_bitvector(&[0xFF], 5).unwrap_err();
        assert!(matches!(err, SszError::InvalidBitlist(_)));
        assert_eq!(decode_bitvector(&[0x1F], 5).unwrap(), vec![0x1F]);
    }

    #[test]
    fn set_and_get_bits() {
        let mut bits = new_bitlist(12);
        assert_eq!(bits.len(), 2);
        set_bit(&mut bits, 0).unwrap();
        set_bit(&mut bits, 9).unwrap();
        assert_eq!(bits, vec![0x01, 0x02]);
        assert!(get_bit(&bits, 0).unwrap());
        assert!(!get_bit(&bits, 1).unwrap());
        assert!(get_bit(&bits, 9).unwrap());
        assert!(set_bit(&mut bits, 16).is_err());
        assert!(get_bit(&bits, 16).is_err());
    }

    #[test]
    fn new_bitvector_rounds_up() {
        assert_eq!(new_bitvector(1).len(), 1);
        assert_eq!(new_bitvector(8).len(), 1);
        assert_eq!(new_bitvector(9).len(), 2);
    }
}
