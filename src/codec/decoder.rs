//! # Cursor Decoder
//!
//! A [`Decoder`] is a borrowed byte slice plus a monotonically advancing
//! cursor. Scalar readers never advance past the end of the buffer;
//! underflow fails with [`SszError::UnexpectedEnd`]. Sub-decoders borrow a
//! narrower window of the same buffer with the cursor reset to zero, so
//! decoding is zero-copy throughout; the borrow checker keeps sub-decoders
//! from outliving the input buffer.
//!
//! ## Container Decode
//!
//! [`Decoder::decode_container`] runs the two-pass protocol: the first pass
//! reads fixed fields in place and collects a 4-byte offset per variable
//! field; the offsets are then validated (`offset[0]` equals the fixed-part
//! size, offsets are monotone, the last lies within the buffer) and each
//! variable field decodes from its `[offset[i], offset[i+1])` window.

use alloy_primitives::{hex, U256};
use smallvec::SmallVec;

use crate::error::{Result, SszError};

/// Cursor-based reader over a borrowed byte slice.
pub struct Decoder<'a> {
    buf: &'a [u8],
    cur: usize,
}

/// One container element: a fixed field decoded in place, or a variable
/// field decoded from its offset window.
pub enum Part<'c, 'a, T> {
    Fixed(Box<dyn FnOnce(&mut Decoder<'a>) -> Result<T> + 'c>),
    Variable(Box<dyn FnOnce(&mut Decoder<'a>) -> Result<T> + 'c>),
}

impl<'c, 'a, T> Part<'c, 'a, T> {
    pub fn fixed(f: impl FnOnce(&mut Decoder<'a>) -> Result<T> + 'c) -> Self {
        Part::Fixed(Box::new(f))
    }

    pub fn variable(f: impl FnOnce(&mut Decoder<'a>) -> Result<T> + 'c) -> Self {
        Part::Variable(Box::new(f))
    }
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cur: 0 }
    }

    /// The bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.cur..]
    }

    pub fn is_empty(&self) -> bool {
        self.cur == self.buf.len()
    }

    /// Total length of the underlying window.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() - self.cur < n {
            return Err(SszError::UnexpectedEnd);
        }
        let out = &self.buf[self.cur..self.cur + n];
        self.cur += n;
        Ok(out)
    }

    /// Reads `n` bytes, advancing the cursor.
    pub fn read_n(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Consumes and returns everything left in the window.
    pub fn read_all(&mut self) -> &'a [u8] {
        let out = &self.buf[self.cur..];
        self.cur = self.buf.len();
        out
    }

    pub fn peek_uint32(&self) -> Result<u32> {
        if self.buf.len() - self.cur < 4 {
            return Err(SszError::UnexpectedEnd);
        }
        let bytes: [u8; 4] = self.buf[self.cur..self.cur + 4]
            .try_into()
            .expect("window is four bytes");
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_uint8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_uint16(&mut self) -> Result<u16> {
        let bytes: [u8; 2] = self.take(2)?.try_into().expect("window is two bytes");
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_uint32(&mut self) -> Result<u32> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("window is four bytes");
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_uint64(&mut self) -> Result<u64> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("window is eight bytes");
        Ok(u64::from_le_bytes(bytes))
    }

    /// Any non-zero byte reads as true.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    /// 16 little-endian bytes into the low half of the 4×u64 carrier.
    pub fn read_uint128(&mut self) -> Result<U256> {
        Ok(U256::from_le_slice(self.take(16)?))
    }

    pub fn read_uint256(&mut self) -> Result<U256> {
        Ok(U256::from_le_slice(self.take(32)?))
    }

    /// Reads a 4-byte little-endian offset.
    pub fn read_offset(&mut self) -> Result<usize> {
        Ok(self.read_uint32()? as usize)
    }

    /// Reads an offset and returns a sub-decoder over the buffer from that
    /// offset to the end, along with the offset itself.
    pub fn jump(&mut self) -> Result<(Decoder<'a>, usize)> {
        let offset = self.read_offset()?;
        if offset > self.buf.len() {
            return Err(SszError::InvalidOffset {
                offset,
                bound: self.buf.len(),
            });
        }
        Ok((Decoder::new(&self.buf[offset..]), offset))
    }

    /// [`jump`](Self::jump) variant that interprets the offset as the head
    /// of an offset table, returning the implied element count.
    pub fn jump_len(&mut self) -> Result<(Decoder<'a>, usize)> {
        let (sub, offset) = self.jump()?;
        Ok((sub, offset / 4))
    }

    /// Two-pass container decode. Results come back in declaration order.
    pub fn decode_container<T>(&mut self, parts: Vec<Part<'_, 'a, T>>) -> Result<Vec<T>> {
        let count = parts.len();
        let mut results: Vec<Option<T>> = Vec::with_capacity(count);
        results.resize_with(count, || None);

        let mut pending: SmallVec<[(usize, usize, _); 4]> = SmallVec::new();

        for (i, part) in parts.into_iter().enumerate() {
            match part {
                Part::Fixed(f) => results[i] = Some(f(self)?),
                Part::Variable(f) => {
                    let offset = self.read_offset()?;
                    pending.push((i, offset, f));
                }
            }
        }

        let fixed_size = self.cur;
        if let Some(&(_, first, _)) = pending.first() {
            if first != fixed_size {
                return Err(SszError::InvalidOffset {
                    offset: first,
                    bound: fixed_size,
                });
            }
        }

        let had_variable = !pending.is_empty();
        let ends: SmallVec<[usize; 4]> = pending
            .iter()
            .skip(1)
            .map(|&(_, offset, _)| offset)
            .chain(std::iter::once(self.buf.len()))
            .collect();

        for (k, (i, start, f)) in pending.into_iter().enumerate() {
            let end = ends[k];
            if start > end || end > self.buf.len() {
                return Err(SszError::InvalidOffset {
                    offset: start.max(end),
                    bound: self.buf.len(),
                });
            }
            let mut sub = Decoder::new(&self.buf[start..end]);
            results[i] = Some(f(&mut sub)?);
            if !sub.is_empty() {
                return Err(SszError::SizeMismatch {
                    expected: sub.cur,
                    got: sub.len(),
                });
            }
        }

        // The offset windows cover everything past the fixed part; a
        // purely fixed container leaves the cursor at its own end so that
        // siblings in an enclosing sequence keep reading behind it.
        if had_variable {
            self.cur = self.buf.len();
        }

        Ok(results
            .into_iter()
            .map(|r| r.expect("every element decoded in one of the two passes"))
            .collect())
    }

    /// Decodes a list of fixed-size elements from the remaining bytes.
    /// The element count is `remaining / elem_size`; a remainder is a
    /// framing error, and `max = 0` means unbounded.
    pub fn decode_fixed_list<T>(
        &mut self,
        elem_size: usize,
        max: usize,
        mut f: impl FnMut(&mut Decoder<'a>) -> Result<T>,
    ) -> Result<Vec<T>> {
        if elem_size == 0 {
            return Err(SszError::InvalidSchema(
                "fixed list element has zero size".into(),
            ));
        }
        let remaining = self.buf.len() - self.cur;
        if remaining % elem_size != 0 {
            return Err(SszError::SizeMismatch {
                expected: remaining - remaining % elem_size,
                got: remaining,
            });
        }
        let count = remaining / elem_size;
        if max > 0 && count > max {
            return Err(SszError::LimitExceeded {
                limit: max,
                got: count,
            });
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(f(self)?);
        }
        Ok(out)
    }

    /// Decodes a list of variable-size elements: the element count derives
    /// from the first offset (`count = offset[0] / 4`), and each element
    /// decodes from its offset window.
    pub fn decode_variable_list<T>(
        &mut self,
        max: usize,
        mut f: impl FnMut(&mut Decoder<'a>) -> Result<T>,
    ) -> Result<Vec<T>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let first = self.read_offset()?;
        if first == 0 || first % 4 != 0 {
            return Err(SszError::InvalidOffset {
                offset: first,
                bound: self.buf.len(),
            });
        }
        let count = first / 4;
        if max > 0 && count > max {
            return Err(SszError::LimitExceeded {
                limit: max,
                got: count,
            });
        }

        let mut offsets: SmallVec<[usize; 8]> = SmallVec::with_capacity(count);
        offsets.push(first);
        for _ in 1..count {
            offsets.push(self.read_offset()?);
        }

        let mut out = Vec::with_capacity(count);
        for (i, &start) in offsets.iter().enumerate() {
            let end = offsets.get(i + 1).copied().unwrap_or(self.buf.len());
            if start > end || end > self.buf.len() {
                return Err(SszError::InvalidOffset {
                    offset: start.max(end),
                    bound: self.buf.len(),
                });
            }
            let mut sub = Decoder::new(&self.buf[start..end]);
            out.push(f(&mut sub)?);
            if !sub.is_empty() {
                return Err(SszError::SizeMismatch {
                    expected: sub.cur,
                    got: sub.len(),
                });
            }
        }

        self.cur = self.buf.len();
        Ok(out)
    }
}

impl std::fmt::Debug for Decoder<'_> {
    /// Hex dump of the unconsumed window, wrapped for readability.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Decoder {{ cur: {}, len: {} }}", self.cur, self.buf.len())?;
        let encoded = hex::encode(self.remaining());
        for line in encoded.as_bytes().chunks(32) {
            writeln!(f, "  {}", std::str::from_utf8(line).expect("hex is ascii"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_reads_are_little_endian() {
        let data = [
            0xAB, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23,
            0x01,
        ];
        let mut d = Decoder::new(&data);
        assert_eq!(d.read_uint8().unwrap(), 0xAB);
        assert_eq!(d.read_uint16().unwrap(), 0x1234);
        assert_eq!(d.read_uint32().unwrap(), 0x12345678);
        assert_eq!(d.read_uint64().unwrap(), 0x0123456789ABCDEF);
        assert!(d.is_empty());
    }

    #[test]
    fn reads_past_end_fail() {
        let mut d = Decoder::new(&[0x01]);
        assert!(matches!(d.read_uint32(), Err(SszError::UnexpectedEnd)));
        // The failed read did not consume anything.
        assert_eq!(d.read_uint8().unwrap(), 1);
        assert!(matches!(d.read_uint8(), Err(SszError::UnexpectedEnd)));
    }

    #[test]
    fn bool_reads_tolerate_nonzero() {
        let mut d = Decoder::new(&[0x00, 0x01, 0x02]);
        assert!(!d.read_bool().unwrap());
        assert!(d.read_bool().unwrap());
        assert!(d.read_bool().unwrap());
    }

    #[test]
    fn uint256_roundtrips_through_le_bytes() {
        let value = U256::from(0xDEADBEEFu64);
        let bytes = value.to_le_bytes::<32>();
        let mut d = Decoder::new(&bytes);
        assert_eq!(d.read_uint256().unwrap(), value);
    }

    #[test]
    fn uint128_reads_sixteen_bytes() {
        let mut data = [0u8; 20];
        data[0] = 0x2A;
        let mut d = Decoder::new(&data);
        assert_eq!(d.read_uint128().unwrap(), U256::from(0x2Au64));
        assert_eq!(d.remaining().len(), 4);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut d = Decoder::new(&[0x10, 0x00, 0x00, 0x00]);
        assert_eq!(d.peek_uint32().unwrap(), 16);
        assert_eq!(d.read_uint32().unwrap(), 16);
    }

    #[test]
    fn container_fixed_then_variable() {
        // u64 = 5, offset 12, payload [1, 2, 3]
        let mut data = Vec::new();
        data.extend_from_slice(&5u64.to_le_bytes());
        data.extend_from_slice(&12u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3]);

        let mut d = Decoder::new(&data);
        let parts = vec![
            Part::fixed(|d: &mut Decoder| d.read_uint64().map(Ok1::A)),
            Part::variable(|d: &mut Decoder| Ok(Ok1::B(d.read_all().to_vec()))),
        ];
        let out = d.decode_container(parts).unwrap();
        assert!(matches!(out[0], Ok1::A(5)));
        assert!(matches!(&out[1], Ok1::B(b) if b == &vec![1, 2, 3]));
        assert!(d.is_empty());
    }

    #[derive(Debug)]
    enum Ok1 {
        A(u64),
        B(Vec<u8>),
    }

    #[test]
    fn container_rejects_first_offset_mismatch() {
        // Fixed part is 12 bytes but the offset claims 13.
        let mut data = Vec::new();
        data.extend_from_slice(&5u64.to_le_bytes());
        data.extend_from_slice(&13u32.to_le_bytes());
        data.push(0xFF);

        let mut d = Decoder::new(&data);
        let parts = vec![
            Part::fixed(|d: &mut Decoder| d.read_uint64().map(Ok1::A)),
            Part::variable(|d: &mut Decoder| Ok(Ok1::B(d.read_all().to_vec()))),
        ];
        let err = d.decode_container(parts).unwrap_err();
        assert!(matches!(
            err,
            SszError::InvalidOffset { offset: 13, bound: 12 }
        ));
    }

    #[test]
    fn container_rejects_decreasing_offsets() {
        let mut data = Vec::new();
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&6u32.to_le_bytes());
        data.extend_from_slice(&[0xAA, 0xBB]);

        let mut d = Decoder::new(&data);
        let parts = vec![
            Part::variable(|d: &mut Decoder| Ok(d.read_all().to_vec())),
            Part::variable(|d: &mut Decoder| Ok(d.read_all().to_vec())),
        ];
        let err = d.decode_container(parts).unwrap_err();
        assert!(matches!(err, SszError::InvalidOffset { .. }));
    }

    #[test]
    fn container_rejects_offset_past_buffer() {
        let mut data = Vec::new();
        data.extend_from_slice(&4u32.to_le_bytes());
        let mut d = Decoder::new(&data);
        let parts = vec![Part::variable(|d: &mut Decoder| Ok(d.read_all().to_vec()))];
        // offset[0] == fixed size (4) but there is nothing to read: the
        // window is empty, which is fine.
        let out = d.decode_container(parts).unwrap();
        assert!(out[0].is_empty());

        let mut data = Vec::new();
        data.extend_from_slice(&9u32.to_le_bytes());
        let mut d = Decoder::new(&data);
        let parts = vec![Part::variable(|d: &mut Decoder| Ok(d.read_all().to_vec()))];
        assert!(d.decode_container(parts).is_err());
    }

    #[test]
    fn fixed_list_counts_from_remaining_bytes() {
        let mut data = Vec::new();
        for i in 0..4u64 {
            data.extend_from_slice(&i.to_le_bytes());
        }
        let mut d = Decoder::new(&data);
        let out = d
            .decode_fixed_list(8, 16, |d| d.read_uint64())
            .unwrap();
        assert_eq!(out, vec![0, 1, 2, 3]);
    }

    #[test]
    fn fixed_list_rejects_remainder_bytes() {
        let data = [0u8; 9];
        let mut d = Decoder::new(&data);
        let err = d.decode_fixed_list(8, 16, |d| d.read_uint64()).unwrap_err();
        assert!(matches!(
            err,
            SszError::SizeMismatch { expected: 8, got: 9 }
        ));
    }

    #[test]
    fn fixed_list_enforces_limit() {
        let data = [0u8; 32];
        let mut d = Decoder::new(&data);
        let err = d.decode_fixed_list(8, 3, |d| d.read_uint64()).unwrap_err();
        assert!(matches!(err, SszError::LimitExceeded { limit: 3, got: 4 }));
    }

    #[test]
    fn variable_list_derives_count_from_first_offset() {
        // Two elements: offsets 8, 11; payloads [1,2,3] and [4].
        let mut data = Vec::new();
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&11u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]);

        let mut d = Decoder::new(&data);
        let out = d
            .decode_variable_list(4, |sub| Ok(sub.read_all().to_vec()))
            .unwrap();
        assert_eq!(out, vec![vec![1, 2, 3], vec![4]]);
        assert!(d.is_empty());
    }

    #[test]
    fn variable_list_empty_window_is_empty_list() {
        let mut d = Decoder::new(&[]);
        let out = d
            .decode_variable_list(4, |sub| Ok(sub.read_all().to_vec()))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn variable_list_enforces_limit() {
        let mut data = Vec::new();
        data.extend_from_slice(&12u32.to_le_bytes());
        data.extend_from_slice(&12u32.to_le_bytes());
        data.extend_from_slice(&12u32.to_le_bytes());
        let mut d = Decoder::new(&data);
        let err = d
            .decode_variable_list(2, |sub| Ok(sub.read_all().to_vec()))
            .unwrap_err();
        assert!(matches!(err, SszError::LimitExceeded { limit: 2, got: 3 }));
    }

    #[test]
    fn variable_list_rejects_misaligned_first_offset() {
        let mut data = Vec::new();
        data.extend_from_slice(&6u32.to_le_bytes());
        data.extend_from_slice(&[0, 0]);
        let mut d = Decoder::new(&data);
        let err = d
            .decode_variable_list(4, |sub| Ok(sub.read_all().to_vec()))
            .unwrap_err();
        assert!(matches!(err, SszError::InvalidOffset { offset: 6, .. }));
    }

    #[test]
    fn jump_scopes_from_offset_to_end() {
        let mut data = Vec::new();
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&[0xAA; 4]);
        data.extend_from_slice(&[0xBB; 2]);
        let mut d = Decoder::new(&data);
        let (mut sub, offset) = d.jump().unwrap();
        assert_eq!(offset, 8);
        assert_eq!(sub.read_all(), &[0xBB, 0xBB]);
    }

    #[test]
    fn jump_rejects_out_of_range_offsets() {
        let data = 64u32.to_le_bytes();
        let mut d = Decoder::new(&data);
        assert!(matches!(
            d.jump(),
            Err(SszError::InvalidOffset { offset: 64, bound: 4 })
        ));
    }

    #[test]
    fn jump_len_divides_the_offset_table_head() {
        let mut data = Vec::new();
        data.extend_from_slice(&12u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        let mut d = Decoder::new(&data);
        let (_, count) = d.jump_len().unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn debug_renders_hex_dump() {
        let d = Decoder::new(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let dump = format!("{d:?}");
        assert!(dump.contains("deadbeef"));
    }
}
