//! # Stack+Heap Encoder
//!
//! SSZ serialization is modelled with a stack and a heap. The stack holds
//! *words* in emission order: either inline fixed bytes, or a 4-byte
//! placeholder pointing at a position in the heap. Variable payloads append
//! to the heap as they are produced. When a scope finishes, each
//! placeholder is back-patched to `stack_size + heap_position`, converting
//! the heap-relative position into an absolute offset past the fixed part,
//! and the heap is streamed out after the stack.
//!
//! Nested variable contexts (a variable container inside a list, a list
//! inside a container) push an independent frame; on exit the frame is
//! resolved the same way and lands as a single contiguous payload on the
//! parent's heap.
//!
//! ```text
//! write_uint64(5)      stack: [Inline(05 00 ..)]                cur += 8
//! write_bytes(b)       stack: [.., Placeholder(hz)]  heap: + b  cur += 4
//! finish()             out = stack words (placeholders patched) ++ heap
//! ```

use smallvec::SmallVec;

use crate::error::{Result, SszError};
use crate::BYTES_PER_LENGTH_OFFSET;

/// One stack entry: inline fixed bytes or a back-patched offset slot.
#[derive(Debug)]
enum Word {
    Inline(Vec<u8>),
    /// Heap position the offset slot resolves to at finish time.
    Placeholder(usize),
}

#[derive(Debug, Default)]
struct Frame {
    words: SmallVec<[Word; 8]>,
    heap: Vec<u8>,
    /// Bytes emitted into the fixed part of this scope so far.
    cur: usize,
}

impl Frame {
    fn push_inline(&mut self, bytes: &[u8]) {
        self.cur += bytes.len();
        // Coalesce runs of fixed bytes into one word.
        if let Some(Word::Inline(last)) = self.words.last_mut() {
            last.extend_from_slice(bytes);
            return;
        }
        self.words.push(Word::Inline(bytes.to_vec()));
    }

    fn push_payload(&mut self, bytes: &[u8]) {
        self.words.push(Word::Placeholder(self.heap.len()));
        self.cur += BYTES_PER_LENGTH_OFFSET;
        self.heap.extend_from_slice(bytes);
    }

    fn resolve(self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.cur + self.heap.len());
        for word in self.words {
            match word {
                Word::Inline(bytes) => out.extend_from_slice(&bytes),
                Word::Placeholder(pos) => {
                    let offset = self.cur + pos;
                    let offset32 = u32::try_from(offset).map_err(|_| SszError::InvalidOffset {
                        offset,
                        bound: u32::MAX as usize,
                    })?;
                    out.extend_from_slice(&offset32.to_le_bytes());
                }
            }
        }
        out.extend_from_slice(&self.heap);
        Ok(out)
    }
}

/// SSZ output builder. Transient per marshal call.
#[derive(Debug)]
pub struct Builder {
    frames: Vec<Frame>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    fn frame(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("builder always has a root frame")
    }

    /// Bytes emitted into the fixed part of the current scope.
    pub fn stack_size(&self) -> usize {
        self.frames.last().map(|f| f.cur).unwrap_or(0)
    }

    /// Emits fixed bytes inline on the stack.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.frame().push_inline(bytes);
    }

    /// Emits a variable payload: a placeholder on the stack, the bytes on
    /// the heap.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.frame().push_payload(bytes);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_fixed(&[value as u8]);
    }

    pub fn write_uint8(&mut self, value: u8) {
        self.write_fixed(&[value]);
    }

    pub fn write_uint16(&mut self, value: u16) {
        self.write_fixed(&value.to_le_bytes());
    }

    pub fn write_uint32(&mut self, value: u32) {
        self.write_fixed(&value.to_le_bytes());
    }

    pub fn write_uint64(&mut self, value: u64) {
        self.write_fixed(&value.to_le_bytes());
    }

    /// Low 16 bytes of the 4×u64 little-endian carrier.
    pub fn write_uint128(&mut self, value: &alloy_primitives::U256) {
        let bytes = value.to_le_bytes::<32>();
        self.write_fixed(&bytes[..16]);
    }

    pub fn write_uint256(&mut self, value: &alloy_primitives::U256) {
        self.write_fixed(&value.to_le_bytes::<32>());
    }

    /// Opens a nested variable scope. Emissions land in the new scope until
    /// the matching [`exit_variable`](Self::exit_variable).
    pub fn enter_variable(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Closes the current variable scope, resolving it into a single
    /// payload on the parent's heap.
    ///
    /// # Panics
    ///
    /// Panics when called without a matching `enter_variable`; that is a
    /// programming error in the walker, not a data error.
    pub fn exit_variable(&mut self) -> Result<()> {
        if self.frames.len() < 2 {
            panic!("exit_variable without matching enter_variable");
        }
        let frame = self.frames.pop().expect("frame count checked above");
        let resolved = frame.resolve()?;
        self.frame().push_payload(&resolved);
        Ok(())
    }

    /// Flushes the root scope: back-patches placeholders and appends the
    /// heap. Consumes the builder.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        debug_assert_eq!(
            self.frames.len(),
            1,
            "finish with unclosed variable context"
        );
        let frame = self.frames.pop().expect("builder always has a root frame");
        frame.resolve()
    }
}
