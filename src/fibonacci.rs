//! Fibonacci encoding of integers, going bit-by-bit.
//! See [here](https://en.wikipedia.org/wiki/Fibonacci_coding).
//!
//! Every positive integer is a unique sum of non-consecutive Fibonacci numbers
//! (Zeckendorf). A value `v` is stored as the Zeckendorf bits of `v + 1`,
//! lowest Fibonacci number first, followed by an extra `1`. Since the
//! representation itself never holds two adjacent `1`s, the first `11` in the
//! stream always ends a codeword.
//!
//! Two flavours:
//! - [`FibonacciWriter`] / [`FibonacciReader`]: one value at a time on a bit stream,
//!   like every other code of the crate.
//! - [`FibonacciCodec`]: a whole set of symbols packed back to back into one
//!   buffer, optionally preceded by a header holding the number of symbols.
//!
//! # Usage
//! ```rust
//! use univcodes::fibonacci::FibonacciCodec;
//! use univcodes::utils::bytes_to_string;
//!
//! let codec = FibonacciCodec::new(true);
//! let encoded = codec.compress(&[0, 1, 2]).unwrap();
//! assert_eq!(bytes_to_string(&encoded), "00111101 10011000");
//! assert_eq!(codec.decompress(&encoded).unwrap(), vec![0, 1, 2]);
//! ```
use num::CheckedSub;
use std::fmt::Debug;
use std::io::{Read, Write};
use tracing::debug;

use crate::bitstream::{BitReader, BitWriter};
use crate::utils::{as_bits, MAX_FIB_SUM, FIB64};
use crate::{CodecError, FbDec, MyBitSlice, MyBitVector, Result, UnsignedReader, UnsignedWriter};

/// Largest value with a Fibonacci codeword (its code is that of `2^64`).
pub const MAX_VALUE: u64 = u64::MAX;

/// Appends the Fibonacci code of `n` (Zeckendorf bits, lowest first, plus the
/// terminating `1`) to `result`, walking the table greedily from the top.
///
/// Adapted from <https://github.com/antifuchs/fibonacci_codec>
#[inline]
fn bits_from_table_internal<T>(n: T, table: &[T], result: &mut MyBitVector) -> Result<()>
where
    T: CheckedSub + PartialOrd + Debug + Copy,
{
    let mut current = n;
    let split_pos = table.iter().rposition(|elt| *elt <= n).ok_or_else(|| {
        CodecError::InvalidArgument(format!("{n:?} has no Fibonacci representation"))
    })?;

    let start = result.len();
    let mut i = start + split_pos + 1;
    result.resize(start + split_pos + 2, false);
    result.set(i, true);
    for elt in table.split_at(split_pos + 1).0.iter().rev() {
        i -= 1;
        if elt <= &current {
            current = match current.checked_sub(elt) {
                Some(next) => next,
                None => {
                    result.truncate(start);
                    return Err(CodecError::InvalidArgument(format!(
                        "underflow while encoding {n:?}"
                    )));
                }
            };
            result.set(i, true);
        };
    }
    Ok(())
}

/// Appends the codeword of `value` to `result`.
pub fn encode_into(value: u64, result: &mut MyBitVector) -> Result<()> {
    bits_from_table_internal(value as u128 + 1, FIB64.as_slice(), result)
}

/// Encodes several values back to back (no header, no padding).
pub fn encode(data: &[u64]) -> Result<MyBitVector> {
    // the capacity is a minimum, assuming each element of data is 0, i.e. `11`
    let mut overall = MyBitVector::with_capacity(2 * data.len());
    for &x in data {
        encode_into(x, &mut overall)?;
    }
    Ok(overall)
}

/// Length in bits of the codeword of `value`.
pub fn encoded_bits(value: u64) -> u64 {
    let n = value as u128 + 1;
    // FIB64[0] == 1 <= n, so a position always exists
    let split_pos = FIB64.iter().rposition(|f| *f <= n).unwrap_or(0);
    split_pos as u64 + 2
}

/// Decoding state of a codeword seen bit by bit.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub(crate) struct Partial {
    num: u128,
    i_fibo: usize,
    last_bit: bool,
}

pub(crate) enum DecResult {
    Incomplete,
    /// the decoded value (shift already undone)
    Complete(u64),
}

impl Partial {
    /// Feeds the next bit of the codeword.
    pub(crate) fn update(&mut self, bit: bool) -> Result<DecResult> {
        if self.last_bit && bit {
            // num >= 1: a 1 was seen before the terminator
            return Ok(DecResult::Complete((self.num - 1) as u64));
        }
        let fib = FIB64.get(self.i_fibo).ok_or_else(|| {
            CodecError::DecodeInconsistency(format!(
                "no terminator within {} bits",
                FIB64.len() + 1
            ))
        })?;
        if bit {
            self.num += fib;
            if self.num > MAX_FIB_SUM {
                return Err(CodecError::DecodeInconsistency(
                    "Fibonacci value does not fit in 64 bits".to_string(),
                ));
            }
        }
        self.i_fibo += 1;
        self.last_bit = bit;
        Ok(DecResult::Incomplete)
    }
}

/// Decoder for Fibonacci encoded integer sequences (allows to iterate)
///
/// Constructed from a buffer which is gradually processed
/// when iterating. The buffer remains unchanged, just the pointers into the buffer move.
///
/// Iteration stops (`None`) once only zero bits are left. Trailing bits holding a
/// `1` but no terminator yield [`CodecError::EndOfInput`], after which the
/// decoder is done.
///
/// # Example
/// ```rust
/// use univcodes::fibonacci::FibonacciDecoder;
/// use univcodes::utils::create_bitvector;
/// // 3 and 0 (codes of 4 and 1)
/// let buffer = create_bitvector(vec![1, 0, 1, 1, 1, 1, 0]);
/// let d = FibonacciDecoder::new(&buffer);
/// let results: Vec<u64> = d.collect::<Result<_, _>>().unwrap();
/// assert_eq!(results, vec![3, 0]);
/// ```
#[derive(Debug)]
pub struct FibonacciDecoder<'a> {
    buffer: &'a MyBitSlice,
    current_pos: usize, // the unprocessed part is buffer[current_pos..]
    done: bool,
}

impl<'a> FibonacciDecoder<'a> {
    /// Creates a new fibonacci decoder for the given buffer.
    pub fn new(buffer: &'a MyBitSlice) -> Self {
        FibonacciDecoder {
            buffer,
            current_pos: 0,
            done: false,
        }
    }
}

impl<'a> FbDec<'a> for FibonacciDecoder<'a> {
    fn get_remaining_buffer(&self) -> &'a MyBitSlice {
        &self.buffer[self.current_pos..]
    }

    fn get_bits_processed(&self) -> usize {
        self.current_pos
    }
}

impl<'a> Iterator for FibonacciDecoder<'a> {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current_slice = &self.buffer[self.current_pos..];
        let mut partial = Partial::default();
        for (idx, current_bit) in current_slice.iter().by_vals().enumerate() {
            match partial.update(current_bit) {
                Ok(DecResult::Incomplete) => {}
                Ok(DecResult::Complete(value)) => {
                    self.current_pos += idx + 1;
                    return Some(Ok(value));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        self.done = true;
        if current_slice.any() {
            Some(Err(CodecError::EndOfInput))
        } else {
            None
        }
    }
}

/// Fibonacci-decodes the bitstream into integers, up to the last complete
/// codeword; trailing zero bits are ignored.
pub fn decode(encoded: &MyBitSlice) -> Result<Vec<u64>> {
    FibonacciDecoder::new(encoded).collect()
}

/// Compresses and decompresses whole symbol sets into single byte buffers.
///
/// Symbols are packed back to back; only the very end is zero padded to a
/// byte. Without a header, decompression returns every complete codeword, so
/// the caller cannot tell how many symbols were meant if trailing data is
/// garbage. With a header, the set starts with the codeword of `count - 1`
/// (i.e. the Fibonacci code of `count`) and decompression returns exactly
/// `count` symbols, discarding whatever follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FibonacciCodec {
    include_header: bool,
}

impl FibonacciCodec {
    /// Set codec, with or without the leading count header.
    pub fn new(include_header: bool) -> Self {
        FibonacciCodec { include_header }
    }

    /// Whether sets carry a symbol count.
    pub fn include_header(&self) -> bool {
        self.include_header
    }

    /// Packs `symbols` into a byte buffer.
    ///
    /// An empty set is rejected: without a header it would be
    /// indistinguishable from padding, and a header cannot hold a count of 0.
    pub fn compress(&self, symbols: &[u64]) -> Result<Vec<u8>> {
        if symbols.is_empty() {
            return Err(CodecError::InvalidArgument(
                "cannot compress an empty symbol set".to_string(),
            ));
        }
        let mut bits = MyBitVector::with_capacity(2 * (symbols.len() + 1));
        if self.include_header {
            bits_from_table_internal(symbols.len() as u128, FIB64.as_slice(), &mut bits)?;
        }
        for &s in symbols {
            encode_into(s, &mut bits)?;
        }
        let padding = (8 - bits.len() % 8) % 8;
        bits.resize(bits.len() + padding, false);
        let bytes = bits.into_vec();
        debug!(
            symbols = symbols.len(),
            bytes = bytes.len(),
            header = self.include_header,
            "compressed fibonacci set"
        );
        Ok(bytes)
    }

    /// Unpacks a buffer produced by [`FibonacciCodec::compress`] with the same header setting.
    pub fn decompress(&self, bytes: &[u8]) -> Result<Vec<u64>> {
        let bits = as_bits(bytes);
        let mut decoder = FibonacciDecoder::new(bits);
        let symbols = if self.include_header {
            let count = decoder.next().ok_or(CodecError::EndOfInput)?? as u128 + 1;
            // every codeword takes at least two bits
            let room = decoder.get_remaining_buffer().len() as u128 / 2;
            if count > room {
                return Err(CodecError::EndOfInput);
            }
            let mut symbols = Vec::with_capacity(count as usize);
            for _ in 0..count {
                symbols.push(decoder.next().ok_or(CodecError::EndOfInput)??);
            }
            symbols
        } else {
            decoder.collect::<Result<Vec<_>>>()?
        };
        debug!(
            symbols = symbols.len(),
            bytes = bytes.len(),
            header = self.include_header,
            "decompressed fibonacci set"
        );
        Ok(symbols)
    }
}

/// Writes Fibonacci codewords one value at a time.
#[derive(Debug)]
pub struct FibonacciWriter<W: Write> {
    output: BitWriter<W>,
    scratch: MyBitVector,
}

impl<W: Write> FibonacciWriter<W> {
    /// Writer emitting into `sink`.
    pub fn new(sink: W) -> Self {
        FibonacciWriter {
            output: BitWriter::new(sink),
            scratch: MyBitVector::with_capacity(FIB64.len() + 1),
        }
    }

    /// Pads the last byte and returns the sink.
    pub fn finish(self) -> Result<W> {
        self.output.finish()
    }
}

impl<W: Write> UnsignedWriter for FibonacciWriter<W> {
    fn write(&mut self, value: u64) -> Result<()> {
        self.scratch.clear();
        encode_into(value, &mut self.scratch)?;
        let codeword = &self.scratch;
        self.output.write_unit(|out| {
            for bit in codeword.iter().by_vals() {
                out.write_bit(bit)?;
            }
            Ok(())
        })
    }
}

/// Reads Fibonacci codewords one value at a time.
#[derive(Debug)]
pub struct FibonacciReader<R: Read> {
    input: BitReader<R>,
}

impl<R: Read> FibonacciReader<R> {
    /// Reader pulling bytes from `source`.
    pub fn new(source: R) -> Self {
        FibonacciReader {
            input: BitReader::new(source),
        }
    }

    /// Returns the byte source.
    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }
}

impl<R: Read> UnsignedReader for FibonacciReader<R> {
    fn try_read(&mut self) -> Result<Option<u64>> {
        if self.input.is_exhausted()? {
            return Ok(None);
        }
        let mut partial = Partial::default();
        loop {
            if let DecResult::Complete(value) = partial.update(self.input.read_bit()?)? {
                return Ok(Some(value));
            }
        }
    }
}
