//! Universal integer codes: self-delimiting, variable-length bit encodings of
//! `u64` (and, via [ZigZag](zigzag), `i64`) that need no dictionary, schema or
//! fixed-width framing.
//!
//! ## Introduction
//! Every code in this crate is built on the same bit-granular stream
//! ([`bitstream::BitWriter`] / [`bitstream::BitReader`]), which sits on top of
//! any [`std::io::Write`] / [`std::io::Read`] byte sink or source.
//! Bits are emitted MSB-first within each byte; the final partial byte is zero padded.
//!
//! The codes:
//! - [`vlq`]: groups of `n` payload bits, each preceded by a continuation flag,
//!   with an optional little-endian byte prefix for values known to be large.
//! - [`elias_gamma`]: unary length, then the value's bits minus the implied leading `1`.
//! - [`thompson_alpha`]: like Elias gamma, but the length sits in a fixed-width binary field.
//! - [`fibonacci`]: [Zeckendorf](https://en.wikipedia.org/wiki/Fibonacci_coding)
//!   representation terminated by `11`, either one value at a time or as a
//!   whole (optionally counted) set of symbols packed into one buffer.
//!
//! # Examples
//! Writing and reading back through the stream codecs:
//! ```rust
//! use univcodes::{UnsignedReader, UnsignedWriter};
//! use univcodes::elias_gamma::{EliasGammaReader, EliasGammaWriter};
//!
//! let mut w = EliasGammaWriter::new(Vec::new());
//! w.write(0).unwrap();
//! w.write(41).unwrap();
//! let bytes = w.finish().unwrap();
//!
//! let mut r = EliasGammaReader::new(bytes.as_slice());
//! assert_eq!(r.read().unwrap(), 0);
//! assert_eq!(r.read().unwrap(), 41);
//! assert_eq!(r.try_read().unwrap(), None);
//! ```
//!
//! Signed values go through the ZigZag adapters:
//! ```rust
//! use univcodes::{SignedReader, SignedWriter};
//! use univcodes::vlq::{VlqReader, VlqWriter};
//! use univcodes::zigzag::{ZigZagReader, ZigZagWriter};
//!
//! let mut w = ZigZagWriter::new(VlqWriter::new(Vec::new()));
//! w.write(-3).unwrap();
//! let bytes = w.into_inner().finish().unwrap();
//!
//! let mut r = ZigZagReader::new(VlqReader::new(bytes.as_slice()));
//! assert_eq!(r.read().unwrap(), -3);
//! ```
//!
//! Fibonacci set compression:
//! ```rust
//! use univcodes::fibonacci::FibonacciCodec;
//! let codec = FibonacciCodec::new(false);
//! let bytes = codec.compress(&[0, 1, 2]).unwrap();
//! assert_eq!(bytes, vec![0b1101_1001, 0b1000_0000]);
//! assert_eq!(codec.decompress(&bytes).unwrap(), vec![0, 1, 2]);
//! ```
pub mod bitstream;
pub mod elias_gamma;
pub mod error;
pub mod fibonacci;
pub mod thompson_alpha;
pub mod utils;
pub mod vlq;
pub mod zigzag;

pub use error::{CodecError, Result};

use bitvec::prelude as bv;

pub(crate) type MyStore = u8;
pub(crate) type MyBitOrder = bv::Msb0;
/// The bitslice used in the crate.
/// Importantly, the byte layout *relies* on `Msb0`
pub type MyBitSlice = bv::BitSlice<MyStore, MyBitOrder>;
/// reftype that goes with [`MyBitSlice`]
pub type MyBitVector = bv::BitVec<MyStore, MyBitOrder>;

/// Encodes one unsigned integer per call.
pub trait UnsignedWriter {
    /// Appends the codeword of `value`.
    fn write(&mut self, value: u64) -> Result<()>;
}

/// Decodes one unsigned integer per call.
pub trait UnsignedReader {
    /// Reads the next value.
    ///
    /// Returns `Ok(None)` when the input is exhausted exactly at a codeword
    /// boundary (only zero padding left), which is the normal end of a
    /// decode loop. A codeword cut short is [`CodecError::EndOfInput`].
    fn try_read(&mut self) -> Result<Option<u64>>;

    /// Reads the next value, treating a clean end of input as an error.
    fn read(&mut self) -> Result<u64> {
        self.try_read()?.ok_or(CodecError::EndOfInput)
    }
}

/// Encodes one signed integer per call.
pub trait SignedWriter {
    /// Appends the codeword of `value`.
    fn write(&mut self, value: i64) -> Result<()>;
}

/// Decodes one signed integer per call.
pub trait SignedReader {
    /// See [`UnsignedReader::try_read`].
    fn try_read(&mut self) -> Result<Option<i64>>;

    /// Reads the next value, treating a clean end of input as an error.
    fn read(&mut self) -> Result<i64> {
        self.try_read()?.ok_or(CodecError::EndOfInput)
    }
}

/// Marker trait for Fibonacci decoders working on an in-memory buffer.
/// This is an iterator over the decoded integers,
/// and lets you return parts of the buffer not yet decoded.
pub trait FbDec<'a>: Iterator<Item = Result<u64>> {
    /// Returns the buffer behind the last bit processed.
    /// Comes handy when the buffer contains data OTHER than fibonacci encoded
    /// data that needs to be processed externally.
    fn get_remaining_buffer(&self) -> &'a MyBitSlice;

    /// how far did we process into the buffer (pretty much the first bit after a 11).
    fn get_bits_processed(&self) -> usize;
}
