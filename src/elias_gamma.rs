//! Elias γ code.
//!
//! The γ code of `n` is the unary code of `⌊log₂(n + 1)⌋` (that many `0`s,
//! then a `1`) followed by the binary representation of `n + 1` with its most
//! significant bit removed. The `+ 1` shift lets `0` be encoded as the single bit `1`.
//!
//! `u64::MAX` needs 64 zeros, the stop bit and 64 payload bits: 129 bits total.
use std::io::{Read, Write};

use crate::bitstream::{BitReader, BitWriter};
use crate::utils::bit_length;
use crate::{CodecError, Result, UnsignedReader, UnsignedWriter};

/// Longest unary prefix of a valid code.
const MAX_UNARY: u32 = 64;

/// Return the length in bits of the γ code for `value`.
pub fn len_gamma(value: u64) -> u64 {
    let len = bit_length(value as u128 + 1) - 1;
    2 * len as u64 + 1
}

/// Writes Elias γ codes into a byte sink.
#[derive(Debug)]
pub struct EliasGammaWriter<W: Write> {
    output: BitWriter<W>,
}

impl<W: Write> EliasGammaWriter<W> {
    /// Writer emitting into `sink`.
    pub fn new(sink: W) -> Self {
        EliasGammaWriter {
            output: BitWriter::new(sink),
        }
    }

    /// Pads the last byte and returns the sink.
    pub fn finish(self) -> Result<W> {
        self.output.finish()
    }
}

impl<W: Write> UnsignedWriter for EliasGammaWriter<W> {
    fn write(&mut self, value: u64) -> Result<()> {
        let n = value as u128 + 1;
        let len = bit_length(n) - 1;
        self.output.write_unit(|out| {
            out.write_bits(0, len)?;
            out.write_bit(true)?;
            // leading 1 is implied; for n = 2^64 the truncation leaves exactly the 64 zero bits
            out.write_bits(n as u64, len)
        })
    }
}

/// Reads Elias γ codes from a byte source.
#[derive(Debug)]
pub struct EliasGammaReader<R: Read> {
    input: BitReader<R>,
}

impl<R: Read> EliasGammaReader<R> {
    /// Reader pulling bytes from `source`.
    pub fn new(source: R) -> Self {
        EliasGammaReader {
            input: BitReader::new(source),
        }
    }

    /// Returns the byte source.
    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }
}

impl<R: Read> UnsignedReader for EliasGammaReader<R> {
    fn try_read(&mut self) -> Result<Option<u64>> {
        if self.input.is_exhausted()? {
            return Ok(None);
        }
        let mut len = 0;
        while !self.input.read_bit()? {
            len += 1;
            if len > MAX_UNARY {
                return Err(CodecError::DecodeInconsistency(format!(
                    "unary length prefix exceeds {MAX_UNARY} bits"
                )));
            }
        }
        let n = (1u128 << len) | self.input.read_bits(len)? as u128;
        u64::try_from(n - 1).map(Some).map_err(|_| {
            CodecError::DecodeInconsistency("Elias gamma value does not fit in 64 bits".to_string())
        })
    }
}
