//! Thompson α code.
//!
//! Same family as [Elias γ](crate::elias_gamma): the value is shifted by one,
//! and its bits minus the implied leading `1` are written after a length.
//! The length, however, is a fixed-width binary field of
//! [`ThompsonAlphaOptions::length_bits`] bits instead of a unary prefix, which
//! is denser for predictable magnitudes and puts a hard ceiling on the
//! bit-length of encodable values (`2^length_bits - 1` bits).
//!
//! The default 7-bit field covers every `u64`.
use std::io::{Read, Write};

use crate::bitstream::{BitReader, BitWriter};
use crate::utils::bit_length;
use crate::{CodecError, Result, UnsignedReader, UnsignedWriter};

/// Bit-length of `u64::MAX + 1`, the largest shifted value.
const MAX_LENGTH: u64 = 65;

/// Width of the length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThompsonAlphaOptions {
    /// `1..=64`
    pub length_bits: u32,
}

impl Default for ThompsonAlphaOptions {
    fn default() -> Self {
        ThompsonAlphaOptions { length_bits: 7 }
    }
}

impl ThompsonAlphaOptions {
    /// Checks the field width.
    pub fn validate(&self) -> Result<()> {
        if self.length_bits == 0 || self.length_bits > 64 {
            return Err(CodecError::InvalidArgument(format!(
                "length field width must be within 1..=64, got {}",
                self.length_bits
            )));
        }
        Ok(())
    }

    /// Largest bit-length the field can express.
    pub fn max_length(&self) -> u64 {
        u64::MAX >> (64 - self.length_bits)
    }

    /// Largest encodable value with this field width.
    pub fn max_value(&self) -> u64 {
        if self.max_length() >= 64 {
            u64::MAX
        } else {
            (1u64 << self.max_length()) - 2
        }
    }
}

/// Writes Thompson α codes into a byte sink.
#[derive(Debug)]
pub struct ThompsonAlphaWriter<W: Write> {
    output: BitWriter<W>,
    options: ThompsonAlphaOptions,
}

impl<W: Write> ThompsonAlphaWriter<W> {
    /// Writer with the default 7-bit length field.
    pub fn new(sink: W) -> Self {
        ThompsonAlphaWriter {
            output: BitWriter::new(sink),
            options: ThompsonAlphaOptions::default(),
        }
    }

    /// Writer with an explicit field width.
    pub fn with_options(sink: W, options: ThompsonAlphaOptions) -> Result<Self> {
        options.validate()?;
        Ok(ThompsonAlphaWriter {
            output: BitWriter::new(sink),
            options,
        })
    }

    /// Size in bits of the code of `value`.
    pub fn encoded_bits(&self, value: u64) -> u64 {
        let len = bit_length(value as u128 + 1) as u64;
        self.options.length_bits as u64 + len - 1
    }

    /// Pads the last byte and returns the sink.
    pub fn finish(self) -> Result<W> {
        self.output.finish()
    }
}

impl<W: Write> UnsignedWriter for ThompsonAlphaWriter<W> {
    fn write(&mut self, value: u64) -> Result<()> {
        let n = value as u128 + 1;
        let len = bit_length(n);
        if len as u64 > self.options.max_length() {
            return Err(CodecError::InvalidArgument(format!(
                "{value} needs a length of {len}, a {}-bit field holds at most {}",
                self.options.length_bits,
                self.options.max_length()
            )));
        }
        let length_bits = self.options.length_bits;
        self.output.write_unit(|out| {
            out.write_bits(len as u64, length_bits)?;
            out.write_bits(n as u64, len - 1)
        })
    }
}

/// Reads Thompson α codes from a byte source.
#[derive(Debug)]
pub struct ThompsonAlphaReader<R: Read> {
    input: BitReader<R>,
    options: ThompsonAlphaOptions,
}

impl<R: Read> ThompsonAlphaReader<R> {
    /// Reader with the default 7-bit length field.
    pub fn new(source: R) -> Self {
        ThompsonAlphaReader {
            input: BitReader::new(source),
            options: ThompsonAlphaOptions::default(),
        }
    }

    /// Reader with an explicit field width; it must match the writer's.
    pub fn with_options(source: R, options: ThompsonAlphaOptions) -> Result<Self> {
        options.validate()?;
        Ok(ThompsonAlphaReader {
            input: BitReader::new(source),
            options,
        })
    }

    /// Returns the byte source.
    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }
}

impl<R: Read> UnsignedReader for ThompsonAlphaReader<R> {
    fn try_read(&mut self) -> Result<Option<u64>> {
        if self.input.is_exhausted()? {
            return Ok(None);
        }
        let len = self.input.read_bits(self.options.length_bits)?;
        if len == 0 {
            return Err(CodecError::DecodeInconsistency(
                "length field of 0".to_string(),
            ));
        }
        if len > MAX_LENGTH {
            return Err(CodecError::DecodeInconsistency(format!(
                "length field of {len} exceeds 64-bit values"
            )));
        }
        let payload_bits = (len - 1) as u32;
        let n = (1u128 << payload_bits) | self.input.read_bits(payload_bits)? as u128;
        u64::try_from(n - 1).map(Some).map_err(|_| {
            CodecError::DecodeInconsistency("Thompson alpha value does not fit in 64 bits".to_string())
        })
    }
}
