//! Variable-length quantity coding.
//!
//! A value is cut into groups of `group_bits` payload bits (7 by default),
//! lowest group first. Each group is preceded by a flag bit: `0` means more
//! groups follow, `1` marks the last group. After every non-final group the
//! remaining value is decremented by one, which makes the code a bijection:
//! every bit string of valid groups decodes to exactly one value, and no value
//! has two encodings.
//!
//! With the default settings every group fills exactly one byte:
//! ```rust
//! use univcodes::UnsignedWriter;
//! use univcodes::vlq::VlqWriter;
//! let mut w = VlqWriter::new(Vec::new());
//! w.write(1).unwrap();
//! w.write(128).unwrap();
//! assert_eq!(w.finish().unwrap(), vec![0x81, 0x00, 0x80]);
//! ```
//!
//! If values are known to be large, an `expected_min_value` hint makes every
//! value start with a number of plain little-endian bytes before the
//! variable-length tail.
use std::io::{Read, Write};

use crate::bitstream::{BitReader, BitWriter};
use crate::{CodecError, Result, UnsignedReader, UnsignedWriter};

const PREFIX_BYTE_BITS: u32 = 8;

/// Construction-time settings shared by [`VlqWriter`] and [`VlqReader`].
/// Both sides must agree on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlqOptions {
    /// Payload bits per group, `1..=64`.
    pub group_bits: u32,
    /// Expected minimum of the values; only used to derive the prefix length.
    pub expected_min_value: u64,
}

impl Default for VlqOptions {
    fn default() -> Self {
        VlqOptions {
            group_bits: 7,
            expected_min_value: 0,
        }
    }
}

impl VlqOptions {
    /// Checks the group width.
    pub fn validate(&self) -> Result<()> {
        if self.group_bits == 0 || self.group_bits > 64 {
            return Err(CodecError::InvalidArgument(format!(
                "VLQ group width must be within 1..=64, got {}",
                self.group_bits
            )));
        }
        Ok(())
    }

    /// Number of whole bytes written ahead of the groups.
    pub fn prefix_bytes(&self) -> u32 {
        let mut hint = self.expected_min_value;
        let mut prefix = 0;
        while hint > u8::MAX as u64 {
            prefix += 1;
            hint /= u8::MAX as u64;
        }
        prefix
    }

    // largest value that fits into a single (final) group
    fn max_group(&self) -> u64 {
        u64::MAX >> (64 - self.group_bits)
    }
}

/// Writes VLQ codes into a byte sink.
#[derive(Debug)]
pub struct VlqWriter<W: Write> {
    output: BitWriter<W>,
    options: VlqOptions,
    prefix_bytes: u32,
}

impl<W: Write> VlqWriter<W> {
    /// Writer with 7-bit groups and no prefix.
    pub fn new(sink: W) -> Self {
        let options = VlqOptions::default();
        VlqWriter {
            output: BitWriter::new(sink),
            prefix_bytes: options.prefix_bytes(),
            options,
        }
    }

    /// Writer with explicit settings.
    pub fn with_options(sink: W, options: VlqOptions) -> Result<Self> {
        options.validate()?;
        Ok(VlqWriter {
            output: BitWriter::new(sink),
            prefix_bytes: options.prefix_bytes(),
            options,
        })
    }

    /// Size in bits of the code of `value` under these settings.
    pub fn encoded_bits(&self, value: u64) -> u64 {
        let mut value = value;
        for _ in 0..self.prefix_bytes {
            value >>= PREFIX_BYTE_BITS;
        }
        let mut groups = 1;
        while value > self.options.max_group() {
            value = (value >> self.options.group_bits) - 1;
            groups += 1;
        }
        (self.prefix_bytes * PREFIX_BYTE_BITS) as u64 + groups * (self.options.group_bits as u64 + 1)
    }

    /// Pads the last byte and returns the sink.
    pub fn finish(self) -> Result<W> {
        self.output.finish()
    }
}

impl<W: Write> UnsignedWriter for VlqWriter<W> {
    fn write(&mut self, value: u64) -> Result<()> {
        let prefix_bytes = self.prefix_bytes;
        let group_bits = self.options.group_bits;
        let max_group = self.options.max_group();
        self.output.write_unit(|out| {
            let mut value = value;
            for _ in 0..prefix_bytes {
                out.write_bits(value & 0xFF, PREFIX_BYTE_BITS)?;
                value >>= PREFIX_BYTE_BITS;
            }

            while value > max_group {
                // more groups following
                out.write_bit(false)?;
                out.write_bits(value, group_bits)?;
                value = (value >> group_bits) - 1;
            }

            out.write_bit(true)?;
            out.write_bits(value, group_bits)
        })
    }
}

/// Reads VLQ codes from a byte source.
#[derive(Debug)]
pub struct VlqReader<R: Read> {
    input: BitReader<R>,
    options: VlqOptions,
    prefix_bytes: u32,
}

impl<R: Read> VlqReader<R> {
    /// Reader with 7-bit groups and no prefix.
    pub fn new(source: R) -> Self {
        let options = VlqOptions::default();
        VlqReader {
            input: BitReader::new(source),
            prefix_bytes: options.prefix_bytes(),
            options,
        }
    }

    /// Reader with explicit settings; they must match the writer's.
    pub fn with_options(source: R, options: VlqOptions) -> Result<Self> {
        options.validate()?;
        Ok(VlqReader {
            input: BitReader::new(source),
            prefix_bytes: options.prefix_bytes(),
            options,
        })
    }

    /// Returns the byte source.
    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }
}

fn overflow() -> CodecError {
    CodecError::DecodeInconsistency("VLQ value does not fit in 64 bits".to_string())
}

impl<R: Read> UnsignedReader for VlqReader<R> {
    fn try_read(&mut self) -> Result<Option<u64>> {
        if self.input.is_exhausted()? {
            return Ok(None);
        }

        let group_bits = self.options.group_bits;
        let mut value: u128 = 0;
        let mut offset: u32 = 0;
        for _ in 0..self.prefix_bytes {
            value |= (self.input.read_bits(PREFIX_BYTE_BITS)? as u128) << offset;
            offset += PREFIX_BYTE_BITS;
        }

        let mut last = self.input.read_bit()?;
        value += (self.input.read_bits(group_bits)? as u128) << offset;
        while !last {
            offset += group_bits;
            if offset >= 64 {
                return Err(overflow());
            }
            last = self.input.read_bit()?;
            value += (self.input.read_bits(group_bits)? as u128 + 1) << offset;
            if value > u64::MAX as u128 {
                return Err(overflow());
            }
        }
        u64::try_from(value).map(Some).map_err(|_| overflow())
    }
}
