//! Bit-granular reading and writing on top of a byte sink/source.
//!
//! Bits are packed MSB-first: the first bit written lands in the most
//! significant position of the first byte. A group written with
//! [`BitWriter::write_bits`] goes out most-significant-bit first as well,
//! so `write_bits(0b011, 3)` followed by padding yields `01100000`.
//!
//! ```rust
//! use univcodes::bitstream::{BitReader, BitWriter};
//! let mut w = BitWriter::new(Vec::new());
//! w.write_bits(0b011, 3).unwrap();
//! let bytes = w.finish().unwrap();
//! assert_eq!(bytes, vec![0b0110_0000]);
//!
//! let mut r = BitReader::new(bytes.as_slice());
//! assert_eq!(r.read_bits(3).unwrap(), 0b011);
//! assert!(r.is_exhausted().unwrap());
//! ```
use std::io::{ErrorKind, Read, Write};
use tracing::{trace, warn};

use crate::{CodecError, Result};

/// Widest group a single call may move.
pub const MAX_GROUP_BITS: u32 = 64;

fn check_count(count: u32) -> Result<()> {
    if count > MAX_GROUP_BITS {
        return Err(CodecError::InvalidArgument(format!(
            "cannot move {count} bits at once, at most {MAX_GROUP_BITS}"
        )));
    }
    Ok(())
}

/// Writes bits into a byte sink, buffering the current partial byte.
///
/// Every top-level call is one unit: completed bytes are staged and handed
/// to the sink in a single `write_all` when the unit ends. If the unit fails,
/// either while building it or when the sink rejects it, the writer rolls
/// back to where the unit began, so the output never holds part of a unit.
/// Use [`BitWriter::write_unit`] to group several calls into one unit.
///
/// Call [`BitWriter::finish`] to pad the final byte and get the sink back.
/// A writer that is simply dropped still pads and emits its partial byte,
/// but any I/O error on that path can only be logged.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    sink: Option<W>,
    buffer: u8,
    bits_in_buffer: u32,
    position: u64,
    // completed bytes of the unit in progress
    staged: Vec<u8>,
    in_unit: bool,
}

impl<W: Write> BitWriter<W> {
    /// Creates a writer emitting whole bytes into `sink`.
    pub fn new(sink: W) -> Self {
        BitWriter {
            sink: Some(sink),
            buffer: 0,
            bits_in_buffer: 0,
            position: 0,
            staged: Vec::with_capacity(16),
            in_unit: false,
        }
    }

    /// Number of bits written so far (padding excluded).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Appends a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.write_bits(bit as u64, 1)
    }

    /// Appends the `count` least significant bits of `value`, highest first.
    pub fn write_bits(&mut self, value: u64, count: u32) -> Result<()> {
        check_count(count)?;
        self.write_unit(|w| {
            w.push_bits(value, count);
            Ok(())
        })
    }

    /// Runs `f` as a single unit: either everything it writes reaches the
    /// sink, or the writer is left exactly as it was before the call.
    ///
    /// Calls nested inside `f` join the enclosing unit.
    ///
    /// A sink that reports an error after accepting part of the unit's bytes
    /// keeps that part; the writer has no way to take it back.
    pub fn write_unit<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if self.in_unit {
            return f(self);
        }
        let (buffer, bits_in_buffer, position) = (self.buffer, self.bits_in_buffer, self.position);
        self.in_unit = true;
        let result = f(&mut *self).and_then(|_| self.commit());
        self.in_unit = false;
        if result.is_err() {
            trace!(position, "unit failed, rolling back");
            self.buffer = buffer;
            self.bits_in_buffer = bits_in_buffer;
            self.position = position;
            self.staged.clear();
        }
        result
    }

    /// Zero-pads the partial byte (if any), emits it, flushes the sink and returns it.
    ///
    /// On failure the sink is dropped without further writes.
    pub fn finish(mut self) -> Result<W> {
        let flushed = self.flush_partial();
        // released from here on, so `Drop` cannot retry the write
        let mut sink = self.take_sink()?;
        flushed?;
        sink.flush()?;
        Ok(sink)
    }

    fn take_sink(&mut self) -> Result<W> {
        self.sink
            .take()
            .ok_or_else(|| CodecError::InvalidArgument("bit writer already released".to_string()))
    }

    fn push_bits(&mut self, value: u64, count: u32) {
        let mut remaining = count;
        while remaining > 0 {
            let space = 8 - self.bits_in_buffer;
            let take = space.min(remaining);
            let chunk = ((value >> (remaining - take)) & ((1u64 << take) - 1)) as u8;
            self.buffer |= chunk << (space - take);
            self.bits_in_buffer += take;
            remaining -= take;
            if self.bits_in_buffer == 8 {
                self.stage_byte();
            }
        }
        self.position += count as u64;
    }

    fn stage_byte(&mut self) {
        self.staged.push(self.buffer);
        self.buffer = 0;
        self.bits_in_buffer = 0;
    }

    fn commit(&mut self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        match self.sink.as_mut() {
            Some(sink) => sink.write_all(&self.staged)?,
            None => {
                return Err(CodecError::InvalidArgument(
                    "bit writer already released".to_string(),
                ))
            }
        }
        self.staged.clear();
        Ok(())
    }

    fn flush_partial(&mut self) -> Result<()> {
        if self.bits_in_buffer > 0 {
            trace!(padding = 8 - self.bits_in_buffer, "padding final byte");
            self.stage_byte();
        }
        self.commit()
    }
}

impl<W: Write> Drop for BitWriter<W> {
    fn drop(&mut self) {
        if self.sink.is_none() {
            return;
        }
        let flushed = self.flush_partial().and_then(|_| match self.sink.as_mut() {
            Some(sink) => sink.flush().map_err(CodecError::from),
            None => Ok(()),
        });
        if let Err(e) = flushed {
            // nothing to return the error to during a drop
            warn!(error = %e, "bit writer dropped without finish and the flush failed");
        }
    }
}

/// Reads bits from a byte source, one byte fetched at a time.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    source: R,
    current: u8,
    bits_left: u32,
    // all-zero bytes fetched by `is_exhausted` and not yet consumed
    zero_run: u64,
    // first non-zero byte fetched by `is_exhausted`, it follows the zero run
    peeked: Option<u8>,
    position: u64,
}

impl<R: Read> BitReader<R> {
    /// Creates a reader pulling bytes from `source` on demand.
    pub fn new(source: R) -> Self {
        BitReader {
            source,
            current: 0,
            bits_left: 0,
            zero_run: 0,
            peeked: None,
            position: 0,
        }
    }

    /// Number of bits consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns the byte source. Bytes already fetched but not fully
    /// consumed are lost.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Reads a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads `count` bits, the first one read ending up most significant.
    ///
    /// Fails with [`CodecError::EndOfInput`] if the source runs out first.
    pub fn read_bits(&mut self, count: u32) -> Result<u64> {
        check_count(count)?;
        let mut value = 0u64;
        let mut remaining = count;
        while remaining > 0 {
            if self.bits_left == 0 {
                self.current = self.next_byte()?.ok_or(CodecError::EndOfInput)?;
                self.bits_left = 8;
            }
            let take = self.bits_left.min(remaining);
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (self.current >> (self.bits_left - take)) & mask;
            value = (value << take) | chunk as u64;
            self.bits_left -= take;
            remaining -= take;
            self.position += take as u64;
        }
        Ok(value)
    }

    /// True if nothing but zero bits is left: the unread bits of the
    /// current byte are all `0` and so is every remaining byte of the source.
    ///
    /// This is the codeword-boundary end test: none of the codes in this
    /// crate has a codeword made of zero bits only, so such a tail is padding.
    /// Zero bytes looked at on the way are only counted, never stored.
    pub fn is_exhausted(&mut self) -> Result<bool> {
        if self.bits_left > 0 {
            let mask = ((1u16 << self.bits_left) - 1) as u8;
            if self.current & mask != 0 {
                return Ok(false);
            }
        }
        while self.peeked.is_none() {
            match self.fetch()? {
                None => return Ok(true),
                Some(0) => self.zero_run += 1,
                Some(b) => self.peeked = Some(b),
            }
        }
        Ok(false)
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.zero_run > 0 {
            self.zero_run -= 1;
            return Ok(Some(0));
        }
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        self.fetch()
    }

    fn fetch(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.source.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{BitReader, BitWriter};
    use crate::{utils::bytes_to_string, CodecError};
    use pretty_assertions::assert_eq;
    use std::io::{self, Write};

    /// Sink rejecting the `fail_on`-th call to `write` (1-based), accepting all others.
    struct FailOnce {
        out: Vec<u8>,
        calls: usize,
        fail_on: usize,
    }

    impl FailOnce {
        fn new(fail_on: usize) -> Self {
            FailOnce { out: Vec::new(), calls: 0, fail_on }
        }
    }

    impl Write for FailOnce {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls == self.fail_on {
                return Err(io::Error::new(io::ErrorKind::Other, "transient"));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_single_bits() {
        let mut w = BitWriter::new(Vec::new());
        for b in [true, false, true, true] {
            w.write_bit(b).unwrap();
        }
        assert_eq!(w.position(), 4);
        assert_eq!(w.finish().unwrap(), vec![0b1011_0000]);
    }

    #[test]
    fn test_write_groups_across_bytes() {
        let mut w = BitWriter::new(Vec::new());
        w.write_bits(0b101, 3).unwrap();
        w.write_bits(0xABC, 12).unwrap();
        w.write_bits(1, 1).unwrap();
        let bytes = w.finish().unwrap();
        assert_eq!(bytes_to_string(&bytes), "10110101 01111001");
    }

    #[test]
    fn test_write_64_bits() {
        let mut w = BitWriter::new(Vec::new());
        w.write_bit(true).unwrap();
        w.write_bits(u64::MAX, 64).unwrap();
        let bytes = w.finish().unwrap();
        assert_eq!(bytes.len(), 9);
        assert_eq!(bytes[8], 0b1000_0000);

        let mut r = BitReader::new(bytes.as_slice());
        assert!(r.read_bit().unwrap());
        assert_eq!(r.read_bits(64).unwrap(), u64::MAX);
        assert_eq!(r.position(), 65);
    }

    #[test]
    fn test_only_low_bits_are_written() {
        let mut w = BitWriter::new(Vec::new());
        w.write_bits(0xFF, 2).unwrap();
        assert_eq!(w.finish().unwrap(), vec![0b1100_0000]);
    }

    #[test]
    fn test_too_wide_group() {
        let mut w = BitWriter::new(Vec::new());
        assert!(matches!(w.write_bits(0, 65), Err(CodecError::InvalidArgument(_))));
        let mut r = BitReader::new(&[0u8; 16][..]);
        assert!(matches!(r.read_bits(65), Err(CodecError::InvalidArgument(_))));
    }

    #[test]
    fn test_drop_pads_and_emits() {
        let mut out = Vec::new();
        {
            let mut w = BitWriter::new(&mut out);
            w.write_bits(0b11, 2).unwrap();
        }
        assert_eq!(out, vec![0b1100_0000]);
    }

    #[test]
    fn test_rejected_unit_is_rolled_back() {
        let mut sink = FailOnce::new(1);
        let mut w = BitWriter::new(&mut sink);
        w.write_bits(0b101, 3).unwrap();
        // completes two bytes, the sink refuses them
        assert!(matches!(w.write_bits(0xABCD, 16), Err(CodecError::Io(_))));
        assert_eq!(w.position(), 3);
        w.write_bit(true).unwrap();
        w.finish().unwrap();
        assert_eq!(sink.out, vec![0b1011_0000]);
    }

    #[test]
    fn test_failed_unit_keeps_earlier_bits() {
        let mut w = BitWriter::new(Vec::new());
        w.write_bits(0b11, 2).unwrap();
        let r = w.write_unit(|w| {
            w.write_bits(0xFF, 8)?;
            w.write_bits(0, 65)
        });
        assert!(matches!(r, Err(CodecError::InvalidArgument(_))));
        assert_eq!(w.position(), 2);
        assert_eq!(w.finish().unwrap(), vec![0b1100_0000]);
    }

    #[test]
    fn test_unit_is_emitted_whole() {
        let mut sink = FailOnce::new(0);
        let mut w = BitWriter::new(&mut sink);
        w.write_unit(|w| {
            w.write_bits(0xAB, 8)?;
            w.write_bits(0xCD, 8)?;
            w.write_bit(true)
        })
        .unwrap();
        w.finish().unwrap();
        assert_eq!(sink.out, vec![0xAB, 0xCD, 0b1000_0000]);
        // one write for the unit, one for the padded byte
        assert_eq!(sink.calls, 2);
    }

    #[test]
    fn test_failed_finish_writes_nothing_later() {
        let mut sink = FailOnce::new(1);
        let mut w = BitWriter::new(&mut sink);
        w.write_bits(0b11, 2).unwrap();
        assert!(matches!(w.finish(), Err(CodecError::Io(_))));
        assert_eq!(sink.out, Vec::<u8>::new());
        assert_eq!(sink.calls, 1);
    }

    #[test]
    fn test_read_past_end() {
        let mut r = BitReader::new(&[0b1010_1010u8][..]);
        assert_eq!(r.read_bits(6).unwrap(), 0b101010);
        assert!(matches!(r.read_bits(3), Err(CodecError::EndOfInput)));
    }

    #[test]
    fn test_is_exhausted() {
        let mut r = BitReader::new(&[0b1000_0000u8, 0b0000_0001][..]);
        assert!(!r.is_exhausted().unwrap());
        assert!(r.read_bit().unwrap());
        // rest of the first byte is zero, but there is another byte
        assert!(!r.is_exhausted().unwrap());
        assert_eq!(r.read_bits(7).unwrap(), 0);
        assert!(!r.is_exhausted().unwrap());
        assert_eq!(r.read_bits(7).unwrap(), 0);
        assert!(!r.is_exhausted().unwrap());
        assert!(r.read_bit().unwrap());
        assert!(r.is_exhausted().unwrap());
        assert_eq!(r.position(), 16);
    }

    #[test]
    fn test_is_exhausted_on_padding() {
        let mut r = BitReader::new(&[0b1100_0000u8][..]);
        assert_eq!(r.read_bits(2).unwrap(), 0b11);
        assert!(r.is_exhausted().unwrap());
        // padding can still be read explicitly
        assert_eq!(r.read_bits(6).unwrap(), 0);
        assert!(matches!(r.read_bit(), Err(CodecError::EndOfInput)));
    }

    #[test]
    fn test_is_exhausted_on_zero_tail() {
        let mut r = BitReader::new(&[0b1100_0000u8, 0, 0, 0][..]);
        assert_eq!(r.read_bits(2).unwrap(), 0b11);
        assert!(r.is_exhausted().unwrap());
        // the zero bytes looked at are still there to read
        assert_eq!(r.read_bits(30).unwrap(), 0);
        assert!(matches!(r.read_bit(), Err(CodecError::EndOfInput)));
    }

    #[test]
    fn test_is_exhausted_sees_past_zero_bytes() {
        let mut r = BitReader::new(&[0b1000_0000u8, 0, 0, 0b0000_0001][..]);
        assert!(r.read_bit().unwrap());
        assert!(!r.is_exhausted().unwrap());
        assert_eq!(r.read_bits(30).unwrap(), 0);
        assert!(r.read_bit().unwrap());
        assert!(r.is_exhausted().unwrap());
        assert_eq!(r.position(), 32);
    }

    #[test]
    fn test_empty_source() {
        let mut r = BitReader::new(&[0u8; 0][..]);
        assert!(r.is_exhausted().unwrap());
        assert!(matches!(r.read_bit(), Err(CodecError::EndOfInput)));
    }
}
