//! ZigZag mapping between `i64` and `u64`: `0, -1, 1, -2, 2, ...` becomes
//! `0, 1, 2, 3, 4, ...`, so small magnitudes of either sign stay small.
//!
//! The [`ZigZagWriter`] / [`ZigZagReader`] adapters turn any unsigned
//! codec of this crate into a signed one.
use crate::{Result, SignedReader, SignedWriter, UnsignedReader, UnsignedWriter};

/// Folds the sign into the lowest bit.
#[inline]
pub fn encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`encode`].
#[inline]
pub fn decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Signed writer on top of any [`UnsignedWriter`].
#[derive(Debug)]
pub struct ZigZagWriter<W> {
    inner: W,
}

impl<W: UnsignedWriter> ZigZagWriter<W> {
    /// Wraps `inner`.
    pub fn new(inner: W) -> Self {
        ZigZagWriter { inner }
    }

    /// Returns the unsigned writer, e.g. to `finish` it.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: UnsignedWriter> SignedWriter for ZigZagWriter<W> {
    fn write(&mut self, value: i64) -> Result<()> {
        self.inner.write(encode(value))
    }
}

/// Signed reader on top of any [`UnsignedReader`].
#[derive(Debug)]
pub struct ZigZagReader<R> {
    inner: R,
}

impl<R: UnsignedReader> ZigZagReader<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        ZigZagReader { inner }
    }

    /// Returns the unsigned reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: UnsignedReader> SignedReader for ZigZagReader<R> {
    fn try_read(&mut self) -> Result<Option<i64>> {
        Ok(self.inner.try_read()?.map(decode))
    }
}
