//! Shared tables and small bit helpers.
use crate::{MyBitSlice, MyBitVector};
use bitvec::{order::BitOrder, slice::BitSlice, store::BitStore};
use itertools::Itertools;
use once_cell::sync::Lazy;

/// Iterative fibonacci. just to get the first N fibonacci numbers
///
/// <https://github.com/rust-lang/rust-by-example>
struct Fibonacci {
    curr: u128,
    next: u128,
}

impl Iterator for Fibonacci {
    type Item = u128;
    fn next(&mut self) -> Option<u128> {
        let new_next = self.curr.checked_add(self.next)?;

        self.curr = self.next;
        self.next = new_next;

        Some(self.curr)
    }
}
/// A "constructor" for Iterative fibonacci, yielding `1, 2, 3, 5, 8, ...`
fn iterative_fibonacci() -> Fibonacci {
    Fibonacci { curr: 1, next: 1 }
}

/// Largest number a Fibonacci codeword carries: `u64::MAX + 1`.
pub(crate) const MAX_FIB_SUM: u128 = u64::MAX as u128 + 1;

/// All fibonacci numbers (starting at 1, 2, 3, ...) not larger than `2^64`.
///
/// 92 entries; computed once and shared by every encoder and decoder.
pub static FIB64: Lazy<Vec<u128>> = Lazy::new(|| {
    iterative_fibonacci()
        .take_while(|f| *f <= MAX_FIB_SUM)
        .collect()
});

/// Number of significant bits in `n` (0 for 0).
#[inline]
pub fn bit_length(n: u128) -> u32 {
    128 - n.leading_zeros()
}

/// just for debugging purpose
pub fn bitstream_to_string<T: BitStore, O: BitOrder>(buffer: &BitSlice<T, O>) -> String {
    let s = buffer.iter().map(|x| if *x { "1" } else { "0" }).join("");
    s
}

/// Renders bytes as space separated groups of 8 binary digits, e.g. `"11011001 10000000"`.
pub fn bytes_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:08b}", b)).join(" ")
}

/// Parses a string of `0`/`1` digits into bytes, MSB-first.
/// Whitespace is ignored and a trailing partial byte is zero padded,
/// so `"11 011 0011 0000000"` gives `[0b11011001, 0b10000000]`.
///
/// Any character other than `0`, `1` or whitespace yields `None`.
pub fn bits_from_str(bits: &str) -> Option<Vec<u8>> {
    let mut bv = MyBitVector::new();
    for c in bits.chars().filter(|c| !c.is_whitespace()) {
        match c {
            '0' => bv.push(false),
            '1' => bv.push(true),
            _ => return None,
        }
    }
    let padding = (8 - bv.len() % 8) % 8;
    bv.resize(bv.len() + padding, false);
    Some(bv.into_vec())
}

/// Turns a vector of 0/1 into a bitvector
pub fn create_bitvector(bits: Vec<u8>) -> MyBitVector {
    bits.iter().map(|b| *b == 1).collect()
}

/// Views a byte buffer as a bitslice in the crate's bit order.
pub fn as_bits(bytes: &[u8]) -> &MyBitSlice {
    MyBitSlice::from_slice(bytes)
}
