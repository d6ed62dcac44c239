//! Error type shared by every codec and the bit stream.

/// Errors raised while encoding or decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Malformed configuration or call-time input, e.g. a zero group width
    /// or an empty Fibonacci symbol set.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The byte source ran dry in the middle of a codeword.
    #[error("input ended in the middle of a codeword")]
    EndOfInput,

    /// A decoded structural field contradicts itself, e.g. a Thompson alpha
    /// length of 0 or a value that does not fit in 64 bits.
    #[error("inconsistent encoding: {0}")]
    DecodeInconsistency(String),

    /// The underlying byte sink or source failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CodecError>;
