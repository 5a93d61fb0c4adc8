//! # Shortstream
//!
//! Adaptive Huffman compression for streams of short text messages, such as
//! a sequence of small JSON objects sent over a socket.  No dictionary is
//! buffered and no code table is transmitted: encoder and decoder start from
//! the same empty tree and update it identically after every token, so the
//! model is carried implicitly by the bitstream.
//!
//! * The model persists across calls on one `Codec`, so later messages are
//!   coded with statistics learned from earlier ones.
//! * Use one `Codec` per logical stream, and feed the decoder exactly the
//!   buffers the encoder produced, in the same order.
//! * The stream has no length header.  The decoder stops when it runs out of
//!   bits, which means a truncated buffer cannot be told apart from a complete one.
//!
//! ```
//! use shortstream::Codec;
//! let mut enc = Codec::new(10).unwrap();
//! let mut dec = Codec::new(10).unwrap();
//! for msg in ["{\"a\":1}", "{\"a\":2}"] {
//!     let packed = enc.compress(msg).unwrap();
//!     assert_eq!(dec.decompress(&packed).unwrap(), msg);
//! }
//! ```

mod tools;
pub mod tokenizer;
pub mod codec;

pub use codec::Codec;
pub use tools::adaptive_tree::{NodeKind,TreeSnapshot};

/// Codec Errors
#[derive(thiserror::Error,Debug,PartialEq)]
pub enum Error {
    #[error("maximum token length {0} is outside 1..=16")]
    InvalidTokenLength(usize),
    #[error("character {0:?} cannot be represented as a single byte")]
    UnrepresentableChar(char),
    #[error("empty token")]
    EmptyToken,
    #[error("token length {len} exceeds maximum {max}")]
    TokenTooLong { len: usize, max: usize },
    #[error("literal repeats a symbol that is already in the tree")]
    DuplicateLiteral,
    #[error("internal node {0} has no child for the bit read")]
    MissingChild(usize),
    #[error("end of stream")]
    EndOfStream
}

pub type Result<T> = std::result::Result<T,Error>;

/// Options controlling the codec
#[derive(Clone,Debug)]
pub struct Options {
    /// maximum token length in bytes, also sets the width of the literal length prefix
    pub max_token_len: usize,
    /// capacity of the node table, not counting the root, each distinct symbol takes two
    pub max_nodes: usize
}

pub const STD_OPTIONS: Options = Options {
    max_token_len: 10,
    max_nodes: 2046
};
