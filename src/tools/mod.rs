//! Building blocks of the codec: bit packing, the adaptive tree, literal framing.
pub mod bit_stream;
pub mod adaptive_tree;
pub mod literal;
