//! Wire-format layer: byte cursor, block framing and per-type decoders.

pub mod block;
pub mod config;
pub mod cursor;
pub mod event;

pub use block::{Block, BlockHeader, decode_block};
pub use cursor::Cursor;
