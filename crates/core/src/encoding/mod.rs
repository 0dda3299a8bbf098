//! Encoding of raw bytes to token ids and back.
//!
//! Byte-level only: text is handled as UTF-8 bytes, one base token per byte.

pub mod byte_level;

pub use byte_level::ByteLevelEncoder;
