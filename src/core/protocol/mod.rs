// src/core/protocol/mod.rs

pub mod command;
pub mod line_codec;
pub use command::Command;
pub use line_codec::{DEFAULT_MAX_LINE_LENGTH, LineCodec};
