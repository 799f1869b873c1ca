// src/core/address.rs

//! Symbolic bit addresses such as `%M0.3`.

use std::fmt;

/// A memory area keyword as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Area {
    /// `M`, the marker (flag) memory. The only area that can be resolved.
    Marker,
    /// Any other keyword, kept upper-cased so it can be echoed back in errors.
    Other(String),
}

impl Area {
    /// Parses an area keyword case-insensitively.
    pub fn parse(keyword: &str) -> Self {
        let upper = keyword.to_ascii_uppercase();
        if upper == "M" {
            Area::Marker
        } else {
            Area::Other(upper)
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Area::Marker => f.write_str("M"),
            Area::Other(keyword) => f.write_str(keyword),
        }
    }
}

/// A single bit within a byte-sized memory location.
///
/// Offsets are kept as signed integers so that out-of-range input such as
/// `-1` survives parsing and is reported by the accessor with its real value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub area: Area,
    pub byte: i32,
    pub bit: i32,
}

impl Address {
    pub fn new(area: Area, byte: i32, bit: i32) -> Self {
        Self { area, byte, bit }
    }

    /// Shorthand for a marker address.
    pub fn marker(byte: i32, bit: i32) -> Self {
        Self::new(Area::Marker, byte, bit)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}{}.{}", self.area, self.byte, self.bit)
    }
}
