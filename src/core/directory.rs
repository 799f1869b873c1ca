// src/core/directory.rs

//! The tag directory maps marker byte offsets to device tag names.

use crate::core::address::Area;
use crate::core::backend::{TagArea, TagDataType, TagInfo};

/// An immutable snapshot of the marker byte tags discovered at startup.
///
/// Offsets are assigned sequentially from 0 in the order the device reports
/// its tags, so the mapping is stored as a plain vector indexed by offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDirectory {
    markers: Vec<String>,
}

impl TagDirectory {
    /// Selects every `Marker`/`Byte` tag and numbers them `0..N`.
    ///
    /// A tag name reported twice is only mapped once, at its first position.
    pub fn build(tags: &[TagInfo]) -> Self {
        let mut markers: Vec<String> = Vec::new();
        for tag in tags {
            if tag.area == TagArea::Marker
                && tag.data_type == TagDataType::Byte
                && !markers.contains(&tag.name)
            {
                markers.push(tag.name.clone());
            }
        }
        Self { markers }
    }

    /// Returns the tag name backing `%<area>B<byte>`, if any.
    pub fn resolve(&self, area: &Area, byte: i32) -> Option<&str> {
        self.entry(area, byte).map(|(_, tag)| tag)
    }

    /// Like [`resolve`](Self::resolve), but also yields the directory index.
    pub(crate) fn entry(&self, area: &Area, byte: i32) -> Option<(usize, &str)> {
        if *area != Area::Marker {
            return None;
        }
        let index = usize::try_from(byte).ok()?;
        self.markers.get(index).map(|tag| (index, tag.as_str()))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Iterates `(offset, tag name)` pairs in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.markers.iter().map(String::as_str).enumerate()
    }
}
