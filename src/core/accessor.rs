// src/core/accessor.rs

//! Bit-level reads and writes on top of byte-sized device tags.

use crate::core::address::Address;
use crate::core::backend::DeviceBackend;
use crate::core::directory::TagDirectory;
use crate::core::errors::BridgeError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Extracts bit `bit` (0 = least significant) of `byte`.
pub fn bit_of(byte: u8, bit: u8) -> bool {
    (byte >> bit) & 1 == 1
}

/// Returns `byte` with bit `bit` set or cleared, leaving all other bits alone.
pub fn with_bit(byte: u8, bit: u8, value: bool) -> u8 {
    let mask = 1u8 << bit;
    if value { byte | mask } else { byte & !mask }
}

/// Resolves addresses through the tag directory and performs the
/// read-modify-write cycle against the device.
pub struct BitAccessor {
    directory: Arc<TagDirectory>,
    device: Arc<dyn DeviceBackend>,
    /// One lock per mapped byte, held across a write's read-then-write pair so
    /// concurrent writers of different bits in the same byte cannot lose updates.
    byte_locks: Vec<Mutex<()>>,
}

impl BitAccessor {
    pub fn new(directory: Arc<TagDirectory>, device: Arc<dyn DeviceBackend>) -> Self {
        let byte_locks = (0..directory.len()).map(|_| Mutex::new(())).collect();
        Self {
            directory,
            device,
            byte_locks,
        }
    }

    pub fn directory(&self) -> &Arc<TagDirectory> {
        &self.directory
    }

    /// Reads a single bit.
    pub async fn read_bit(&self, address: &Address) -> Result<bool, BridgeError> {
        let (_, tag, bit) = self.locate(address)?;
        let value = self.device.read_u8(tag).await?;
        debug!("Read {} from {} (byte 0x{:02X})", address, tag, value);
        Ok(bit_of(value, bit))
    }

    /// Sets or clears a single bit.
    pub async fn write_bit(&self, address: &Address, value: bool) -> Result<(), BridgeError> {
        let (index, tag, bit) = self.locate(address)?;
        let _guard = self.byte_locks[index].lock().await;

        let current = self.device.read_u8(tag).await?;
        let updated = with_bit(current, bit, value);
        self.device.write_u8(tag, updated).await?;
        debug!(
            "Wrote {} to {} (byte 0x{:02X} -> 0x{:02X})",
            address, tag, current, updated
        );
        Ok(())
    }

    /// Checks the bit offset, then the mapping. The first failure wins.
    fn locate(&self, address: &Address) -> Result<(usize, &str, u8), BridgeError> {
        let bit = u8::try_from(address.bit)
            .ok()
            .filter(|b| *b <= 7)
            .ok_or(BridgeError::InvalidBitOffset(address.bit))?;

        let (index, tag) = self
            .directory
            .entry(&address.area, address.byte)
            .ok_or_else(|| BridgeError::UnmappedAddress {
                area: address.area.to_string(),
                byte: address.byte,
            })?;
        Ok((index, tag, bit))
    }
}
