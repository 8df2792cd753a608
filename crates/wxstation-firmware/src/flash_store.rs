//! Settings record in on-chip flash
//!
//! The record sits at the start of the `nvs` data partition, located through
//! the partition table written by the bootloader. It is prefixed by its length:
//!
//! ```text
//! [len: u16 LE][record ...]
//! ```
//!
//! Erased flash reads back as `0xFFFF`, which is treated as empty.

use embedded_storage::{ReadStorage, Storage};
use esp_bootloader_esp_idf::partitions::{
    self, DataPartitionSubType, PARTITION_TABLE_MAX_LEN, PartitionType,
};
use esp_storage::{FlashStorage, FlashStorageError};
use log::{debug, info};
use wxstation_core::settings::{SETTINGS_RECORD_LEN, SettingsStore};

const HEADER_LEN: usize = 2;
const FRAME_LEN: usize = HEADER_LEN + SETTINGS_RECORD_LEN;
const ERASED: u16 = 0xFFFF;

#[derive(Debug)]
pub enum FlashStoreError {
    Flash(FlashStorageError),
    PartitionTable(partitions::Error),
    /// The partition table has no `nvs` data partition
    NoNvsPartition,
    /// The `nvs` partition cannot hold a settings frame
    PartitionTooSmall(u32),
    /// Stored length does not fit a settings record
    BadLength(u16),
}

pub struct FlashSettingsStore<'d> {
    flash: FlashStorage<'d>,
    offset: u32,
}

impl<'d> FlashSettingsStore<'d> {
    /// Open the store at the start of the `nvs` partition
    pub fn new(mut flash: FlashStorage<'d>) -> Result<Self, FlashStoreError> {
        let mut table = [0u8; PARTITION_TABLE_MAX_LEN];
        let offset = {
            let entries = partitions::read_partition_table(&mut flash, &mut table)
                .map_err(FlashStoreError::PartitionTable)?;
            let nvs = entries
                .find_partition(PartitionType::Data(DataPartitionSubType::Nvs))
                .map_err(FlashStoreError::PartitionTable)?
                .ok_or(FlashStoreError::NoNvsPartition)?;
            if (nvs.len() as usize) < FRAME_LEN {
                return Err(FlashStoreError::PartitionTooSmall(nvs.len()));
            }
            nvs.offset()
        };

        info!("Settings stored in nvs partition at {:#x}", offset);
        Ok(Self { flash, offset })
    }
}

impl SettingsStore for FlashSettingsStore<'_> {
    type Error = FlashStoreError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut header = [0u8; HEADER_LEN];
        self.flash
            .read(self.offset, &mut header)
            .map_err(FlashStoreError::Flash)?;

        let len = u16::from_le_bytes(header);
        if len == ERASED || len == 0 {
            return Ok(0);
        }
        let dst = buf
            .get_mut(..usize::from(len))
            .filter(|_| usize::from(len) <= SETTINGS_RECORD_LEN)
            .ok_or(FlashStoreError::BadLength(len))?;

        self.flash
            .read(self.offset + HEADER_LEN as u32, dst)
            .map_err(FlashStoreError::Flash)?;
        Ok(usize::from(len))
    }

    fn write(&mut self, record: &[u8]) -> Result<(), Self::Error> {
        let len = u16::try_from(record.len())
            .ok()
            .filter(|&len| usize::from(len) <= SETTINGS_RECORD_LEN)
            .ok_or(FlashStoreError::BadLength(u16::MAX))?;

        let mut frame = [0u8; FRAME_LEN];
        frame[..HEADER_LEN].copy_from_slice(&len.to_le_bytes());
        frame[HEADER_LEN..HEADER_LEN + record.len()].copy_from_slice(record);

        // Storage::write erases the sector as needed
        self.flash
            .write(self.offset, &frame[..HEADER_LEN + record.len()])
            .map_err(FlashStoreError::Flash)?;
        debug!("Wrote {} byte settings frame", HEADER_LEN + record.len());
        Ok(())
    }
}
