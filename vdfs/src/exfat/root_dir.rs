// SPDX-License-Identifier: MIT

use zerocopy::IntoBytes;

use crate::core::geometry::Geometry;
use crate::core::options::VolumeLabel;
use crate::core::registry::FileRecord;
use crate::exfat::constant::*;
use crate::exfat::types::{BitmapEntry, FileEntrySet, UpcaseEntry, VolumeLabelEntry};
use crate::exfat::upcase::UpcaseTable;

/// Root directory renderer.
///
/// Sector 0 carries the fixed set (volume label, allocation bitmap, up-case
/// table); every following sector is one slot holding the directory entry
/// set of one file. Unused bytes read as 0x01 "unused entry" markers, so a
/// host walking the directory skips them without terminating early.
pub struct RootDirectory {
    fixed_sector: [u8; EXFAT_BYTES_PER_SECTOR as usize],
}

impl RootDirectory {
    pub fn new(geometry: &Geometry, label: &VolumeLabel, upcase: &UpcaseTable) -> Self {
        let mut fixed_sector = [EXFAT_ENTRY_UNUSED; EXFAT_BYTES_PER_SECTOR as usize];

        let label_entry = VolumeLabelEntry::new(label);
        let bitmap_entry =
            BitmapEntry::new(geometry.bitmap_first_cluster, geometry.bitmap_data_length());
        let upcase_entry = UpcaseEntry::new(geometry.upcase_first_cluster, upcase);

        fixed_sector[0..EXFAT_ENTRY_SIZE].copy_from_slice(label_entry.as_bytes());
        fixed_sector[EXFAT_ENTRY_SIZE..2 * EXFAT_ENTRY_SIZE].copy_from_slice(bitmap_entry.as_bytes());
        fixed_sector[2 * EXFAT_ENTRY_SIZE..3 * EXFAT_ENTRY_SIZE]
            .copy_from_slice(upcase_entry.as_bytes());

        Self { fixed_sector }
    }

    /// First root-directory sector.
    pub fn render_fixed_sector(&self, offset: usize, buf: &mut [u8]) {
        buf.copy_from_slice(&self.fixed_sector[offset..offset + buf.len()]);
    }

    /// One file slot sector. `record` is `None` for slots past the registry;
    /// those read as all-unused markers.
    pub fn render_slot_sector(
        record: Option<(&mut FileRecord, bool)>,
        upcase: &UpcaseTable,
        offset: usize,
        buf: &mut [u8],
    ) {
        let mut sector = [EXFAT_ENTRY_UNUSED; EXFAT_BYTES_PER_SECTOR as usize];

        if let Some((record, is_fixed)) = record {
            if is_fixed {
                // Fixed files never change: build the set on first use and
                // keep it (this is where the set checksum gets cached).
                if record.cached_set.is_none() {
                    record.cached_set = Some(build_entry_set(record, upcase));
                }
                let set = record.cached_set.as_ref().expect("cached above");
                set.render(&mut sector[..set.byte_len()]);
            } else {
                // Dynamic files mutate (size, mtime): rebuild per read.
                let set = build_entry_set(record, upcase);
                set.render(&mut sector[..set.byte_len()]);
            }
        }

        buf.copy_from_slice(&sector[offset..offset + buf.len()]);
    }
}

fn build_entry_set(record: &FileRecord, upcase: &UpcaseTable) -> FileEntrySet {
    FileEntrySet::contiguous_file(
        &record.name,
        record.attributes,
        record.first_cluster,
        record.size_bytes,
        record.created_epoch,
        record.modified_epoch,
        upcase,
    )
}
