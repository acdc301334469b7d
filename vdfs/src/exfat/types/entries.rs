// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::core::options::VolumeLabel;
use crate::core::utils::time_utils::{timestamp_from_epoch, UTC_OFFSET_UTC};
use crate::exfat::constant::*;
use crate::exfat::upcase::UpcaseTable;

/// Volume Label directory entry (0x83).
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct VolumeLabelEntry {
    pub entry_type: u8,
    pub char_count: u8,
    pub volume_label: [u16; 11],
    pub reserved: [u8; 8],
}

impl VolumeLabelEntry {
    pub fn new(label: &VolumeLabel) -> Self {
        Self {
            entry_type: EXFAT_ENTRY_LABEL,
            char_count: label.len(),
            volume_label: *label.units(),
            reserved: [0u8; 8],
        }
    }
}

/// Allocation Bitmap directory entry (0x81).
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct BitmapEntry {
    pub entry_type: u8,
    pub bitmap_flags: u8,
    pub reserved: [u8; 18],
    pub first_cluster: u32,
    pub data_length: u64,
}

impl BitmapEntry {
    pub fn new(first_cluster: u32, data_length: u64) -> Self {
        Self {
            entry_type: EXFAT_ENTRY_BITMAP,
            bitmap_flags: 0,
            reserved: [0u8; 18],
            first_cluster,
            data_length,
        }
    }
}

/// Up-case Table directory entry (0x82).
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct UpcaseEntry {
    pub entry_type: u8,
    pub reserved1: [u8; 3],
    pub table_checksum: u32,
    pub reserved2: [u8; 12],
    pub first_cluster: u32,
    pub data_length: u64,
}

impl UpcaseEntry {
    pub fn new(first_cluster: u32, table: &UpcaseTable) -> Self {
        Self {
            entry_type: EXFAT_ENTRY_UPCASE,
            reserved1: [0u8; 3],
            table_checksum: table.checksum(),
            reserved2: [0u8; 12],
            first_cluster,
            data_length: table.data_length() as u64,
        }
    }
}

/// File directory entry (0x85), the primary of every file entry set.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct FileEntry {
    pub entry_type: u8,
    pub secondary_count: u8,
    pub set_checksum: u16,
    pub file_attributes: u16,
    pub reserved1: u16,
    pub create_timestamp: u32,
    pub modify_timestamp: u32,
    pub access_timestamp: u32,
    pub create_10ms_increment: u8,
    pub modify_10ms_increment: u8,
    pub create_utc_offset: u8,
    pub modify_utc_offset: u8,
    pub access_utc_offset: u8,
    pub reserved2: [u8; 7],
}

/// Stream Extension entry (0xC0).
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct StreamEntry {
    pub entry_type: u8,
    pub general_secondary_flags: u8,
    pub reserved1: u8,
    pub name_length: u8,
    pub name_hash: u16,
    pub reserved2: u16,
    pub valid_data_length: u64,
    pub reserved3: u32,
    pub first_cluster: u32,
    pub data_length: u64,
}

/// File Name entry (0xC1), 15 UTF-16 code units per entry.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct NameEntry {
    pub entry_type: u8,
    pub general_secondary_flags: u8,
    pub name_chars: [u16; EXFAT_NAME_ENTRY_CHARS],
}

impl NameEntry {
    pub fn new(name_chars: [u16; EXFAT_NAME_ENTRY_CHARS]) -> Self {
        Self {
            entry_type: EXFAT_ENTRY_NAME,
            general_secondary_flags: 0,
            name_chars,
        }
    }
}

/// One file's directory entry set: primary + stream extension + name entries.
#[derive(Debug, Clone)]
pub struct FileEntrySet {
    pub primary: FileEntry,
    pub stream: StreamEntry,
    pub names: Vec<NameEntry>,
}

impl FileEntrySet {
    /// Build a set for a contiguous file. The set checksum is computed over
    /// the rendered entries and stored in the primary.
    #[allow(clippy::too_many_arguments)]
    pub fn contiguous_file(
        name: &[u16],
        attributes: u16,
        first_cluster: u32,
        size_bytes: u64,
        create_epoch: i64,
        modify_epoch: i64,
        upcase: &UpcaseTable,
    ) -> Self {
        let names = name_entries(name);
        let secondary_count = 1 + names.len() as u8;

        let create_timestamp = timestamp_from_epoch(create_epoch);
        let modify_timestamp = timestamp_from_epoch(modify_epoch);

        let primary = FileEntry {
            entry_type: EXFAT_ENTRY_FILE,
            secondary_count,
            set_checksum: 0, // computed below
            file_attributes: attributes,
            reserved1: 0,
            create_timestamp,
            modify_timestamp,
            access_timestamp: modify_timestamp,
            create_10ms_increment: 0,
            modify_10ms_increment: 0,
            create_utc_offset: UTC_OFFSET_UTC,
            modify_utc_offset: UTC_OFFSET_UTC,
            access_utc_offset: UTC_OFFSET_UTC,
            reserved2: [0u8; 7],
        };

        let stream = StreamEntry {
            entry_type: EXFAT_ENTRY_STREAM,
            general_secondary_flags: EXFAT_STREAM_FLAGS_CONTIGUOUS,
            reserved1: 0,
            name_length: name.len() as u8,
            name_hash: name_hash(name, upcase),
            reserved2: 0,
            valid_data_length: size_bytes,
            reserved3: 0,
            first_cluster,
            data_length: size_bytes,
        };

        let mut set = Self {
            primary,
            stream,
            names,
        };
        set.primary.set_checksum = set.compute_set_checksum();
        set
    }

    /// Number of 32-byte entries in the set.
    #[inline]
    pub fn entry_count(&self) -> usize {
        2 + self.names.len()
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.entry_count() * EXFAT_ENTRY_SIZE
    }

    /// Render all entries into `out`, which must hold [`Self::byte_len`] bytes.
    pub fn render(&self, out: &mut [u8]) {
        let mut pos = 0;
        out[pos..pos + EXFAT_ENTRY_SIZE].copy_from_slice(self.primary.as_bytes());
        pos += EXFAT_ENTRY_SIZE;
        out[pos..pos + EXFAT_ENTRY_SIZE].copy_from_slice(self.stream.as_bytes());
        pos += EXFAT_ENTRY_SIZE;
        for name in &self.names {
            out[pos..pos + EXFAT_ENTRY_SIZE].copy_from_slice(name.as_bytes());
            pos += EXFAT_ENTRY_SIZE;
        }
    }

    /// SetChecksum over the rendered set, skipping the field that stores it.
    pub fn compute_set_checksum(&self) -> u16 {
        let mut sum = 0u16;
        accumulate_entry(&mut sum, self.primary.as_bytes(), true);
        accumulate_entry(&mut sum, self.stream.as_bytes(), false);
        for name in &self.names {
            accumulate_entry(&mut sum, name.as_bytes(), false);
        }
        sum
    }
}

fn accumulate_entry(sum: &mut u16, entry: &[u8], skip_checksum_field: bool) {
    for (i, &b) in entry.iter().enumerate() {
        if skip_checksum_field && (i == 2 || i == 3) {
            continue;
        }
        *sum = sum.rotate_right(1).wrapping_add(b as u16);
    }
}

/// Split a UTF-16 name into 15-unit name entries, zero padded.
pub fn name_entries(name: &[u16]) -> Vec<NameEntry> {
    let count = name.len().div_ceil(EXFAT_NAME_ENTRY_CHARS);

    (0..count)
        .map(|i| {
            let start = i * EXFAT_NAME_ENTRY_CHARS;
            let end = ((i + 1) * EXFAT_NAME_ENTRY_CHARS).min(name.len());

            let mut name_chars = [0u16; EXFAT_NAME_ENTRY_CHARS];
            for (j, &c) in name[start..end].iter().enumerate() {
                name_chars[j] = c;
            }

            NameEntry::new(name_chars)
        })
        .collect()
}

/// NameHash over the up-cased name, low byte then high byte of each unit.
#[inline]
pub fn name_hash(name: &[u16], upcase: &UpcaseTable) -> u16 {
    let mut h: u16 = 0;
    for &cu in name {
        let b = upcase.upper(cu).to_le_bytes();
        h = h.rotate_right(1).wrapping_add(b[0] as u16);
        h = h.rotate_right(1).wrapping_add(b[1] as u16);
    }
    h
}
