// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::core::geometry::Geometry;
use crate::exfat::constant::*;

/// Main/backup boot sector, full 512 bytes.
///
/// The same image is served at LBA 0 and LBA 12; the backup region mirrors
/// the main region byte for byte.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct BootSector {
    pub jump_boot: [u8; 3],
    pub fs_name: [u8; 8],
    pub must_be_zero: [u8; 53],
    pub partition_offset: u64,
    pub volume_length: u64,
    pub fat_offset: u32,
    pub fat_length: u32,
    pub cluster_heap_offset: u32,
    pub cluster_count: u32,
    pub root_dir_cluster: u32,
    pub volume_serial: u32,
    pub fs_revision: u16,
    pub volume_flags: u16,
    pub bytes_per_sector_shift: u8,
    pub sectors_per_cluster_shift: u8,
    pub number_of_fats: u8,
    pub drive_select: u8,
    pub percent_in_use: u8,
    pub reserved: [u8; 7],
    pub boot_code: [u8; 390],
    pub signature: [u8; 2],
}

impl BootSector {
    pub fn new(geometry: &Geometry, volume_serial: u32) -> Self {
        Self {
            jump_boot: EXFAT_JUMP_BOOT,
            fs_name: *EXFAT_FS_NAME,
            must_be_zero: [0u8; 53],
            partition_offset: 0, // unpartitioned: ignore
            volume_length: geometry.volume_length as u64,
            fat_offset: geometry.fat_offset,
            fat_length: geometry.fat_length,
            cluster_heap_offset: geometry.cluster_heap_offset,
            cluster_count: geometry.cluster_count,
            root_dir_cluster: geometry.root_first_cluster,
            volume_serial,
            fs_revision: EXFAT_FS_REVISION,
            volume_flags: 0,
            bytes_per_sector_shift: EXFAT_BYTES_PER_SECTOR_SHIFT as u8,
            sectors_per_cluster_shift: EXFAT_SECTORS_PER_CLUSTER_SHIFT as u8,
            number_of_fats: EXFAT_NUM_FATS,
            drive_select: 0,
            percent_in_use: 0xFF, // not tracked
            reserved: [0u8; 7],
            boot_code: [0u8; 390],
            signature: EXFAT_SIGNATURE,
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::core::options::VolumeOptions;
    use zerocopy::IntoBytes;

    #[test]
    fn test_layout_is_one_sector() {
        assert_eq!(core::mem::size_of::<BootSector>(), 512);
    }

    #[test]
    fn test_field_offsets() {
        let geometry = Geometry::from_options(&VolumeOptions::new("T", 0x1234_5678)).unwrap();
        let boot = BootSector::new(&geometry, 0x1234_5678);
        let bytes = boot.as_bytes();

        assert_eq!(&bytes[0..3], &[0xEB, 0x76, 0x90]);
        assert_eq!(&bytes[3..11], b"EXFAT   ");
        assert_eq!(&bytes[11..64], &[0u8; 53]);
        // VolumeLength at offset 72, FatOffset at 80, heap at 88, count at 92.
        assert_eq!(
            u64::from_le_bytes(bytes[72..80].try_into().unwrap()),
            geometry.volume_length as u64
        );
        assert_eq!(
            u32::from_le_bytes(bytes[80..84].try_into().unwrap()),
            geometry.fat_offset
        );
        assert_eq!(
            u32::from_le_bytes(bytes[88..92].try_into().unwrap()),
            geometry.cluster_heap_offset
        );
        assert_eq!(
            u32::from_le_bytes(bytes[96..100].try_into().unwrap()),
            geometry.root_first_cluster
        );
        assert_eq!(
            u32::from_le_bytes(bytes[100..104].try_into().unwrap()),
            0x1234_5678
        );
        assert_eq!(bytes[108], 9);
        assert_eq!(bytes[109], 3);
        assert_eq!(bytes[110], 1);
        assert_eq!(bytes[112], 0xFF);
        assert_eq!(&bytes[510..512], &[0x55, 0xAA]);
    }
}
