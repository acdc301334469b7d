// SPDX-License-Identifier: MIT

use zerocopy::IntoBytes;

use crate::core::geometry::Geometry;
use crate::core::utils::checksum_utils::{accumulate_checksum, accumulate_checksum_with_escape};
use crate::exfat::constant::*;
use crate::exfat::types::BootSector;

/// Generators for sectors 0..=11 (and their backup mirror at 12..=23).
///
/// The boot sector image is rendered once at construction; the VBR checksum
/// is computed on the first read of sector 11 and cached. Nothing here calls
/// back into the dispatcher: the region knows all eleven checksummed sectors.
#[derive(Debug, Clone)]
pub struct BootRegion {
    boot: [u8; EXFAT_BYTES_PER_SECTOR as usize],
    vbr_checksum: Option<u32>,
}

impl BootRegion {
    pub fn new(geometry: &Geometry, volume_serial: u32) -> Self {
        let sector = BootSector::new(geometry, volume_serial);
        let mut boot = [0u8; EXFAT_BYTES_PER_SECTOR as usize];
        boot.copy_from_slice(sector.as_bytes());
        Self {
            boot,
            vbr_checksum: None,
        }
    }

    /// Main boot sector (LBA 0) and its backup (LBA 12).
    pub fn render_boot_sector(&self, offset: usize, buf: &mut [u8]) {
        buf.copy_from_slice(&self.boot[offset..offset + buf.len()]);
    }

    /// Extended boot sectors (LBAs 1..=8 and 13..=20): zeros plus the
    /// 0x55AA signature in the last two bytes.
    pub fn render_extended_sector(offset: usize, buf: &mut [u8]) {
        buf.fill(0);
        write_signature(offset, buf);
    }

    /// Checksum sector (LBA 11 and 23): the 32-bit VBR checksum replicated
    /// through the whole sector.
    pub fn render_checksum_sector(&mut self, offset: usize, buf: &mut [u8]) {
        let checksum = self.vbr_checksum();
        let bytes = checksum.to_le_bytes();
        for (i, out) in buf.iter_mut().enumerate() {
            *out = bytes[(offset + i) & 3];
        }
    }

    /// VBR checksum over sectors 0..=10, computed lazily and cached.
    pub fn vbr_checksum(&mut self) -> u32 {
        if let Some(sum) = self.vbr_checksum {
            return sum;
        }
        let sum = self.compute_vbr_checksum();
        self.vbr_checksum = Some(sum);
        sum
    }

    /// Direct rotate-right-and-add walk over the eleven sectors, skipping
    /// VolumeFlags and PercentInUse in sector 0.
    fn compute_vbr_checksum(&self) -> u32 {
        let mut sum: u32 = 0;
        accumulate_checksum_with_escape(&mut sum, &self.boot, |i| {
            EXFAT_VBR_SKIP_OFFSETS.contains(&i)
        });

        let mut extended = [0u8; EXFAT_BYTES_PER_SECTOR as usize];
        Self::render_extended_sector(0, &mut extended);
        for _lba in 1..=8 {
            accumulate_checksum(&mut sum, &extended);
        }

        let zero = [0u8; EXFAT_BYTES_PER_SECTOR as usize];
        for _lba in 9..=10 {
            accumulate_checksum(&mut sum, &zero);
        }
        sum
    }
}

/// Place the 0x55AA signature bytes if they fall inside the requested slice.
fn write_signature(offset: usize, buf: &mut [u8]) {
    let pos55 = EXFAT_BYTES_PER_SECTOR as usize - 2;
    let pos_aa = EXFAT_BYTES_PER_SECTOR as usize - 1;
    let end = offset + buf.len();
    if offset <= pos55 && end > pos55 {
        buf[pos55 - offset] = 0x55;
    }
    if offset <= pos_aa && end > pos_aa {
        buf[pos_aa - offset] = 0xAA;
    }
}
