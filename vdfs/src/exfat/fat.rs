// SPDX-License-Identifier: MIT

use crate::core::geometry::Geometry;
use crate::exfat::constant::*;

/// First FAT sector, the only FAT sector with non-zero content.
///
/// Seeded entries: the media descriptor, the reserved entry, and contiguous
/// chains for the allocation bitmap, the up-case table and the root
/// directory. Everything else in the FAT region reads as zero, which is
/// correct because every file entry carries the NoFatChain flag and hosts
/// must not consult the FAT for them.
#[derive(Debug, Clone)]
pub struct Fat0Sector {
    image: [u8; EXFAT_BYTES_PER_SECTOR as usize],
    seeded_len: usize,
}

impl Fat0Sector {
    pub fn new(geometry: &Geometry) -> Self {
        let mut image = [0u8; EXFAT_BYTES_PER_SECTOR as usize];

        let mut put = |cluster: u32, value: u32| {
            let pos = cluster as usize * EXFAT_FAT_ENTRY_SIZE;
            image[pos..pos + EXFAT_FAT_ENTRY_SIZE].copy_from_slice(&value.to_le_bytes());
        };

        put(0, EXFAT_FAT_MEDIA_ENTRY);
        put(1, EXFAT_EOC);

        let mut chain = |start: u32, length: u32| {
            for i in 0..length {
                let cluster = start + i;
                if i == length - 1 {
                    put(cluster, EXFAT_EOC);
                } else {
                    put(cluster, cluster + 1);
                }
            }
        };

        chain(geometry.bitmap_first_cluster, geometry.bitmap_clusters);
        chain(geometry.upcase_first_cluster, 1);
        chain(geometry.root_first_cluster, geometry.root_clusters);

        let seeded_len =
            (geometry.root_first_cluster + geometry.root_clusters) as usize * EXFAT_FAT_ENTRY_SIZE;

        Self { image, seeded_len }
    }

    /// Number of seeded bytes at the start of the sector.
    #[inline]
    pub fn seeded_len(&self) -> usize {
        self.seeded_len
    }

    pub fn render(&self, offset: usize, buf: &mut [u8]) {
        buf.copy_from_slice(&self.image[offset..offset + buf.len()]);
    }
}
