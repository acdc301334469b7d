// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{sync::Arc, vec::Vec};
#[cfg(feature = "std")]
use std::sync::Arc;

use crate::core::errors::{GeometryError, RegisterError, RegisterResult, UpdateResult};
use crate::core::geometry::Geometry;
use crate::core::options::{MemFileOptions, StdoutOptions, VolumeOptions};
use crate::core::registry::{FileContent, FileId, FileRecord, FileSpec, Registry};
use crate::exfat::boot_region::BootRegion;
use crate::exfat::constant::*;
use crate::exfat::fat::Fat0Sector;
use crate::exfat::root_dir::RootDirectory;
use crate::exfat::upcase::UpcaseTable;
use crate::notify::ChangeNotifier;

/// What serves the sectors of one LBA region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionKind {
    BootSector,
    ExtendedBoot,
    Zero,
    Checksum,
    Fat0,
    Bitmap,
    Upcase,
    RootFixed,
    RootSlots,
    DynamicArea,
    /// Fixed memory-backed file, by index into the registry's fixed table.
    MemFile(usize),
}

/// One entry of the ordered region table: `kind` serves every LBA below
/// `next_lba` not claimed by an earlier entry.
#[derive(Debug, Clone, Copy)]
struct Region {
    kind: RegionKind,
    next_lba: u32,
}

/// The owned synthesizer: geometry, generators, file registry and
/// change-notification state behind a single value. The SCSI adapter holds
/// this and routes its callbacks here.
pub struct VirtualDisk {
    geometry: Geometry,
    stdout_opts: StdoutOptions,
    boot: BootRegion,
    fat0: Fat0Sector,
    upcase: UpcaseTable,
    root: RootDirectory,
    registry: Registry,
    notifier: ChangeNotifier,
    regions: Vec<Region>,
}

impl VirtualDisk {
    pub fn new(options: VolumeOptions) -> Result<Self, GeometryError> {
        let geometry = Geometry::from_options(&options)?;
        let upcase = UpcaseTable::new();
        let root = RootDirectory::new(&geometry, &options.volume_label, &upcase);

        let mut disk = Self {
            geometry,
            stdout_opts: options.stdout,
            boot: BootRegion::new(&geometry, options.volume_serial),
            fat0: Fat0Sector::new(&geometry),
            upcase,
            root,
            registry: Registry::new(&geometry, options.max_dynamic_files),
            notifier: ChangeNotifier::new(),
            regions: Vec::new(),
        };
        disk.rebuild_regions();
        Ok(disk)
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    #[inline]
    pub fn stdout_options(&self) -> StdoutOptions {
        self.stdout_opts
    }

    /// `(block_count, block_size)` for READ CAPACITY.
    #[inline]
    pub fn capacity(&self) -> (u32, u32) {
        (self.geometry.volume_length, EXFAT_BYTES_PER_SECTOR)
    }

    /// Announce a content change (see [`ChangeNotifier::content_changed`]).
    #[inline]
    pub fn content_changed(&self, hard: bool) {
        self.notifier.content_changed(hard);
    }

    /// Register a dynamic file; its clusters come from the bump allocator.
    pub fn add_file(
        &mut self,
        spec: FileSpec<'_>,
        max_size_bytes: u64,
        content: Arc<dyn FileContent>,
    ) -> RegisterResult<FileId> {
        let id = self.registry.add_dynamic(spec, max_size_bytes, content)?;
        log::debug!(
            "registered dynamic file {:?} at cluster {}",
            spec.name,
            self.registry.record(id).map(|r| r.first_cluster()).unwrap_or(0),
        );
        Ok(id)
    }

    /// Register a fixed memory-backed file at its configured cluster range.
    pub fn add_mem_file(
        &mut self,
        opts: MemFileOptions,
        created_epoch: i64,
        content: Arc<dyn FileContent>,
    ) -> RegisterResult<()> {
        let clusters = opts.size_bytes.div_ceil(EXFAT_CLUSTER_SIZE as u64) as u32;
        let end = opts.start_cluster + clusters;
        if opts.start_cluster < self.geometry.dynamic_end_cluster
            || end > self.geometry.heap_end_cluster()
        {
            return Err(RegisterError::Other(
                "Memory file outside the reserved cluster range",
            ));
        }

        self.registry.add_fixed(
            FileSpec::new(opts.name, opts.size_bytes).created_at(created_epoch),
            opts.start_cluster,
            content,
        )?;
        self.rebuild_regions();
        log::debug!(
            "registered memory file {:?} at cluster {:#x}",
            opts.name,
            opts.start_cluster
        );
        Ok(())
    }

    /// Resize a dynamic file and schedule a media-change notification.
    pub fn update_file(&mut self, id: FileId, new_size: u64, now_epoch: i64) -> UpdateResult<()> {
        self.registry.update(id, new_size, now_epoch)?;
        self.notifier.content_changed(false);
        Ok(())
    }

    /// Resize without notifying; used when the caller batches several
    /// updates into one notification.
    pub fn update_file_quiet(
        &mut self,
        id: FileId,
        new_size: u64,
        now_epoch: i64,
    ) -> UpdateResult<()> {
        self.registry.update(id, new_size, now_epoch)
    }

    #[inline]
    pub fn file_size(&self, id: FileId) -> Option<u64> {
        self.registry.record(id).map(|r| r.size_bytes())
    }

    #[inline]
    pub fn file_first_cluster(&self, id: FileId) -> Option<u32> {
        self.registry.record(id).map(|r| r.first_cluster())
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// READ(10) entry point: synthesize `buf.len()` bytes of sector `lba`
    /// starting at `offset`. Total on its whole domain; LBAs no region
    /// claims read as zeros. Returns the number of bytes produced, always
    /// `buf.len()`.
    pub fn read(&mut self, lba: u32, offset: usize, buf: &mut [u8]) -> usize {
        debug_assert!(offset < EXFAT_BYTES_PER_SECTOR as usize);
        debug_assert!(offset + buf.len() <= EXFAT_BYTES_PER_SECTOR as usize);

        let kind = self
            .regions
            .iter()
            .find(|r| lba < r.next_lba)
            .map(|r| r.kind);

        match kind {
            Some(RegionKind::BootSector) => self.boot.render_boot_sector(offset, buf),
            Some(RegionKind::ExtendedBoot) => BootRegion::render_extended_sector(offset, buf),
            Some(RegionKind::Zero) | None => buf.fill(0),
            Some(RegionKind::Checksum) => self.boot.render_checksum_sector(offset, buf),
            Some(RegionKind::Fat0) => self.fat0.render(offset, buf),
            Some(RegionKind::Bitmap) => buf.fill(0xFF),
            Some(RegionKind::Upcase) => {
                let sector_index = lba - self.geometry.upcase_first_lba();
                self.upcase.render_sector(sector_index, offset, buf);
            }
            Some(RegionKind::RootFixed) => self.root.render_fixed_sector(offset, buf),
            Some(RegionKind::RootSlots) => {
                let slot = (lba - self.geometry.root_first_lba() - 1) as usize;
                RootDirectory::render_slot_sector(
                    self.registry.slot_mut(slot),
                    &self.upcase,
                    offset,
                    buf,
                );
            }
            Some(RegionKind::DynamicArea) => {
                let cluster = self.geometry.lba_to_cluster(lba);
                match self.registry.dynamic_by_cluster(cluster) {
                    Some(record) => {
                        let base = self.geometry.cluster_to_lba(record.first_cluster());
                        render_file_slice(record, base, lba, offset, buf);
                    }
                    None => buf.fill(0),
                }
            }
            Some(RegionKind::MemFile(index)) => {
                match self.registry.fixed_record(index) {
                    Some(record) => {
                        let base = self.geometry.cluster_to_lba(record.first_cluster());
                        render_file_slice(record, base, lba, offset, buf);
                    }
                    None => buf.fill(0),
                }
            }
        }
        buf.len()
    }

    /// Rebuild the ordered region table. Regions whose end does not advance
    /// past the previous one are skipped, so optional gaps collapse away.
    fn rebuild_regions(&mut self) {
        let g = self.geometry;
        self.regions.clear();

        let mut cursor = 0u32;
        let mut push = |regions: &mut Vec<Region>, kind: RegionKind, next_lba: u32| {
            if next_lba > cursor {
                regions.push(Region { kind, next_lba });
                cursor = next_lba;
            }
        };

        // Main boot region, then its backup, byte-for-byte identical.
        push(&mut self.regions, RegionKind::BootSector, 1);
        push(&mut self.regions, RegionKind::ExtendedBoot, 9);
        push(&mut self.regions, RegionKind::Zero, 11);
        push(&mut self.regions, RegionKind::Checksum, 12);
        push(&mut self.regions, RegionKind::BootSector, 13);
        push(&mut self.regions, RegionKind::ExtendedBoot, 21);
        push(&mut self.regions, RegionKind::Zero, 23);
        push(&mut self.regions, RegionKind::Checksum, 24);

        // Slack before the FAT, first FAT sector, rest of FAT region.
        push(&mut self.regions, RegionKind::Zero, g.fat_offset);
        push(&mut self.regions, RegionKind::Fat0, g.fat_offset + 1);
        push(&mut self.regions, RegionKind::Zero, g.cluster_heap_offset);

        push(
            &mut self.regions,
            RegionKind::Bitmap,
            g.bitmap_first_lba() + g.bitmap_sectors(),
        );
        push(
            &mut self.regions,
            RegionKind::Upcase,
            g.upcase_first_lba() + EXFAT_SECTORS_PER_CLUSTER,
        );
        push(&mut self.regions, RegionKind::Zero, g.root_first_lba());
        push(&mut self.regions, RegionKind::RootFixed, g.root_first_lba() + 1);
        push(
            &mut self.regions,
            RegionKind::RootSlots,
            g.root_first_lba() + g.root_sectors(),
        );
        push(&mut self.regions, RegionKind::DynamicArea, g.dynamic_end_lba());

        // Fixed memory files, in LBA order, with zero gaps between them.
        let mut fixed: Vec<(usize, u32, u32)> = self
            .registry
            .fixed_iter()
            .enumerate()
            .map(|(i, r)| (i, r.first_cluster(), r.end_cluster()))
            .collect();
        fixed.sort_by_key(|&(_, first, _)| first);
        for (index, first, end) in fixed {
            push(&mut self.regions, RegionKind::Zero, g.cluster_to_lba(first));
            push(
                &mut self.regions,
                RegionKind::MemFile(index),
                g.cluster_to_lba(end),
            );
        }
        // Anything beyond the last region falls through to the zero fill in
        // `read`, up to the end of the volume.
    }
}

/// Serve one sector slice of a contiguous file: provider for the in-bounds
/// prefix, zeros past end of file.
fn render_file_slice(
    record: &FileRecord,
    base_lba: u32,
    lba: u32,
    offset: usize,
    buf: &mut [u8],
) {
    let file_offset =
        (((lba - base_lba) as u64) << EXFAT_BYTES_PER_SECTOR_SHIFT) + offset as u64;
    let size = record.size_bytes();
    if file_offset >= size {
        buf.fill(0);
        return;
    }
    let in_bounds = ((size - file_offset).min(buf.len() as u64)) as usize;
    record.content().read(file_offset, &mut buf[..in_bounds]);
    buf[in_bounds..].fill(0);
}
