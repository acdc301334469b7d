// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{string::String, sync::Arc, vec::Vec};
#[cfg(feature = "std")]
use std::sync::Arc;

use crate::core::errors::RegisterResult;
use crate::core::registry::{FileContent, FileId, FileSpec};
use crate::disk::VirtualDisk;

/// Flash program page granularity the partition table counts in.
pub const FLASH_PAGE_SIZE: u64 = 4096;

/// At most this many partition files are exposed.
pub const MAX_PARTITION_FILES: usize = 8;

/// One named flash partition, as reported by the platform's partition
/// enumerator. Names are UTF-8, up to 127 bytes.
#[derive(Debug, Clone)]
pub struct PartitionInfo {
    pub name: String,
    pub first_page: u32,
    pub size_bytes: u32,
}

/// Expose flash partitions as read-only files. Content is served through
/// `flash`, the same provider that backs `FLASH.BIN`, at the partition's
/// page offset. Returns the ids of the files actually registered.
pub fn register_partitions(
    disk: &mut VirtualDisk,
    partitions: &[PartitionInfo],
    flash: Arc<dyn FileContent>,
    created_epoch: i64,
) -> RegisterResult<Vec<FileId>> {
    if partitions.len() > MAX_PARTITION_FILES {
        log::warn!(
            "{} partitions reported, exposing the first {}",
            partitions.len(),
            MAX_PARTITION_FILES
        );
    }

    let mut ids = Vec::new();
    for part in partitions.iter().take(MAX_PARTITION_FILES) {
        let base = part.first_page as u64 * FLASH_PAGE_SIZE;
        let source = flash.clone();
        let content = move |offset: u64, buf: &mut [u8]| source.read(base + offset, buf);

        let id = disk.add_file(
            FileSpec::new(&part.name, part.size_bytes as u64).created_at(created_epoch),
            part.size_bytes as u64,
            Arc::new(content),
        )?;
        ids.push(id);
    }
    Ok(ids)
}
