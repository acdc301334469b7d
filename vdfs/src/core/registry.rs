// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{sync::Arc, vec::Vec};
#[cfg(feature = "std")]
use std::sync::Arc;

use crate::core::errors::{RegisterError, RegisterResult, UpdateError, UpdateResult};
use crate::core::geometry::Geometry;
use crate::exfat::constant::*;
use crate::exfat::types::FileEntrySet;

/// Content provider for a virtual file. Called with in-bounds offsets only;
/// must fill the whole buffer (the dispatcher zero-fills past end of file
/// itself).
pub trait FileContent: Send + Sync {
    fn read(&self, offset: u64, buf: &mut [u8]);
}

impl<F> FileContent for F
where
    F: Fn(u64, &mut [u8]) + Send + Sync,
{
    #[inline]
    fn read(&self, offset: u64, buf: &mut [u8]) {
        self(offset, buf)
    }
}

/// Handle to a dynamic file, returned by registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileId(pub(crate) usize);

/// Registration parameters common to fixed and dynamic files.
#[derive(Debug, Clone, Copy)]
pub struct FileSpec<'a> {
    pub name: &'a str,
    pub size_bytes: u64,
    pub created_epoch: i64,
}

impl<'a> FileSpec<'a> {
    pub fn new(name: &'a str, size_bytes: u64) -> Self {
        Self {
            name,
            size_bytes,
            created_epoch: 0,
        }
    }

    pub fn created_at(mut self, epoch_secs: i64) -> Self {
        self.created_epoch = epoch_secs;
        self
    }
}

/// One registered file. Fixed files keep their construction-time cluster
/// range forever; dynamic files get theirs from the bump allocator.
pub struct FileRecord {
    pub(crate) name: Vec<u16>,
    pub(crate) attributes: u16,
    pub(crate) first_cluster: u32,
    pub(crate) alloc_clusters: u32,
    pub(crate) size_bytes: u64,
    pub(crate) created_epoch: i64,
    pub(crate) modified_epoch: i64,
    pub(crate) content: Arc<dyn FileContent>,
    /// Directory entry set cache; only fixed files keep one (their set never
    /// changes once the checksum has been filled in on first use).
    pub(crate) cached_set: Option<FileEntrySet>,
}

impl FileRecord {
    #[inline]
    pub fn first_cluster(&self) -> u32 {
        self.first_cluster
    }

    #[inline]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    #[inline]
    pub fn content(&self) -> &Arc<dyn FileContent> {
        &self.content
    }

    /// Cluster range end (exclusive).
    #[inline]
    pub(crate) fn end_cluster(&self) -> u32 {
        self.first_cluster + self.alloc_clusters
    }
}

/// File table plus the bump allocator for the dynamic cluster region.
///
/// Append-only: files are registered at startup and never destroyed; updates
/// touch only the size and modification-time words of existing entries.
pub struct Registry {
    fixed: Vec<FileRecord>,
    dynamic: Vec<FileRecord>,
    max_dynamic: usize,
    next_cluster: u32,
    dynamic_end: u32,
}

impl Registry {
    pub fn new(geometry: &Geometry, max_dynamic: usize) -> Self {
        Self {
            fixed: Vec::new(),
            dynamic: Vec::new(),
            max_dynamic,
            next_cluster: geometry.dynamic_start_cluster,
            dynamic_end: geometry.dynamic_end_cluster,
        }
    }

    fn encode_name(name: &str) -> RegisterResult<Vec<u16>> {
        let encoded: Vec<u16> = name.encode_utf16().collect();
        if encoded.is_empty() || encoded.len() > EXFAT_MAX_SLOT_NAME_UTF16 {
            return Err(RegisterError::NameTooLong);
        }
        Ok(encoded)
    }

    /// Register a file at a fixed cluster range (memory-backed files).
    pub fn add_fixed(
        &mut self,
        spec: FileSpec<'_>,
        start_cluster: u32,
        content: Arc<dyn FileContent>,
    ) -> RegisterResult<()> {
        let name = Self::encode_name(spec.name)?;
        self.fixed.push(FileRecord {
            name,
            attributes: EXFAT_ATTR_READ_ONLY,
            first_cluster: start_cluster,
            alloc_clusters: clusters_for(spec.size_bytes),
            size_bytes: spec.size_bytes,
            created_epoch: spec.created_epoch,
            modified_epoch: spec.created_epoch,
            content,
            cached_set: None,
        });
        Ok(())
    }

    /// Register a dynamic file; clusters for `max_size_bytes` are reserved
    /// up front by the bump allocator.
    pub fn add_dynamic(
        &mut self,
        spec: FileSpec<'_>,
        max_size_bytes: u64,
        content: Arc<dyn FileContent>,
    ) -> RegisterResult<FileId> {
        let name = Self::encode_name(spec.name)?;
        if self.dynamic.len() >= self.max_dynamic {
            return Err(RegisterError::TooManyFiles);
        }

        let needed = clusters_for(max_size_bytes.max(spec.size_bytes));
        if self
            .next_cluster
            .checked_add(needed)
            .map_or(true, |end| end > self.dynamic_end)
        {
            return Err(RegisterError::OutOfSpace);
        }
        let first_cluster = self.next_cluster;
        self.next_cluster += needed;

        let id = FileId(self.dynamic.len());
        self.dynamic.push(FileRecord {
            name,
            attributes: EXFAT_ATTR_READ_ONLY,
            first_cluster,
            alloc_clusters: needed,
            size_bytes: spec.size_bytes,
            created_epoch: spec.created_epoch,
            modified_epoch: spec.created_epoch,
            content,
            cached_set: None,
        });
        Ok(id)
    }

    /// Resize a dynamic file. Shrinking never releases clusters; growing past
    /// the reserved capacity only works for the most recently allocated file
    /// (its range abuts the cursor).
    pub fn update(&mut self, id: FileId, new_size: u64, now_epoch: i64) -> UpdateResult<()> {
        let dynamic_end = self.dynamic_end;
        let next_cluster = self.next_cluster;
        let record = self
            .dynamic
            .get_mut(id.0)
            .ok_or(UpdateError::UnknownFile)?;

        let needed = clusters_for(new_size);
        if needed > record.alloc_clusters {
            let grow = needed - record.alloc_clusters;
            if record.end_cluster() != next_cluster {
                return Err(UpdateError::NotAtAllocatorTail);
            }
            if next_cluster
                .checked_add(grow)
                .map_or(true, |end| end > dynamic_end)
            {
                return Err(UpdateError::OutOfSpace);
            }
            self.next_cluster += grow;
            record.alloc_clusters = needed;
        }

        record.size_bytes = new_size;
        record.modified_epoch = now_epoch;
        Ok(())
    }

    /// Root-directory slot lookup: fixed files first, then dynamic. Returns
    /// the record and whether it is fixed (entry-set cacheable).
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<(&mut FileRecord, bool)> {
        if index < self.fixed.len() {
            return Some((&mut self.fixed[index], true));
        }
        let index = index - self.fixed.len();
        self.dynamic.get_mut(index).map(|r| (r, false))
    }

    /// Fixed files in registration order.
    pub(crate) fn fixed_iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.fixed.iter()
    }

    pub(crate) fn fixed_record(&self, index: usize) -> Option<&FileRecord> {
        self.fixed.get(index)
    }

    /// Find the dynamic file whose allocated cluster range contains `cluster`.
    pub(crate) fn dynamic_by_cluster(&self, cluster: u32) -> Option<&FileRecord> {
        self.dynamic
            .iter()
            .find(|r| cluster >= r.first_cluster && cluster < r.end_cluster())
    }

    #[inline]
    pub fn file_count(&self) -> usize {
        self.fixed.len() + self.dynamic.len()
    }

    #[inline]
    pub fn dynamic_count(&self) -> usize {
        self.dynamic.len()
    }

    #[inline]
    pub(crate) fn record(&self, id: FileId) -> Option<&FileRecord> {
        self.dynamic.get(id.0)
    }

    /// Allocation cursor, for diagnostics and tests.
    #[inline]
    pub fn next_free_cluster(&self) -> u32 {
        self.next_cluster
    }
}

/// Clusters needed to back `size` bytes.
#[inline]
fn clusters_for(size: u64) -> u32 {
    u32::try_from(size.div_ceil(EXFAT_CLUSTER_SIZE as u64)).unwrap_or(u32::MAX)
}
