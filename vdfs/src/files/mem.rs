// SPDX-License-Identifier: MIT

//! Content providers for the fixed memory-backed files.
//!
//! The cluster placements in [`crate::core::options::VolumeOptions`] are
//! chosen so a file's LBA shifted by the sector shift equals the device
//! address it mirrors; the providers here then only ever see plain file
//! offsets.

use crate::core::registry::FileContent;

/// Provider over a borrowed byte image (ROM dumps, test fixtures).
pub struct SliceContent {
    data: &'static [u8],
}

impl SliceContent {
    pub fn new(data: &'static [u8]) -> Self {
        Self { data }
    }
}

impl FileContent for SliceContent {
    fn read(&self, offset: u64, buf: &mut [u8]) {
        let offset = offset as usize;
        let end = (offset + buf.len()).min(self.data.len());
        if offset >= end {
            buf.fill(0);
            return;
        }
        let len = end - offset;
        buf[..len].copy_from_slice(&self.data[offset..end]);
        buf[len..].fill(0);
    }
}

/// Provider over a raw physical memory region (flash XIP window, SRAM, boot
/// ROM). Reads go through volatile loads so the compiler never caches or
/// widens them.
pub struct RawMemory {
    base: usize,
}

impl RawMemory {
    /// # Safety
    ///
    /// `base..base + size_of_the_registered_file` must stay readable for the
    /// lifetime of the disk, and reading it must be side-effect free.
    pub unsafe fn new(base: usize) -> Self {
        Self { base }
    }
}

// The region is plain readable memory by the constructor contract.
unsafe impl Send for RawMemory {}
unsafe impl Sync for RawMemory {}

impl FileContent for RawMemory {
    fn read(&self, offset: u64, buf: &mut [u8]) {
        let mut src = (self.base + offset as usize) as *const u8;
        for out in buf.iter_mut() {
            // SAFETY: in-bounds by the constructor contract; the dispatcher
            // only asks for offsets below the registered file size.
            unsafe {
                *out = core::ptr::read_volatile(src);
                src = src.add(1);
            }
        }
    }
}
