// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use core::fmt::Write as _;

use crate::core::errors::RegisterResult;
use crate::core::registry::{FileId, FileSpec};
use crate::disk::VirtualDisk;

pub const CHANGING_FILE_NAME: &str = "CHANGING.TXT";
pub const CHANGING_FILE_SIZE: u64 = 512;

/// Demo file whose content differs on every read: each slice renders the
/// current uptime plus the requested range. Lets a human check whether the
/// host actually re-reads the disk after a change notification.
pub fn register_changing_file<C>(disk: &mut VirtualDisk, uptime_secs: C) -> RegisterResult<FileId>
where
    C: Fn() -> u32 + Send + Sync + 'static,
{
    let content = move |offset: u64, buf: &mut [u8]| {
        let total = uptime_secs();
        let mut line = LineBuf::new();
        let _ = write!(
            line,
            "{:02}:{:02}:{:02}: off={}, len={}\n",
            total / 3600,
            (total / 60) % 60,
            total % 60,
            offset,
            buf.len()
        );
        let text = line.as_bytes();
        let len = text.len().min(buf.len());
        buf[..len].copy_from_slice(&text[..len]);
        buf[len..].fill(0);
    };

    disk.add_file(
        FileSpec::new(CHANGING_FILE_NAME, CHANGING_FILE_SIZE),
        CHANGING_FILE_SIZE,
        Arc::new(content),
    )
}

/// Small stack-only formatting target; output truncates past capacity.
struct LineBuf {
    data: [u8; 64],
    len: usize,
}

impl LineBuf {
    fn new() -> Self {
        Self {
            data: [0u8; 64],
            len: 0,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl core::fmt::Write for LineBuf {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let room = self.data.len() - self.len;
        let take = s.len().min(room);
        self.data[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}
