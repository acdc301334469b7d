// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::core::errors::RegisterResult;
use crate::core::options::StdoutOptions;
use crate::core::registry::{FileContent, FileId, FileSpec};
use crate::disk::VirtualDisk;
use crate::ring::RingBuffer;

pub const STDOUT_FILE_NAME: &str = "STDOUT.TXT";
pub const STDOUT_TAIL_FILE_NAME: &str = "STDOUT-TAIL.TXT";

/// Transport bulk chunk size; the tail window is always a multiple of it.
const TRANSPORT_CHUNK: u64 = 64;

/// Two virtual files over one stdout ring buffer.
///
/// - `STDOUT.TXT` grows with the stream total; bytes that fell out of the
///   ring read as NULs.
/// - `STDOUT-TAIL.TXT` exposes only the window of bytes the host has not
///   consumed yet, `tail -F` style.
///
/// There is no background alarm: the write hook either notifies immediately
/// or arms a deadline, and the embedding loop drives [`StdoutFiles::poll`].
pub struct StdoutFiles {
    ring: Arc<RingBuffer>,
    tail: Arc<TailState>,
    log_id: FileId,
    tail_id: FileId,
    opts: StdoutOptions,
    last_read_ms: u32,
    deadline_ms: Option<u32>,
}

struct TailWindow {
    start: u64,
    size: u64,
    total_read: u64,
}

/// Shared with the registered content provider; reads advance the consumed
/// watermark, so the window shrinks as the host pulls it.
struct TailState {
    ring: Arc<RingBuffer>,
    window: Mutex<TailWindow>,
    read_happened: AtomicBool,
}

impl TailState {
    fn total_read(&self) -> u64 {
        self.window.lock().total_read
    }
}

impl FileContent for TailState {
    fn read(&self, offset: u64, buf: &mut [u8]) {
        buf.fill(0);
        let mut w = self.window.lock();
        if offset >= w.size {
            return;
        }
        let len = (w.size - offset).min(buf.len() as u64) as usize;
        let stream_pos = w.start + offset;
        self.ring.read_at(stream_pos, &mut buf[..len]);
        if stream_pos + len as u64 > w.total_read {
            w.total_read = stream_pos + len as u64;
        }
        drop(w);
        self.read_happened.store(true, Ordering::Release);
    }
}

impl StdoutFiles {
    /// Register both files. `max_size_bytes` bounds how far `STDOUT.TXT` can
    /// ever grow (clusters are reserved up front).
    pub fn new(
        disk: &mut VirtualDisk,
        ring_capacity: usize,
        max_size_bytes: u64,
    ) -> RegisterResult<Self> {
        let opts = disk.stdout_options();
        let ring = Arc::new(RingBuffer::new(ring_capacity));

        let log_ring = ring.clone();
        let log_content: Arc<dyn FileContent> = Arc::new(move |offset: u64, buf: &mut [u8]| {
            // Discarded prefix reads as NULs; read_at only fills what the
            // ring still holds.
            buf.fill(0);
            log_ring.read_at(offset, buf);
        });
        let log_id = disk.add_file(FileSpec::new(STDOUT_FILE_NAME, 0), max_size_bytes, log_content)?;

        let tail = Arc::new(TailState {
            ring: ring.clone(),
            window: Mutex::new(TailWindow {
                start: 0,
                size: 0,
                total_read: 0,
            }),
            read_happened: AtomicBool::new(false),
        });
        let tail_id = disk.add_file(
            FileSpec::new(STDOUT_TAIL_FILE_NAME, 0),
            max_size_bytes,
            tail.clone(),
        )?;

        Ok(Self {
            ring,
            tail,
            log_id,
            tail_id,
            opts,
            last_read_ms: 0,
            deadline_ms: None,
        })
    }

    #[inline]
    pub fn ring(&self) -> &Arc<RingBuffer> {
        &self.ring
    }

    #[inline]
    pub fn log_file(&self) -> FileId {
        self.log_id
    }

    #[inline]
    pub fn tail_file(&self) -> FileId {
        self.tail_id
    }

    /// Producer entry point: push bytes and run the notification hook.
    pub fn write(&mut self, disk: &mut VirtualDisk, bytes: &[u8], now_ms: u32) {
        let total = self.ring.write(bytes);
        self.sample_host_reads(now_ms);

        let unread = total - self.tail.total_read();
        if unread < self.opts.ua_min_amount as u64 {
            return;
        }

        let idle_ms = now_ms.wrapping_sub(self.last_read_ms);
        if idle_ms >= self.opts.ua_delay_sec.saturating_mul(1000) {
            self.refresh(disk, now_ms);
        } else if self.deadline_ms.is_none() {
            self.deadline_ms =
                Some(now_ms.wrapping_add(self.opts.ua_timeout_sec.saturating_mul(1000)));
        }
    }

    /// Drive the armed deadline; call this from the main loop. Fires the
    /// deferred notification once the timeout passes.
    pub fn poll(&mut self, disk: &mut VirtualDisk, now_ms: u32) {
        self.sample_host_reads(now_ms);
        if let Some(deadline) = self.deadline_ms {
            // Wrapping "now >= deadline".
            if now_ms.wrapping_sub(deadline) < u32::MAX / 2 {
                self.refresh(disk, now_ms);
            }
        }
    }

    /// Recompute the tail window, publish both file sizes and raise one
    /// media-change notification.
    fn refresh(&mut self, disk: &mut VirtualDisk, now_ms: u32) {
        let total = self.ring.total_written();
        let now_epoch = (now_ms / 1000) as i64;

        let rounded = {
            let mut w = self.tail.window.lock();
            let unread = total - w.total_read;
            let rounded = unread / TRANSPORT_CHUNK * TRANSPORT_CHUNK;
            w.start = w.total_read;
            w.size = rounded;
            rounded
        };

        if let Err(e) = disk.update_file_quiet(self.tail_id, rounded, now_epoch) {
            log::warn!("stdout tail resize failed: {e}");
        }
        if let Err(e) = disk.update_file_quiet(self.log_id, total, now_epoch) {
            log::warn!("stdout log resize failed: {e}");
        }
        disk.content_changed(false);
        self.deadline_ms = None;
    }

    /// Fold provider-side read activity into the idle clock.
    fn sample_host_reads(&mut self, now_ms: u32) {
        if self.tail.read_happened.swap(false, Ordering::AcqRel) {
            self.last_read_ms = now_ms;
        }
    }
}
