// SPDX-License-Identifier: MIT
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{vec, vec::Vec};

use spin::Mutex;

/// Byte ring buffer addressed by absolute stream position.
///
/// The producer appends; the transport reads by the position a byte had in
/// the overall stream. Bytes older than one capacity are gone; reads return
/// how much was actually copied so callers can pad the discarded prefix.
///
/// The lock is held only for the copy; producers and the transport thread
/// may race on this buffer (everything else in the synthesizer is
/// single-threaded by the transport contract).
pub struct RingBuffer {
    inner: Mutex<RingInner>,
}

struct RingInner {
    data: Vec<u8>,
    /// Total bytes ever written. Stream position `p` lives at
    /// `data[p % capacity]` while retained.
    total: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            inner: Mutex::new(RingInner {
                data: vec![0u8; capacity],
                total: 0,
            }),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.lock().data.len()
    }

    /// Total bytes ever pushed through the buffer.
    #[inline]
    pub fn total_written(&self) -> u64 {
        self.inner.lock().total
    }

    /// Append bytes, overwriting the oldest. Writes larger than the capacity
    /// keep only the tail. Returns the new stream total.
    pub fn write(&self, buf: &[u8]) -> u64 {
        let mut rb = self.inner.lock();
        let capacity = rb.data.len();
        rb.total += buf.len() as u64;
        let total = rb.total;

        let keep = buf.len().min(capacity);
        let src = &buf[buf.len() - keep..];
        let start_pos = total - keep as u64;
        let idx = (start_pos % capacity as u64) as usize;
        let first = keep.min(capacity - idx);
        rb.data[idx..idx + first].copy_from_slice(&src[..first]);
        if first < keep {
            rb.data[..keep - first].copy_from_slice(&src[first..]);
        }
        total
    }

    /// Copy bytes from absolute stream position `offset`. Returns the number
    /// of bytes copied; positions outside the retained window copy nothing.
    /// When the requested range starts before the window, the copy lands at
    /// the matching position inside `buf` (the head of `buf` is left alone).
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        let rb = self.inner.lock();

        let capacity = rb.data.len() as u64;
        let end = rb.total;
        let start = end.saturating_sub(capacity);

        let req_end = offset + buf.len() as u64;
        if offset >= end || req_end <= start {
            return 0;
        }

        let copy_start = offset.max(start);
        let copy_end = req_end.min(end);
        let len = (copy_end - copy_start) as usize;
        let dst_off = (copy_start - offset) as usize;

        let idx = (copy_start % capacity) as usize;
        let first = len.min(rb.data.len() - idx);
        buf[dst_off..dst_off + first].copy_from_slice(&rb.data[idx..idx + first]);
        if first < len {
            buf[dst_off + first..dst_off + len].copy_from_slice(&rb.data[..len - first]);
        }
        len
    }
}
