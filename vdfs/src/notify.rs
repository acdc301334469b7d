// SPDX-License-Identifier: MIT

//! Host cache-coherence events.
//!
//! The synthesizer never calls upward into the SCSI layer; it latches events
//! here and the adapter consumes them from its own hooks. All state is
//! word-granularity atomic: the flags are touched from the transport thread
//! and from whatever context reports new content.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Windows workaround: the first "prevent medium removal" after (re)attach
/// must be rejected or the host never honors later media-change reports.
const NEED_DISALLOW_REMOVAL_FAIL: u8 = 0x01;
/// A Unit Attention (media may have changed, ASC 0x28) is owed to the host.
const NEED_UA_28H: u8 = 0x02;

pub struct ChangeNotifier {
    flags: AtomicU8,
    reconnect: AtomicBool,
    last_ua_ms: AtomicU32,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            flags: AtomicU8::new(NEED_DISALLOW_REMOVAL_FAIL),
            reconnect: AtomicBool::new(false),
            last_ua_ms: AtomicU32::new(0),
        }
    }

    /// Announce new or changed content. `hard` additionally requests a brief
    /// USB electrical disconnect, for hosts that ignore UA 0x28.
    pub fn content_changed(&self, hard: bool) {
        self.flags
            .fetch_or(NEED_DISALLOW_REMOVAL_FAIL | NEED_UA_28H, Ordering::AcqRel);
        if hard {
            self.reconnect.store(true, Ordering::Release);
        }
        log::debug!("content changed (hard={hard})");
    }

    /// PREVENT ALLOW MEDIUM REMOVAL hook: returns false (fail the request)
    /// exactly once after attach or content change.
    pub fn take_disallow_removal_failure(&self) -> bool {
        let prev = self
            .flags
            .fetch_and(!NEED_DISALLOW_REMOVAL_FAIL, Ordering::AcqRel);
        prev & NEED_DISALLOW_REMOVAL_FAIL != 0
    }

    /// TEST UNIT READY hook: returns true when a Unit Attention must be
    /// raised now. Rate limited; a pending UA stays latched while the limit
    /// holds it back. Millisecond arithmetic wraps.
    pub fn take_unit_attention(&self, now_ms: u32, min_delay_ms: u32) -> bool {
        if self.flags.load(Ordering::Acquire) & NEED_UA_28H == 0 {
            return false;
        }
        let last = self.last_ua_ms.load(Ordering::Acquire);
        if now_ms.wrapping_sub(last) < min_delay_ms {
            return false;
        }
        self.flags.fetch_and(!NEED_UA_28H, Ordering::AcqRel);
        self.last_ua_ms.store(now_ms, Ordering::Release);
        true
    }

    /// One-shot: whether the transport should drop and re-raise the USB
    /// connection.
    pub fn take_reconnect_request(&self) -> bool {
        self.reconnect.swap(false, Ordering::AcqRel)
    }

    /// Whether a UA is latched (diagnostics).
    pub fn unit_attention_pending(&self) -> bool {
        self.flags.load(Ordering::Acquire) & NEED_UA_28H != 0
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_first_disallow_fails_then_succeeds() {
        let n = ChangeNotifier::new();
        assert!(n.take_disallow_removal_failure());
        assert!(!n.take_disallow_removal_failure());
    }

    #[test]
    fn test_ua_sequencing() {
        let n = ChangeNotifier::new();
        assert!(!n.take_unit_attention(6000, 5000));

        n.content_changed(false);
        assert!(n.unit_attention_pending());
        assert!(n.take_unit_attention(6010, 5000));
        // Consumed: the next poll reports ready again.
        assert!(!n.take_unit_attention(12000, 5000));
    }

    #[test]
    fn test_ua_rate_limit_holds_latch() {
        let n = ChangeNotifier::new();
        n.content_changed(false);
        assert!(n.take_unit_attention(5000, 5000));

        n.content_changed(false);
        // Too soon: latched but not delivered.
        assert!(!n.take_unit_attention(6000, 5000));
        assert!(n.unit_attention_pending());
        assert!(n.take_unit_attention(10001, 5000));
    }

    #[test]
    fn test_ua_survives_millisecond_wraparound() {
        let n = ChangeNotifier::new();
        n.content_changed(false);
        assert!(n.take_unit_attention(u32::MAX - 1000, 5000));
        n.content_changed(false);
        // 6001 ms after the previous UA, across the wrap.
        assert!(n.take_unit_attention(5000, 5000));
    }

    #[test]
    fn test_content_change_rearms_disallow_failure() {
        let n = ChangeNotifier::new();
        assert!(n.take_disallow_removal_failure());
        n.content_changed(false);
        assert!(n.take_disallow_removal_failure());
    }

    #[test]
    fn test_hard_change_requests_reconnect() {
        let n = ChangeNotifier::new();
        n.content_changed(false);
        assert!(!n.take_reconnect_request());
        n.content_changed(true);
        assert!(n.take_reconnect_request());
        assert!(!n.take_reconnect_request());
    }
}
