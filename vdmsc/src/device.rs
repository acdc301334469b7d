// SPDX-License-Identifier: MIT

use zerocopy::IntoBytes;

use vdfs::VirtualDisk;

use crate::scsi::*;
use crate::sense::Sense;

/// INQUIRY identity strings, space padded to their fixed widths.
#[derive(Debug, Clone, Copy)]
pub struct DeviceIdentity {
    pub vendor: [u8; 8],
    pub product: [u8; 16],
    pub revision: [u8; 4],
}

impl DeviceIdentity {
    pub fn new(vendor: &str, product: &str, revision: &str) -> Self {
        Self {
            vendor: pad(vendor),
            product: pad(product),
            revision: pad(revision),
        }
    }
}

fn pad<const N: usize>(s: &str) -> [u8; N] {
    let mut out = [b' '; N];
    for (i, &b) in s.as_bytes().iter().take(N).enumerate() {
        out[i] = b;
    }
    out
}

/// The SCSI-facing adapter: owns the synthesizer and maps the transport's
/// callbacks onto it. One LUN, never writable, never concurrently entered
/// (the transport serializes commands per LUN).
pub struct MscDevice {
    disk: VirtualDisk,
    identity: DeviceIdentity,
    ua_min_delay_ms: u32,
    sense: Option<Sense>,
}

/// Default pacing for Unit Attention delivery.
pub const UA_MIN_DELAY_MS: u32 = 5000;

impl MscDevice {
    pub fn new(disk: VirtualDisk, identity: DeviceIdentity) -> Self {
        Self {
            disk,
            identity,
            ua_min_delay_ms: UA_MIN_DELAY_MS,
            sense: None,
        }
    }

    pub fn with_ua_min_delay(mut self, ms: u32) -> Self {
        self.ua_min_delay_ms = ms;
        self
    }

    #[inline]
    pub fn disk(&self) -> &VirtualDisk {
        &self.disk
    }

    #[inline]
    pub fn disk_mut(&mut self) -> &mut VirtualDisk {
        &mut self.disk
    }

    /// Queued sense data, consumed by the transport's REQUEST SENSE path.
    pub fn take_sense(&mut self) -> Option<Sense> {
        self.sense.take()
    }

    /// Whether the transport should drop and re-raise the USB connection to
    /// force a full host re-enumeration. One-shot.
    pub fn take_reconnect_request(&self) -> bool {
        self.disk.notifier().take_reconnect_request()
    }

    /// READ(10): synthesize `buf.len()` bytes of `lba` starting at `offset`.
    pub fn read10(&mut self, lba: u32, offset: u32, buf: &mut [u8]) -> i32 {
        self.disk.read(lba, offset as usize, buf) as i32
    }

    /// WRITE(10): unreachable in a correct stack, since `is_writable` gates
    /// it off; a buggy transport still gets a clean write-protect failure.
    pub fn write10(&mut self, _lba: u32, _offset: u32, _buf: &[u8]) -> i32 {
        debug_assert!(false, "write10 on a read-only device");
        self.sense = Some(Sense::write_protected());
        -1
    }

    /// READ CAPACITY source: `(block_count, block_size)`.
    #[inline]
    pub fn capacity(&self) -> (u32, u32) {
        self.disk.capacity()
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        false
    }

    /// INQUIRY: identity strings plus the PROTECT bit.
    pub fn inquiry(&self) -> InquiryResponse {
        let mut resp = InquiryResponse::new();
        resp.protect |= 0x01;
        resp.vendor_id = self.identity.vendor;
        resp.product_id = self.identity.product;
        resp.product_rev = self.identity.revision;
        resp
    }

    /// TEST UNIT READY: reports not-ready with a Unit Attention when a
    /// media change is owed (rate limited), ready otherwise.
    pub fn test_unit_ready(&mut self, now_ms: u32) -> bool {
        if self
            .disk
            .notifier()
            .take_unit_attention(now_ms, self.ua_min_delay_ms)
        {
            self.sense = Some(Sense::medium_may_have_changed());
            return false;
        }
        true
    }

    /// PREVENT ALLOW MEDIUM REMOVAL: fails exactly once after attach or a
    /// content change, which makes hosts treat the medium as removable and
    /// honor later change reports.
    pub fn prevent_allow_medium_removal(&mut self, _prevent: bool, _control: u8) -> bool {
        !self.disk.notifier().take_disallow_removal_failure()
    }

    /// START STOP UNIT: accepted, nothing to spin up or eject.
    pub fn start_stop(&mut self, _power_condition: u8, _start: bool, _load_eject: bool) -> bool {
        true
    }

    /// Raw command filter for everything the transport does not handle
    /// itself. Returns bytes placed in `buf`, or -1 to fail the command /
    /// defer to the transport default (which one depends on the sense queued
    /// here: write-like commands fail CHECK CONDITION, unknown commands are
    /// the transport's business).
    pub fn scsi(&mut self, cmd: &[u8; 16], buf: &mut [u8]) -> i32 {
        match cmd[0] {
            // Anything that would alter the medium: Data Protect.
            SCSI_CMD_MODE_SELECT_6
            | SCSI_CMD_MODE_SELECT_10
            | SCSI_CMD_UNMAP
            | SCSI_CMD_FORMAT_UNIT
            | SCSI_CMD_WRITE_12
            | SCSI_CMD_WRITE_16 => {
                self.sense = Some(Sense::write_protected());
                -1
            }

            // MODE SENSE(10): bare write-protected header, no descriptors.
            SCSI_CMD_MODE_SENSE_10 => {
                let header = ModeSense10Header::write_protected();
                let bytes = header.as_bytes();
                if buf.len() < bytes.len() {
                    return -1;
                }
                buf[..bytes.len()].copy_from_slice(bytes);
                bytes.len() as i32
            }

            // Everything else: transport default handling.
            _ => -1,
        }
    }
}
