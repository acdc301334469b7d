// SPDX-License-Identifier: MIT

/// Minimal trait to abstract the rolling "rotate-right then add byte" checksum
/// over the two word sizes exFAT uses (u16 for directory sets, u32 for the
/// boot region and up-case table). Keeps the loop monomorphized and
/// no_std-friendly.
pub trait RollingWord: Copy + Default {
    fn ror1(self) -> Self;
    fn add_byte(self, b: u8) -> Self;
}

impl RollingWord for u16 {
    #[inline(always)]
    fn ror1(self) -> Self {
        self.rotate_right(1)
    }
    #[inline(always)]
    fn add_byte(self, b: u8) -> Self {
        self.wrapping_add(b as u16)
    }
}

impl RollingWord for u32 {
    #[inline(always)]
    fn ror1(self) -> Self {
        self.rotate_right(1)
    }
    #[inline(always)]
    fn add_byte(self, b: u8) -> Self {
        self.wrapping_add(b as u32)
    }
}

/// Core accumulator with an escape predicate on the byte index within `data`.
/// The predicate returning true means "skip this byte".
#[inline(always)]
pub fn accumulate_checksum_with_escape<T, F>(sum: &mut T, data: &[u8], mut escape: F)
where
    T: RollingWord,
    F: FnMut(usize) -> bool,
{
    for (i, &b) in data.iter().enumerate() {
        if escape(i) {
            continue;
        }
        *sum = sum.ror1().add_byte(b);
    }
}

/// Convenience: accumulate with no escaping.
#[inline(always)]
pub fn accumulate_checksum<T: RollingWord>(sum: &mut T, data: &[u8]) {
    accumulate_checksum_with_escape(sum, data, |_i| false);
}

/// One-shot checksum helpers (no escape).
#[inline(always)]
pub fn checksum<T: RollingWord>(data: &[u8]) -> T {
    let mut s: T = Default::default();
    accumulate_checksum(&mut s, data);
    s
}

/// 16-bit SetChecksum over a directory entry set, skipping bytes 2 and 3 of
/// the primary entry where the checksum itself is stored.
#[inline]
pub fn set_checksum(entries: &[u8]) -> u16 {
    let mut sum = 0u16;
    accumulate_checksum_with_escape(&mut sum, entries, |i| i == 2 || i == 3);
    sum
}
