// SPDX-License-Identifier: MIT

//! Construction-time configuration.
//!
//! The synthesizer takes one explicit options record instead of compile-time
//! feature flags: disabling a file means not registering it. Defaults mirror
//! a 1 GiB volume with the memory files placed so that their LBAs, shifted by
//! the sector shift, equal the device addresses they expose.

/// Volume label, up to 11 UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeLabel {
    units: [u16; 11],
    len: u8,
}

impl VolumeLabel {
    /// Build a label from UTF-8; code units beyond the 11th are dropped.
    pub fn new(label: &str) -> Self {
        let mut units = [0u16; 11];
        let mut len = 0u8;
        for u in label.encode_utf16().take(11) {
            units[len as usize] = u;
            len += 1;
        }
        Self { units, len }
    }

    pub const fn empty() -> Self {
        Self {
            units: [0u16; 11],
            len: 0,
        }
    }

    #[inline]
    pub fn units(&self) -> &[u16; 11] {
        &self.units
    }

    #[inline]
    pub fn len(&self) -> u8 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<&str> for VolumeLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Placement of one fixed memory-backed file (`SRAM.BIN` and friends).
///
/// `start_cluster` is chosen so that the file's first LBA times the sector
/// size equals the device address of the memory it mirrors; the provider then
/// sees plain file offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemFileOptions {
    pub name: &'static str,
    pub start_cluster: u32,
    pub size_bytes: u64,
}

/// Pacing for the stdout tail-window notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdoutOptions {
    /// Unread bytes below this never trigger a notification from the write
    /// hook alone.
    pub ua_min_amount: usize,
    /// Host idle time after which a write notifies immediately.
    pub ua_delay_sec: u32,
    /// One-shot fallback deadline armed when the immediate path does not fire.
    pub ua_timeout_sec: u32,
}

impl Default for StdoutOptions {
    fn default() -> Self {
        Self {
            ua_min_amount: 128,
            ua_delay_sec: 10,
            ua_timeout_sec: 30,
        }
    }
}

/// Everything the synthesizer needs to lay out and serve the volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeOptions {
    pub volume_label: VolumeLabel,
    /// Total virtual disk size in bytes; must be a multiple of the sector size.
    pub disk_size_bytes: u64,
    /// First FAT sector. At least 24 (the boot regions).
    pub fat_offset: u32,
    /// FAT length in sectors.
    pub fat_length: u32,
    /// First sector of the cluster heap; must be cluster-aligned.
    pub cluster_heap_offset: u32,
    /// Root directory length in clusters.
    pub root_dir_clusters: u32,
    /// End (exclusive) of the bump-allocated dynamic cluster region. The
    /// region starts right after the root directory.
    pub dynamic_end_cluster: u32,
    /// Registry capacity for dynamic files.
    pub max_dynamic_files: usize,
    /// 32-bit volume serial, normally derived from the board id so the same
    /// board re-mounts with a stable identity.
    pub volume_serial: u32,
    pub stdout: StdoutOptions,
}

impl VolumeOptions {
    /// Default 1 GiB layout: FAT at sector 24, heap at sector 0x8010, root
    /// directory at cluster 11, dynamic region up to the first memory file.
    pub fn new(label: &str, volume_serial: u32) -> Self {
        Self {
            volume_label: VolumeLabel::new(label),
            disk_size_bytes: 0x4000_0000,
            fat_offset: 0x18,
            fat_length: 0x800,
            cluster_heap_offset: 0x8010,
            root_dir_clusters: 3,
            dynamic_end_cluster: Self::BOOTROM.start_cluster,
            max_dynamic_files: 12,
            volume_serial,
            stdout: StdoutOptions::default(),
        }
    }

    /// Boot ROM mapped at device address 0.
    pub const BOOTROM: MemFileOptions = MemFileOptions {
        name: "BOOTROM.BIN",
        start_cluster: 0xE000,
        size_bytes: 0x8000,
    };

    /// Execute-in-place flash window at 0x1000_0000.
    pub const FLASH: MemFileOptions = MemFileOptions {
        name: "FLASH.BIN",
        start_cluster: 0xF000,
        size_bytes: 0x20_0000,
    };

    /// Main SRAM at 0x2000_0000.
    pub const SRAM: MemFileOptions = MemFileOptions {
        name: "SRAM.BIN",
        start_cluster: 0x1F000,
        size_bytes: 0x4_2000,
    };
}

/// Derive the volume serial from an 8-byte unique board id: the first four
/// bytes, little-endian. The same board always yields the same serial.
pub fn serial_from_board_id(id: &[u8; 8]) -> u32 {
    u32::from_le_bytes([id[0], id[1], id[2], id[3]])
}
