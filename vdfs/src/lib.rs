// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

//! On-demand exFAT volume synthesizer.
//!
//! Presents live device memory (flash, SRAM, boot ROM, a growing stdout log,
//! arbitrary registered files) as a read-only exFAT volume whose sectors are
//! generated at request time. No volume image exists anywhere: every sector a
//! host reads is a pure function of the volume geometry, the file registry
//! and the referenced memory.

#[cfg(all(not(feature = "std"), feature = "alloc"))]
extern crate alloc;

// === Core modules ===
pub mod core;
pub mod exfat;

// === Synthesizer ===
pub mod disk;
pub mod notify;
pub mod ring;

// === Virtual file providers ===
pub mod files;

// Reusable types and traits
pub use crate::core::errors::*;
pub use crate::core::geometry::Geometry;
pub use crate::core::options::{
    serial_from_board_id, MemFileOptions, StdoutOptions, VolumeLabel, VolumeOptions,
};
pub use crate::core::registry::{FileContent, FileId, FileSpec};

pub use disk::VirtualDisk;
pub use notify::ChangeNotifier;

pub mod prelude {
    pub use crate::core::errors::*;
    pub use crate::core::geometry::Geometry;
    pub use crate::core::options::*;
    pub use crate::core::registry::{FileContent, FileId, FileSpec};
    pub use crate::disk::VirtualDisk;
    pub use crate::exfat::constant::*;
    pub use crate::notify::ChangeNotifier;
}
