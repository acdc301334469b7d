// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

//! USB mass-storage (SCSI transparent command set) surface for the `vdfs`
//! exFAT synthesizer.
//!
//! The transport (TinyUSB or any bulk-only MSC stack) owns endpoint
//! plumbing; this crate owns the command semantics of a read-only,
//! change-notifying virtual disk: READ(10) dispatch, the write-protect
//! story, and the Unit Attention protocol that keeps host caches honest.

pub mod device;
pub mod scsi;
pub mod sense;

pub use device::{DeviceIdentity, MscDevice};
pub use sense::Sense;
