// SPDX-License-Identifier: MIT

use core::fmt;

/// Geometry construction failures. All of these indicate an options record
/// that cannot produce a valid exFAT layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    VolumeTooSmall,
    FatOffsetTooSmall,
    HeapNotClusterAligned,
    RegionOverlap,
    ClusterOutOfRange(u32),
    Other(&'static str),
}

impl GeometryError {
    pub fn msg(&self) -> &'static str {
        match self {
            GeometryError::VolumeTooSmall => "Volume too small for boot region + FAT + heap",
            GeometryError::FatOffsetTooSmall => "FAT offset below the 24-sector boot region",
            GeometryError::HeapNotClusterAligned => {
                "Cluster heap offset is not a multiple of sectors-per-cluster"
            }
            GeometryError::RegionOverlap => "Volume regions overlap or are out of order",
            GeometryError::ClusterOutOfRange(_) => "Cluster index outside the cluster heap",
            GeometryError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        if let GeometryError::ClusterOutOfRange(cluster) = self {
            write!(f, " (cluster: {})", cluster)?;
        }
        Ok(())
    }
}

/// File registration failures, surfaced to the registering caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    OutOfSpace,
    TooManyFiles,
    NameTooLong,
    Other(&'static str),
}

impl RegisterError {
    pub fn msg(&self) -> &'static str {
        match self {
            RegisterError::OutOfSpace => "Dynamic cluster region exhausted",
            RegisterError::TooManyFiles => "File registry full",
            RegisterError::NameTooLong => "File name does not fit a directory slot",
            RegisterError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

/// File update failures. Growing is only possible at the allocator tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    NotAtAllocatorTail,
    OutOfSpace,
    UnknownFile,
    Other(&'static str),
}

impl UpdateError {
    pub fn msg(&self) -> &'static str {
        match self {
            UpdateError::NotAtAllocatorTail => {
                "File cluster range does not abut the allocation cursor"
            }
            UpdateError::OutOfSpace => "Dynamic cluster region exhausted",
            UpdateError::UnknownFile => "No such file in the registry",
            UpdateError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VdError {
    Geometry(GeometryError),
    Register(RegisterError),
    Update(UpdateError),
    Other(&'static str),
}

impl VdError {
    pub fn msg(&self) -> &'static str {
        match self {
            VdError::Geometry(e) => e.msg(),
            VdError::Register(e) => e.msg(),
            VdError::Update(e) => e.msg(),
            VdError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for VdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

// === type *Result ===

pub type VdResult<T = ()> = Result<T, VdError>;
pub type GeometryResult<T = ()> = Result<T, GeometryError>;
pub type RegisterResult<T = ()> = Result<T, RegisterError>;
pub type UpdateResult<T = ()> = Result<T, UpdateError>;

crate::vd_error_wiring! {
    top => VdError {
        GeometryError : Geometry,
        RegisterError : Register,
        UpdateError   : Update,
    },
    str_into => [
        GeometryError,
        RegisterError,
        UpdateError,
    ],
}
