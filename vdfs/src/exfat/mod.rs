pub mod boot_region;
pub mod constant;
pub mod fat;
pub mod root_dir;
pub mod types;
pub mod upcase;

pub mod prelude {
    pub use super::boot_region::BootRegion;
    pub use super::constant::*;
    pub use super::fat::Fat0Sector;
    pub use super::root_dir::RootDirectory;
    pub use super::types::*;
    pub use super::upcase::UpcaseTable;
}
