mod boot;
mod entries;

pub use boot::*;
pub use entries::*;
