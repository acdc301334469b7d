mod macros;

// Sub-modules
pub mod errors;
pub mod geometry;
pub mod options;
pub mod registry;
pub mod utils;

// Error types
pub use errors::*;

// Utilities
pub use utils::{checksum_utils::*, time_utils::*};
