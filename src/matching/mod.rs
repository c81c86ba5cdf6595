//! Matching engines that pair book entries with bank entries

pub mod auto;
pub mod manual;

pub use auto::*;
pub use manual::*;
