//! Core types for planorag.

mod file;
mod record;
mod result;

pub use file::*;
pub use record::*;
pub use result::*;
