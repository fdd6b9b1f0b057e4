//! Collaborator traits for planorag providers.

mod embedder;
mod object_store;
mod record_store;

pub use embedder::*;
pub use object_store::*;
pub use record_store::*;
