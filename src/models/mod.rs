//! Data models for uploads, containers, and blobs.

mod blob;
mod container;
mod file;

pub use blob::*;
pub use container::*;
pub use file::*;
