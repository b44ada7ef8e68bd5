//! cairn-core — message descriptors, the catalog, and tag truncation math.
//! The session crate builds on this one; it has no threads and no I/O.

pub mod catalog;
pub mod descriptor;
pub mod tag;

pub use catalog::{Catalog, CatalogError, TagCollision};
pub use descriptor::{type_hash, Descriptor, SizePolicy, HASH_LEN};
