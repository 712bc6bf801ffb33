//! # podguard-store
//!
//! Small JSON documents on local disk.
//!
//! - `JsonFile<T>` is the primitive: fail-open load, atomic pretty save
//! - `FactStore` keeps the agent's persistent memory facts in one such file
//!
//! There is no cross-process locking; each deployment is the single writer
//! of its files.

pub mod facts;
pub mod json_file;

pub use facts::{Fact, FactStore};
pub use json_file::JsonFile;
