//! Key-value storage backends.
//!
//! Backends only move JSON values in and out. Record layout and key naming belong to
//! `BoundsStore` and `SelectedPreset`.

mod file;
mod memory;
mod r#trait;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::r#trait::{create_store, KeyValueStore};
