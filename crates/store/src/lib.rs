//! JSON file-backed key-value map.
//! - Mirrors an in-memory `serde_json::Map` to a single file on disk.
//! - Loads the file on open, or creates it with an empty object.
//! - Optionally persists every mutation immediately.

pub mod errors;
pub mod options;
pub mod persistent_map;
mod codec;

pub use errors::StoreError;
pub use options::MapOptions;
pub use persistent_map::PersistentMap;
