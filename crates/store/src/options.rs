use serde::Deserialize;

/// Persistence settings for a [`PersistentMap`](crate::PersistentMap).
///
/// Fixed for the lifetime of the map once it is opened.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapOptions {
    /// Persist the full store after every `set` / `delete`.
    #[serde(default = "default_true")]
    pub auto_write: bool,
    /// Order top-level keys lexicographically when serializing.
    #[serde(default = "default_true")]
    pub sort_keys: bool,
    /// Spaces per nesting level in the written file.
    #[serde(default = "default_indent")]
    pub indent: usize,
    /// Write to `<file>.tmp` and rename over the target.
    #[serde(default)]
    pub atomic_write: bool,
    /// Create missing parent directories before writing.
    #[serde(default)]
    pub create_parent_dirs: bool,
}

fn default_true() -> bool { true }
fn default_indent() -> usize { 4 }

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            auto_write: true,
            sort_keys: true,
            indent: default_indent(),
            atomic_write: false,
            create_parent_dirs: false,
        }
    }
}

impl MapOptions {
    pub fn auto_write(mut self, on: bool) -> Self {
        self.auto_write = on;
        self
    }

    pub fn sort_keys(mut self, on: bool) -> Self {
        self.sort_keys = on;
        self
    }

    pub fn indent(mut self, spaces: usize) -> Self {
        self.indent = spaces;
        self
    }

    pub fn atomic_write(mut self, on: bool) -> Self {
        self.atomic_write = on;
        self
    }

    pub fn create_parent_dirs(mut self, on: bool) -> Self {
        self.create_parent_dirs = on;
        self
    }
}
