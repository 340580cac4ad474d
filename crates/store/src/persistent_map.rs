use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{codec, errors::StoreError, options::MapOptions};

/// JSON file-backed string-keyed map.
///
/// Holds the whole store in memory and rewrites the backing file in full on
/// every write. Opening an existing file loads it; opening a missing path
/// creates the file with `{}`. With `auto_write` on, `set` and `delete`
/// persist before returning. `update` always persists.
///
/// Assumes exclusive ownership of the backing file. There is no locking and
/// nothing is flushed on drop.
pub struct PersistentMap {
    store: Map<String, Value>,
    file_path: PathBuf,
    options: MapOptions,
    dirty: bool,
}

impl PersistentMap {
    /// Open `path` with default options.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StoreError> {
        Self::open_with(path, MapOptions::default())
    }

    /// Open `path`, loading it if it is a regular file, otherwise creating it.
    pub fn open_with<P: Into<PathBuf>>(path: P, options: MapOptions) -> Result<Self, StoreError> {
        let mut map = Self { store: Map::new(), file_path: path.into(), options, dirty: false };
        if map.file_path.is_file() {
            map.read_now()?;
        } else {
            map.write_now()?;
        }
        Ok(map)
    }

    pub fn path(&self) -> &Path { &self.file_path }

    pub fn options(&self) -> &MapOptions { &self.options }

    /// Whether in-memory state differs from the last successful read or write.
    pub fn is_dirty(&self) -> bool { self.dirty }

    pub fn as_map(&self) -> &Map<String, Value> { &self.store }

    pub fn get(&self, key: &str) -> Result<&Value, StoreError> {
        self.store.get(key).ok_or_else(|| StoreError::key_not_found(key))
    }

    /// Look up `key` and deserialize its value into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let value = self.get(key)?.clone();
        serde_json::from_value(value).map_err(|e| StoreError::invalid_value(Some(key), e))
    }

    /// Bind `value` to `key`, replacing any previous binding.
    ///
    /// On a failed auto-write the in-memory change is kept and the map stays dirty.
    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Result<(), StoreError> {
        self.store.insert(key.into(), value.into());
        self.dirty = true;
        self.write_if_auto()
    }

    /// Remove `key` and return its value.
    pub fn delete(&mut self, key: &str) -> Result<Value, StoreError> {
        let removed = self.store.shift_remove(key).ok_or_else(|| StoreError::key_not_found(key))?;
        self.dirty = true;
        self.write_if_auto()?;
        Ok(removed)
    }

    pub fn contains(&self, key: &str) -> bool { self.store.contains_key(key) }

    pub fn len(&self) -> usize { self.store.len() }

    pub fn is_empty(&self) -> bool { self.store.is_empty() }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.store.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.store.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` into the store and write, regardless of `auto_write`.
    pub fn update<I, K>(&mut self, other: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in other {
            self.store.insert(key.into(), value);
        }
        self.dirty = true;
        self.write_now()
    }

    /// Merge a JSON object into the store; any other value is rejected untouched.
    pub fn update_from_value(&mut self, other: Value) -> Result<(), StoreError> {
        let other: Map<String, Value> =
            serde_json::from_value(other).map_err(|e| StoreError::invalid_value(None, e))?;
        self.update(other)
    }

    /// Bytes the next write would put on disk.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, StoreError> {
        codec::encode(&self.store, self.options.sort_keys, self.options.indent)
            .map_err(|e| StoreError::io(&self.file_path, e.into()))
    }

    /// Serialize and write the full store, clearing the dirty flag.
    pub fn write_now(&mut self) -> Result<(), StoreError> {
        let bytes = self.to_json_bytes()?;
        codec::write_file(&self.file_path, &bytes, self.options.atomic_write, self.options.create_parent_dirs)?;
        self.dirty = false;
        debug!(path = %self.file_path.display(), entries = self.store.len(), bytes = bytes.len(), "persistent_map_written");
        Ok(())
    }

    /// Reload the store from disk, discarding unsaved changes.
    pub fn read_now(&mut self) -> Result<(), StoreError> {
        self.store = codec::read_file(&self.file_path)?;
        self.dirty = false;
        debug!(path = %self.file_path.display(), entries = self.store.len(), "persistent_map_loaded");
        Ok(())
    }

    fn write_if_auto(&mut self) -> Result<(), StoreError> {
        if self.options.auto_write {
            self.write_now()?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PersistentMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter { self.store.iter() }
}

impl fmt::Display for PersistentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compact = serde_json::to_string(&self.store).map_err(|_| fmt::Error)?;
        f.write_str(&compact)
    }
}

impl fmt::Debug for PersistentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentMap")
            .field("file_path", &self.file_path)
            .field("options", &self.options)
            .field("dirty", &self.dirty)
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn tmp_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("persistent_map_{}_{}.json", tag, Uuid::new_v4()))
    }

    #[test]
    fn dirty_tracks_unwritten_changes() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("dirty");
        let mut map = PersistentMap::open_with(&tmp, MapOptions::default().auto_write(false))?;
        assert!(!map.is_dirty());

        map.set("a", 1)?;
        assert!(map.is_dirty());
        map.write_now()?;
        assert!(!map.is_dirty());

        map.delete("a")?;
        assert!(map.is_dirty());
        map.read_now()?;
        assert!(!map.is_dirty());
        assert_eq!(map.get("a")?, &json!(1));

        let _ = std::fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn auto_write_clears_dirty() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("auto");
        let mut map = PersistentMap::open(&tmp)?;
        map.set("k", "v")?;
        assert!(!map.is_dirty());
        let _ = std::fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn delete_preserves_order_of_remaining_keys() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("order");
        let mut map = PersistentMap::open_with(&tmp, MapOptions::default().auto_write(false))?;
        map.set("c", 1)?;
        map.set("a", 2)?;
        map.set("b", 3)?;
        assert_eq!(map.delete("a")?, json!(2));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["c", "b"]);
        let _ = std::fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn get_as_deserializes_typed_values() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("typed");
        let mut map = PersistentMap::open_with(&tmp, MapOptions::default().auto_write(false))?;
        map.set("ports", json!([80, 443]))?;
        let ports: Vec<u16> = map.get_as("ports")?;
        assert_eq!(ports, vec![80, 443]);
        let err = map.get_as::<String>("ports").unwrap_err();
        assert!(err.is_invalid_value());
        assert!(!err.to_string().contains(&*tmp.to_string_lossy()));
        assert!(map.get_as::<u8>("missing").unwrap_err().is_key_not_found());
        let _ = std::fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn update_from_value_rejects_non_objects() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("non_object");
        let mut map = PersistentMap::open(&tmp)?;
        let err = map.update_from_value(json!([1, 2])).unwrap_err();
        assert!(err.is_invalid_value());
        assert!(map.update_from_value(json!(5)).unwrap_err().is_invalid_value());
        assert!(map.is_empty());
        assert!(!map.is_dirty());
        let _ = std::fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn display_is_compact_json() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("display");
        let mut map = PersistentMap::open_with(&tmp, MapOptions::default().auto_write(false))?;
        map.set("b", json!({"x": null}))?;
        map.set("a", true)?;
        assert_eq!(map.to_string(), r#"{"b":{"x":null},"a":true}"#);
        let _ = std::fs::remove_file(&tmp);
        Ok(())
    }
}
