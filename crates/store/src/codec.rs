//! On-disk representation: serialization and raw file I/O.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Serializer, Value};

use crate::errors::StoreError;

/// Serialize `map` as an indented JSON object.
///
/// Only top-level keys are sorted; nested objects keep insertion order.
pub(crate) fn encode(map: &Map<String, Value>, sort_keys: bool, indent: usize) -> serde_json::Result<Vec<u8>> {
    let indent = vec![b' '; indent];
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&indent));
    if sort_keys {
        let sorted: BTreeMap<&str, &Value> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
        sorted.serialize(&mut ser)?;
    } else {
        map.serialize(&mut ser)?;
    }
    Ok(buf)
}

/// Parse `bytes` read from `path`; the root must be a JSON object.
pub(crate) fn decode(path: &Path, bytes: &[u8]) -> Result<Map<String, Value>, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::malformed(path, e))
}

pub(crate) fn read_file(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    decode(path, &bytes)
}

pub(crate) fn write_file(path: &Path, bytes: &[u8], atomic: bool, create_parent_dirs: bool) -> Result<(), StoreError> {
    if create_parent_dirs {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
    }

    if !atomic {
        return fs::write(path, bytes).map_err(|e| StoreError::io(path, e));
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::io(path, e)
    })
}

/// Sibling of `path` with `.tmp` appended to the file name.
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => {
            let mut name = name.to_os_string();
            name.push(".tmp");
            path.with_file_name(name)
        }
        None => path.with_extension("tmp"),
    }
}
