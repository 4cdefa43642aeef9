//! Storage traits and their file and in-memory backends.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, bail};
use serde_json::Value;

use crate::settings::Settings;

/// The settings map: the whole record is replaced on save.
pub trait SettingsStore {
    /// The stored record, `None` when nothing was ever saved.
    fn get_all(&self) -> Result<Option<toml::Table>>;
    /// Replace the stored record with `settings`.
    fn set_all(&mut self, settings: &Settings) -> Result<()>;
    /// Write a single key, keeping the others.
    fn set(&mut self, key: &str, value: toml::Value) -> Result<()>;
    /// Forget everything.
    fn clear(&mut self) -> Result<()>;
}

/// Small JSON values keyed by name.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Binary objects keyed by name, or by an auto-incremented number.
pub trait BlobStore {
    fn put(&mut self, key: &str, data: &[u8]) -> Result<()>;
    /// Store under the next free numeric key and return it.
    fn add(&mut self, data: &[u8]) -> Result<u64>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Every blob in key order.
    fn get_all(&self) -> Result<Vec<Vec<u8>>>;
    fn delete(&mut self, key: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

fn settings_table(settings: &Settings) -> Result<toml::Table> {
    match toml::Value::try_from(settings).wrap_err("failed to serialize settings")? {
        toml::Value::Table(table) => Ok(table),
        _ => bail!("settings did not serialize to a table"),
    }
}

/// Settings persisted as a TOML file.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, table: &toml::Table) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(table).wrap_err("failed to encode settings")?;
        fs::write(&self.path, text)
            .wrap_err_with(|| format!("failed to write {}", self.path.display()))
    }
}

impl SettingsStore for FileSettingsStore {
    fn get_all(&self) -> Result<Option<toml::Table>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("failed to read {}", self.path.display()))?;
        let table = text
            .parse::<toml::Table>()
            .wrap_err_with(|| format!("invalid TOML in {}", self.path.display()))?;
        Ok(Some(table))
    }

    fn set_all(&mut self, settings: &Settings) -> Result<()> {
        self.write(&settings_table(settings)?)
    }

    fn set(&mut self, key: &str, value: toml::Value) -> Result<()> {
        // A corrupt file is replaced rather than blocking single-key writes.
        let mut table = self.get_all().ok().flatten().unwrap_or_default();
        table.insert(key.to_string(), value);
        self.write(&table)
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .wrap_err_with(|| format!("failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// Settings held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    table: Option<toml::Table>,
}

impl SettingsStore for MemorySettingsStore {
    fn get_all(&self) -> Result<Option<toml::Table>> {
        Ok(self.table.clone())
    }

    fn set_all(&mut self, settings: &Settings) -> Result<()> {
        self.table = Some(settings_table(settings)?);
        Ok(())
    }

    fn set(&mut self, key: &str, value: toml::Value) -> Result<()> {
        self.table
            .get_or_insert_with(toml::Table::new)
            .insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.table = None;
        Ok(())
    }
}

/// Key/value pairs persisted as one JSON object.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<serde_json::Map<String, Value>> {
        if !self.path.exists() {
            return Ok(serde_json::Map::new());
        }
        let text = fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&text)
            .wrap_err_with(|| format!("invalid JSON in {}", self.path.display()))
    }

    fn write(&self, map: &serde_json::Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }
        let text = serde_json::to_string(map).wrap_err("failed to encode local store")?;
        fs::write(&self.path, text)
            .wrap_err_with(|| format!("failed to write {}", self.path.display()))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read()?;
        map.insert(key.to_string(), value);
        self.write(&map)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut map = self.read()?;
        if map.remove(key).is_some() {
            self.write(&map)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .wrap_err_with(|| format!("failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    map: BTreeMap<String, Value>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.map.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.map.clear();
        Ok(())
    }
}

/// File name of the counter used for auto-incremented keys.
const NEXT_KEY_FILE: &str = ".next-key";

/// Numeric keys are zero padded so file names sort in key order.
fn numeric_key(key: u64) -> String {
    format!("{key:010}")
}

fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        bail!("invalid blob key {key:?}");
    }
    Ok(())
}

/// Blobs stored as files in one directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("failed to create {}", self.dir.display()))
    }

    fn next_key(&self) -> Result<u64> {
        let path = self.dir.join(NEXT_KEY_FILE);
        if !path.exists() {
            return Ok(1);
        }
        let text = fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        text.trim()
            .parse()
            .wrap_err_with(|| format!("corrupt key counter in {}", path.display()))
    }

    fn blob_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .wrap_err_with(|| format!("failed to list {}", self.dir.display()))?
        {
            let path = entry?.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_none_or(|n| n.starts_with('.'));
            if path.is_file() && !hidden {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl BlobStore for FileBlobStore {
    fn put(&mut self, key: &str, data: &[u8]) -> Result<()> {
        check_key(key)?;
        self.ensure_dir()?;
        let path = self.dir.join(key);
        fs::write(&path, data).wrap_err_with(|| format!("failed to write {}", path.display()))
    }

    fn add(&mut self, data: &[u8]) -> Result<u64> {
        self.ensure_dir()?;
        let key = self.next_key()?;
        self.put(&numeric_key(key), data)?;
        let counter = self.dir.join(NEXT_KEY_FILE);
        fs::write(&counter, (key + 1).to_string())
            .wrap_err_with(|| format!("failed to write {}", counter.display()))?;
        Ok(key)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        check_key(key)?;
        let path = self.dir.join(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read(&path)
            .map(Some)
            .wrap_err_with(|| format!("failed to read {}", path.display()))
    }

    fn get_all(&self) -> Result<Vec<Vec<u8>>> {
        self.blob_paths()?
            .into_iter()
            .map(|path| {
                fs::read(&path).wrap_err_with(|| format!("failed to read {}", path.display()))
            })
            .collect()
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        check_key(key)?;
        let path = self.dir.join(key);
        if path.exists() {
            fs::remove_file(&path)
                .wrap_err_with(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        // The key counter survives, like an object store's key generator.
        for path in self.blob_paths()? {
            fs::remove_file(&path)
                .wrap_err_with(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    blobs: BTreeMap<String, Vec<u8>>,
    next_key: u64,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self {
            blobs: BTreeMap::new(),
            next_key: 1,
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&mut self, key: &str, data: &[u8]) -> Result<()> {
        check_key(key)?;
        self.blobs.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn add(&mut self, data: &[u8]) -> Result<u64> {
        let key = self.next_key;
        self.put(&numeric_key(key), data)?;
        self.next_key += 1;
        Ok(key)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn get_all(&self) -> Result<Vec<Vec<u8>>> {
        Ok(self.blobs.values().cloned().collect())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.blobs.clear();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A fresh scratch directory, removed on drop.
    pub(crate) struct ScratchDir(pub PathBuf);

    impl ScratchDir {
        pub(crate) fn new(name: &str) -> Self {
            static COUNTER: AtomicU32 = AtomicU32::new(0);
            let dir = std::env::temp_dir().join(format!(
                "backdrop-{name}-{}-{}",
                std::process::id(),
                COUNTER.fetch_add(1, Ordering::Relaxed)
            ));
            let _ = fs::remove_dir_all(&dir);
            Self(dir)
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_file_settings_round_trip_and_clear() {
        let scratch = ScratchDir::new("settings");
        let mut store = FileSettingsStore::new(scratch.0.join("nested/settings.toml"));
        assert!(store.get_all().unwrap().is_none());

        let settings = Settings {
            rain_speed: 60,
            custom_quote: "There is no spoon.".into(),
            ..Default::default()
        };
        store.set_all(&settings).unwrap();
        let loaded = Settings::merged_over_defaults(&store.get_all().unwrap().unwrap());
        assert_eq!(loaded, settings);

        store.set("feed_enabled", toml::Value::Boolean(true)).unwrap();
        let table = store.get_all().unwrap().unwrap();
        assert_eq!(table.get("feed_enabled"), Some(&toml::Value::Boolean(true)));
        assert_eq!(table.get("rain_speed"), Some(&toml::Value::Integer(60)));

        store.clear().unwrap();
        assert!(store.get_all().unwrap().is_none());
    }

    #[test]
    fn test_set_all_replaces_previous_record() {
        let mut store = MemorySettingsStore::default();
        store.set("stray", toml::Value::Integer(1)).unwrap();
        store.set_all(&Settings::default()).unwrap();
        let table = store.get_all().unwrap().unwrap();
        assert!(!table.contains_key("stray"));
        assert_eq!(table.len(), Settings::keys().len());
    }

    #[test]
    fn test_file_key_value_store() {
        let scratch = ScratchDir::new("kv");
        let mut store = FileKeyValueStore::new(scratch.0.join("local.json"));
        assert_eq!(store.get("customImg").unwrap(), None);
        store.set("customImg", Value::from("data:image/png;base64,AA==")).unwrap();
        assert_eq!(
            store.get("customImg").unwrap(),
            Some(Value::from("data:image/png;base64,AA=="))
        );
        store.remove("customImg").unwrap();
        assert_eq!(store.get("customImg").unwrap(), None);
    }

    #[test]
    fn test_file_blob_store_auto_increment() {
        let scratch = ScratchDir::new("blobs");
        let mut store = FileBlobStore::new(&scratch.0);
        assert!(store.get_all().unwrap().is_empty());

        assert_eq!(store.add(b"first").unwrap(), 1);
        assert_eq!(store.add(b"second").unwrap(), 2);
        assert_eq!(
            store.get_all().unwrap(),
            vec![b"first".to_vec(), b"second".to_vec()]
        );

        store.clear().unwrap();
        assert!(store.get_all().unwrap().is_empty());
        // Keys are not reused after a clear.
        assert_eq!(store.add(b"third").unwrap(), 3);
    }

    #[test]
    fn test_blob_keys_are_validated() {
        let mut store = MemoryBlobStore::default();
        assert!(store.put("../escape", b"x").is_err());
        assert!(store.put(".next-key", b"x").is_err());
        store.put("customVideo", b"x").unwrap();
        assert_eq!(store.get("customVideo").unwrap(), Some(b"x".to_vec()));
        store.delete("customVideo").unwrap();
        assert_eq!(store.get("customVideo").unwrap(), None);
    }
}
