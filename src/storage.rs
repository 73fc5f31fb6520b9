//! Defines the [`Storage`] trait, the key-value port the post store persists
//! through, along with its two implementations: [`MemoryStorage`] (a plain
//! map, mostly for tests) and [`FileStorage`] (a JSON object in a single file,
//! used by the command line).

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// A string-to-string key-value store, modeled on a browser's local storage.
pub trait Storage {
    /// Returns the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// A [`Storage`] backed by an in-memory map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    /// The number of keys in the store.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// A [`Storage`] persisted as a JSON object (key to string value) in a single
/// file. The file is read on every access and rewritten on every change; a
/// missing file is an empty store.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> FileStorage {
        FileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(Error::Io {
                path: self.path.clone(),
                err: e,
            }),
        }
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let annotate = |err| Error::Io {
            path: self.path.clone(),
            err,
        };
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(annotate)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(items)?)
            .map_err(annotate)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let mut items = self.load()?;
        items.insert(key.to_owned(), value.to_owned());
        self.save(&items)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        let mut items = self.load()?;
        if items.remove(key).is_some() {
            self.save(&items)?;
        }
        Ok(())
    }
}

/// The result of a fallible [`Storage`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure of the underlying storage medium. Note that this is
/// about the storage file itself and not the values stored in it.
#[derive(Debug)]
pub enum Error {
    /// Returned when the storage file can't be read or written.
    Io { path: PathBuf, err: io::Error },

    /// Returned when the storage file isn't a JSON object of strings.
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => {
                write!(f, "Accessing storage file '{}': {}", path.display(), err)
            }
            Error::Json(err) => write!(f, "Malformed storage file: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts [`serde_json::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_memory_storage() -> Result<()> {
        let mut storage = MemoryStorage::new();
        assert_eq!(None, storage.get_item("k")?);
        storage.set_item("k", "v")?;
        assert_eq!(Some(String::from("v")), storage.get_item("k")?);
        storage.set_item("k", "w")?;
        assert_eq!(Some(String::from("w")), storage.get_item("k")?);
        assert_eq!(1, storage.len());
        storage.remove_item("k")?;
        storage.remove_item("k")?;
        assert!(storage.is_empty());
        Ok(())
    }

    #[test]
    fn test_file_storage_persists() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("storage.json");

        let mut storage = FileStorage::new(&path);
        assert_eq!(None, storage.get_item("k")?);
        storage.set_item("k", "[1, 2]")?;
        storage.set_item("other", "x")?;

        let mut reopened = FileStorage::new(&path);
        assert_eq!(Some(String::from("[1, 2]")), reopened.get_item("k")?);
        reopened.remove_item("k")?;
        assert_eq!(None, storage.get_item("k")?);
        assert_eq!(Some(String::from("x")), storage.get_item("other")?);
        Ok(())
    }

    #[test]
    fn test_file_storage_malformed() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json")?;
        assert!(matches!(
            FileStorage::new(&path).get_item("k"),
            Err(Error::Json(_))
        ));
        Ok(())
    }
}
