//! Access to the files being read and generated.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::target;

pub trait Storage {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Ensure that `path` is a directory, creating its parents as needed.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The local file system.
#[derive(Debug, Default, Copy, Clone)]
pub struct FileSystem;

impl Storage for FileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// An in-memory file store. Clones share the same files.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    files: Rc<RefCell<BTreeMap<PathBuf, String>>>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
        let path = target::normalize(path.as_ref());
        self.files.borrow_mut().insert(path, contents.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = target::normalize(path.as_ref());
        self.files.borrow().get(&path).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }
}

impl Storage for MemoryStorage {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.get(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory")
        })
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.insert(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let path = target::normalize(path);
        match self.files.borrow_mut().remove(&path) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "No such file or directory",
            )),
        }
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}
