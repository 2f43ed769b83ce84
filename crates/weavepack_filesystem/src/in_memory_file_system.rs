use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::normalize_path;
use crate::FileSystem;

#[cfg(not(target_os = "windows"))]
fn root_dir() -> PathBuf {
  PathBuf::from("/")
}

#[cfg(target_os = "windows")]
fn root_dir() -> PathBuf {
  PathBuf::from("C:/")
}

/// In memory implementation of a file-system entry
#[derive(Debug)]
enum InMemoryFileSystemEntry {
  File { contents: Vec<u8> },
  Directory,
}

/// In memory implementation of the `FileSystem` trait, for testing purposes.
#[derive(Debug)]
pub struct InMemoryFileSystem {
  files: RwLock<HashMap<PathBuf, InMemoryFileSystemEntry>>,
  current_working_directory: RwLock<PathBuf>,
}

impl Default for InMemoryFileSystem {
  fn default() -> Self {
    Self {
      files: Default::default(),
      current_working_directory: RwLock::new(root_dir()),
    }
  }
}

impl InMemoryFileSystem {
  /// Change the current working directory. Used for resolving relative paths.
  pub fn set_current_working_directory(&self, cwd: &Path) {
    let cwd = self.normalize(cwd);
    let mut state = self.current_working_directory.write();
    *state = cwd;
  }

  /// Write a file at path, creating its parent directories.
  pub fn write_file(&self, path: &Path, contents: String) {
    let path = self.normalize(path);
    let mut files = self.files.write();

    files.insert(
      path.clone(),
      InMemoryFileSystemEntry::File {
        contents: contents.into_bytes(),
      },
    );

    let mut dir = path.parent();
    while let Some(path) = dir {
      files.insert(path.to_path_buf(), InMemoryFileSystemEntry::Directory);
      dir = path.parent();
    }
  }

  /// Sorted list of the files directly inside `dir`
  pub fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
    let dir = self.normalize(dir);
    let files = self.files.read();
    let mut entries = files
      .iter()
      .filter(|(path, entry)| {
        matches!(entry, InMemoryFileSystemEntry::File { .. })
          && path.parent() == Some(dir.as_path())
      })
      .map(|(path, _)| path.clone())
      .collect::<Vec<_>>();

    entries.sort();
    entries
  }

  fn normalize(&self, path: &Path) -> PathBuf {
    normalize_path(&self.current_working_directory.read(), path)
  }
}

impl FileSystem for InMemoryFileSystem {
  fn cwd(&self) -> io::Result<PathBuf> {
    Ok(self.current_working_directory.read().clone())
  }

  fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
    Ok(self.normalize(path))
  }

  fn create_directory(&self, path: &Path) -> io::Result<()> {
    let path = self.normalize(path);
    let mut files = self.files.write();
    let mut dir = Some(path.as_path());
    while let Some(path) = dir {
      files.insert(path.to_path_buf(), InMemoryFileSystemEntry::Directory);
      dir = path.parent();
    }
    Ok(())
  }

  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    let path = self.normalize(path);
    let files = self.files.read();
    match files.get(&path) {
      None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
      Some(InMemoryFileSystemEntry::File { contents }) => Ok(contents.clone()),
      Some(InMemoryFileSystemEntry::Directory) => Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "Path is a directory",
      )),
    }
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    let bytes = self.read(path)?;
    String::from_utf8(bytes).map_err(|_| io::Error::other("Unable to read file as string"))
  }

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    let path = self.normalize(path);
    let mut files = self.files.write();

    files.insert(
      path.clone(),
      InMemoryFileSystemEntry::File {
        contents: contents.to_vec(),
      },
    );

    let mut dir = path.parent();
    while let Some(path) = dir {
      files.insert(path.to_path_buf(), InMemoryFileSystemEntry::Directory);
      dir = path.parent();
    }

    Ok(())
  }

  fn is_file(&self, path: &Path) -> bool {
    let path = self.normalize(path);
    let files = self.files.read();
    matches!(files.get(&path), Some(InMemoryFileSystemEntry::File { .. }))
  }

  fn is_dir(&self, path: &Path) -> bool {
    let path = self.normalize(path);
    let files = self.files.read();
    matches!(files.get(&path), Some(InMemoryFileSystemEntry::Directory))
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_canonicalize_noop() {
    let fs = InMemoryFileSystem::default();
    let path = PathBuf::from("/foo/bar");
    let result = fs.canonicalize(&path).unwrap();
    assert_eq!(result, path);
  }

  #[test]
  fn test_remove_relative_dots() {
    let fs = InMemoryFileSystem::default();
    let result = fs
      .canonicalize(Path::new("/foo/./bar/../baz/index.html"))
      .unwrap();
    assert_eq!(result, PathBuf::from("/foo/baz/index.html"));
  }

  #[test]
  fn test_with_cwd() {
    let fs = InMemoryFileSystem::default();
    fs.set_current_working_directory(Path::new("/other"));
    let result = fs.canonicalize(Path::new("./foo/bar")).unwrap();
    assert_eq!(result, PathBuf::from("/other/foo/bar"));
  }

  #[test]
  fn test_read_file() {
    let fs = InMemoryFileSystem::default();
    fs.write_file(&PathBuf::from("/foo/bar"), "contents".to_string());
    let result = fs.read_to_string(Path::new("/foo/bar")).unwrap();
    assert_eq!(result, "contents");
  }

  #[test]
  fn test_read_file_not_found() {
    let fs = InMemoryFileSystem::default();
    let result = fs.read_to_string(Path::new("/foo/bar"));
    assert!(result.is_err());
  }

  #[test]
  fn test_is_file_and_is_dir() {
    let fs = InMemoryFileSystem::default();
    fs.write_file(&PathBuf::from("/foo/bar/index.html"), "".to_string());

    assert!(fs.is_file(Path::new("/foo/bar/index.html")));
    assert!(!fs.is_dir(Path::new("/foo/bar/index.html")));
    assert!(fs.is_dir(Path::new("/foo/bar")));
    assert!(fs.is_dir(Path::new("/foo")));
    assert!(!fs.is_file(Path::new("/foo/bar/missing.html")));
  }

  #[test]
  fn test_list_files() {
    let fs = InMemoryFileSystem::default();
    fs.write(Path::new("/dist/b.js"), b"b").unwrap();
    fs.write(Path::new("/dist/a.css"), b"a").unwrap();
    fs.write(Path::new("/dist/nested/c.js"), b"c").unwrap();

    assert_eq!(
      fs.list_files(Path::new("/dist")),
      vec![PathBuf::from("/dist/a.css"), PathBuf::from("/dist/b.js")]
    );
  }
}
