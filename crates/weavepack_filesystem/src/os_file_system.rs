use std::io;
use std::path::Path;
use std::path::PathBuf;

use crate::normalize_path;
use crate::FileSystem;

#[derive(Default, Debug)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn cwd(&self) -> io::Result<PathBuf> {
    std::env::current_dir()
  }

  fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
    match dunce::canonicalize(path) {
      Ok(path) => Ok(path),
      // Non-existent paths are still normalised so callers can report on them
      Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(normalize_path(&self.cwd()?, path)),
      Err(err) => Err(err),
    }
  }

  fn create_directory(&self, path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
  }

  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path)
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
  }

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn is_dir(&self, path: &Path) -> bool {
    path.is_dir()
  }
}
