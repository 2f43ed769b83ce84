use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

/// In-memory file-system for testing
pub mod in_memory_file_system;

/// File-system implementation using std::fs
pub mod os_file_system;

pub mod search;

/// FileSystem abstraction instance
///
/// This should be `OsFileSystem` for non-testing environments and `InMemoryFileSystem` for testing.
pub type FileSystemRef = Arc<dyn FileSystem + Send + Sync>;

/// Trait abstracting the file-system operations the bundler needs.
///
/// Resolution only ever asks two questions of the file-system: "what is the canonical form of
/// this path" and "is there a file there". Everything else is reading sources and writing
/// bundles.
#[mockall::automock]
pub trait FileSystem: std::fmt::Debug {
  fn cwd(&self) -> io::Result<PathBuf> {
    Err(io::Error::new(
      io::ErrorKind::Unsupported,
      "Not implemented: FileSystem::cwd",
    ))
  }

  /// Lexically normalise a path, resolving it against the current working directory when
  /// relative
  fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

  /// Create a directory at the specified path, including missing parents
  fn create_directory(&self, _path: &Path) -> io::Result<()> {
    Err(io::Error::new(
      io::ErrorKind::Unsupported,
      "Not implemented: FileSystem::create_directory",
    ))
  }

  fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
  fn read_to_string(&self, path: &Path) -> io::Result<String>;

  fn write(&self, _path: &Path, _contents: &[u8]) -> io::Result<()> {
    Err(io::Error::new(
      io::ErrorKind::Unsupported,
      "Not implemented: FileSystem::write",
    ))
  }

  fn is_file(&self, path: &Path) -> bool;
  fn is_dir(&self, path: &Path) -> bool;
}

/// Lexical normalisation shared by the file-system implementations.
///
/// `.` segments are dropped and `..` segments pop the previous component. Symlinks are not
/// followed.
pub fn normalize_path(base: &Path, path: &Path) -> PathBuf {
  use std::path::Component;

  let mut result: Vec<Component> = if path.is_absolute() {
    vec![]
  } else {
    base.components().collect()
  };

  for component in path.components() {
    match component {
      Component::Prefix(prefix) => {
        result = vec![Component::Prefix(prefix)];
      }
      Component::RootDir => {
        result.push(Component::RootDir);
      }
      Component::CurDir => {}
      Component::ParentDir => {
        if !matches!(result.last(), Some(Component::RootDir) | None) {
          result.pop();
        }
      }
      Component::Normal(path) => {
        result.push(Component::Normal(path));
      }
    }
  }

  PathBuf::from_iter(result)
}
