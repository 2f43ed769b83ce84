use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use weavepack_filesystem::in_memory_file_system::InMemoryFileSystem;
use weavepack_filesystem::FileSystemRef;

pub use bundle_tree::*;
// Re-export indoc for convenience in tests
pub use indoc::indoc;

mod bundle_tree;

/// A project written to an in-memory file system
#[derive(Clone)]
pub struct TestFixture {
  pub fs: FileSystemRef,
  pub in_memory_fs: Arc<InMemoryFileSystem>,
  pub dirname: PathBuf,
}

impl TestFixture {
  pub fn with_dirname(dirname: PathBuf) -> Self {
    let in_memory_fs = Arc::new(InMemoryFileSystem::default());
    in_memory_fs.set_current_working_directory(&dirname);

    Self {
      fs: in_memory_fs.clone() as FileSystemRef,
      in_memory_fs,
      dirname,
    }
  }

  fn full_path(&self, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
      PathBuf::from(path)
    } else {
      self.dirname.join(path)
    }
  }

  pub fn write_files(&self, files: HashMap<&str, &str>) -> &Self {
    for (path, content) in files {
      self.write_file(path, content);
    }
    self
  }

  pub fn write_file(&self, path: &str, content: &str) -> &Self {
    self
      .in_memory_fs
      .write_file(&self.full_path(path), content.to_string());
    self
  }

  /// Chain file writes fluently
  pub fn file(self, path: &str, content: &str) -> Self {
    self.write_file(path, content);
    self
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.fs.is_file(&self.full_path(path))
  }

  pub fn read_to_string(&self, path: &str) -> String {
    self
      .fs
      .read_to_string(&self.full_path(path))
      .unwrap_or_else(|err| panic!("Failed to read {path}: {err}"))
  }

  /// Files directly inside `dir`
  pub fn list_files(&self, dir: &str) -> Vec<PathBuf> {
    self.in_memory_fs.list_files(&self.full_path(dir))
  }
}

/// Creates a `TestFixture` holding the given files
///
/// String literal contents are passed through `indoc!`.
#[macro_export]
macro_rules! test_fixture {
    ($dirname:expr, $($path:literal => {$content:literal}),* $(,)?) => {{
        let fixture = $crate::TestFixture::with_dirname($dirname);
        $(
            fixture.write_file($path, $crate::indoc!($content));
        )*
        fixture
    }};

    ($dirname:expr, $($path:literal => $content:expr),* $(,)?) => {{
        let fixture = $crate::TestFixture::with_dirname($dirname);
        $(
            fixture.write_file($path, &$content);
        )*
        fixture
    }};
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fixture_macro_indents_literals() {
    let fixture = test_fixture! {
      PathBuf::from("/project"),
      "index.html" => {r#"
        <script src="index.js"></script>
      "#},
      "/elsewhere/index.js" => {"console.log(1);"}
    };

    assert_eq!(
      fixture.read_to_string("index.html"),
      "<script src=\"index.js\"></script>\n"
    );
    assert!(fixture.file_exists("/elsewhere/index.js"));
    assert!(!fixture.file_exists("missing.js"));
  }

  #[test]
  fn lists_written_files() {
    let fixture = TestFixture::with_dirname(PathBuf::from("/project"))
      .file("b.css", "")
      .file("a.js", "")
      .file("nested/c.js", "");

    assert_eq!(
      fixture.list_files("."),
      vec![
        PathBuf::from("/project/a.js"),
        PathBuf::from("/project/b.css")
      ]
    );
  }
}
