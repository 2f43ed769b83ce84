use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::file_type::FileType;

/// The source code for an asset.
#[derive(PartialEq, Eq, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", transparent)]
pub struct Code {
  inner: Vec<u8>,
}

impl Code {
  pub fn new(bytes: Vec<u8>) -> Self {
    Self { inner: bytes }
  }

  pub fn bytes(&self) -> &[u8] {
    &self.inner
  }

  pub fn as_str(&self) -> anyhow::Result<&str> {
    str::from_utf8(&self.inner)
      .map_err(|e| anyhow::Error::new(e).context("Failed to convert code to UTF8 str"))
  }

  pub fn size(&self) -> usize {
    self.inner.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }
}

impl Display for Code {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", String::from_utf8_lossy(&self.inner))
  }
}

impl Debug for Code {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "Code({:?})", String::from_utf8_lossy(&self.inner))
  }
}

impl From<String> for Code {
  fn from(value: String) -> Self {
    Self {
      inner: value.into_bytes(),
    }
  }
}

impl From<&str> for Code {
  fn from(value: &str) -> Self {
    Self {
      inner: value.as_bytes().to_vec(),
    }
  }
}

/// An asset is a file or part of a file that may represent any data type including source code,
/// binary data, etc.
///
/// Assets are keyed by their canonical `file_path`; the asset graph never holds two assets for
/// the same path.
#[derive(PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
  /// The file contents, after transformation
  pub code: Arc<Code>,

  /// The canonical path of the source file
  pub file_path: PathBuf,

  pub file_type: FileType,

  /// Whether this asset is the build entry
  pub is_entry: bool,

  /// Referenced by a document but absent from disk. Virtual assets have no content.
  pub is_virtual: bool,

  /// Runtime code embedded in the bundler rather than read from the project
  pub is_builtin: bool,
}

impl Asset {
  pub fn new(file_path: PathBuf, code: Code) -> Self {
    Self {
      file_type: FileType::from_path(&file_path),
      code: Arc::new(code),
      file_path,
      ..Asset::default()
    }
  }

  pub fn new_virtual(file_path: PathBuf) -> Self {
    Self {
      file_type: FileType::from_path(&file_path),
      file_path,
      is_virtual: true,
      ..Asset::default()
    }
  }

  /// The file name, which is how assets are identified in bundle trees
  pub fn file_name(&self) -> String {
    file_name(&self.file_path)
  }
}

pub(crate) fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn infers_file_type_from_path() {
    let asset = Asset::new(PathBuf::from("/project/index.css"), Code::from("a {}"));
    assert_eq!(asset.file_type, FileType::Css);
    assert_eq!(asset.file_name(), "index.css");
    assert!(!asset.is_virtual);
  }

  #[test]
  fn virtual_assets_have_no_code() {
    let asset = Asset::new_virtual(PathBuf::from("/project/about.html"));
    assert!(asset.is_virtual);
    assert!(asset.code.is_empty());
    assert_eq!(asset.file_type, FileType::Html);
  }
}
