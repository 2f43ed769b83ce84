use std::hash::Hash;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// Represents a file type by its extension
///
/// Defaults to `FileType::Js` for convenience.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileType {
  Css,
  Gif,
  Html,
  #[default]
  Js,
  Json,
  Jpeg,
  Png,
  Svg,
  WebP,
  Other(String),
}

impl Serialize for FileType {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    self.extension().serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for FileType {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let ext: String = Deserialize::deserialize(deserializer)?;
    Ok(Self::from_extension(&ext))
  }
}

impl FileType {
  pub fn extension(&self) -> &str {
    match self {
      FileType::Js => "js",
      FileType::Css => "css",
      FileType::Json => "json",
      FileType::Jpeg => "jpeg",
      FileType::Png => "png",
      FileType::Gif => "gif",
      FileType::Html => "html",
      FileType::Svg => "svg",
      FileType::WebP => "webp",
      FileType::Other(s) => s.as_str(),
    }
  }

  pub fn from_extension(ext: &str) -> Self {
    match ext.to_ascii_lowercase().as_str() {
      "js" | "mjs" | "cjs" | "jsx" => FileType::Js,
      "css" => FileType::Css,
      "json" => FileType::Json,
      "jpg" | "jpeg" => FileType::Jpeg,
      "png" => FileType::Png,
      "gif" => FileType::Gif,
      "html" | "htm" => FileType::Html,
      "svg" => FileType::Svg,
      "webp" => FileType::WebP,
      ext => FileType::Other(ext.to_string()),
    }
  }

  /// Infers the type from a path's extension. Extensionless paths are `Other("")`.
  pub fn from_path(path: &Path) -> Self {
    path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(FileType::from_extension)
      .unwrap_or_else(|| FileType::Other(String::new()))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn infers_types_from_paths() {
    assert_eq!(FileType::from_path(Path::new("/a/index.HTML")), FileType::Html);
    assert_eq!(FileType::from_path(Path::new("main.mjs")), FileType::Js);
    assert_eq!(FileType::from_path(Path::new("logo.jpg")), FileType::Jpeg);
    assert_eq!(
      FileType::from_path(Path::new("font.woff2")),
      FileType::Other(String::from("woff2"))
    );
    assert_eq!(
      FileType::from_path(Path::new("/about")),
      FileType::Other(String::new())
    );
  }

  #[test]
  fn serializes_as_extension() {
    assert_eq!(serde_json::to_string(&FileType::Css).unwrap(), "\"css\"");
    assert_eq!(
      serde_json::from_str::<FileType>("\"htm\"").unwrap(),
      FileType::Html
    );
  }
}
