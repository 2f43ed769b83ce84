use std::path::Path;

use percent_encoding::percent_decode_str;
use url::Url;
use weavepack_core::types::{Dependency, ReferenceKind, SpecifierType};
use weavepack_filesystem::{normalize_path, FileSystem};

use crate::compilation::resolve::find_file;
use crate::runtime;

/// Decides what a reference points at before any resolution happens
///
/// Remote URLs and hash links are never touched. Local references are joined to the
/// referencing asset's directory, or to the project root when written as `/path` or `~/path`.
/// A URL reference with no file behind it is virtual: it may exist on the server, so it is
/// tracked but never traversed.
pub fn classify(fs: &dyn FileSystem, project_root: &Path, dependency: &Dependency) -> ReferenceKind {
  let specifier = dependency.specifier.trim();

  if let Some(path) = runtime::builtin_path(specifier) {
    return ReferenceKind::Bundleable(path);
  }

  if specifier.is_empty() || specifier.starts_with('#') {
    return ReferenceKind::HashLink;
  }

  if is_remote(specifier) {
    return ReferenceKind::Remote;
  }

  let path = local_path(specifier);
  if path.is_empty() {
    return ReferenceKind::HashLink;
  }

  let from_dir = dependency
    .source_path
    .as_deref()
    .and_then(Path::parent)
    .unwrap_or(project_root);

  let candidate = if let Some(path) = path.strip_prefix("~/") {
    normalize_path(project_root, Path::new(path))
  } else if let Some(path) = path.strip_prefix('/') {
    normalize_path(project_root, Path::new(path))
  } else {
    normalize_path(from_dir, Path::new(&path))
  };

  let candidate = if runtime::is_builtin(&candidate) {
    candidate
  } else {
    fs.canonicalize(&candidate).unwrap_or(candidate)
  };

  match find_file(fs, &candidate, dependency.specifier_type) {
    Some(path) => ReferenceKind::Bundleable(path),
    None if dependency.specifier_type == SpecifierType::Url => ReferenceKind::Virtual(candidate),
    None => ReferenceKind::Bundleable(candidate),
  }
}

/// The query string and fragment of a specifier, re-appended to rewritten references
pub fn reference_suffix(specifier: &str) -> &str {
  specifier
    .find(['?', '#'])
    .map(|index| &specifier[index..])
    .unwrap_or("")
}

fn is_remote(specifier: &str) -> bool {
  if specifier.starts_with("//") {
    return true;
  }

  // Single letter schemes are Windows drive letters
  Url::parse(specifier).is_ok_and(|url| url.scheme().len() > 1)
}

fn local_path(specifier: &str) -> String {
  let end = specifier.find(['?', '#']).unwrap_or(specifier.len());
  percent_decode_str(&specifier[..end])
    .decode_utf8_lossy()
    .into_owned()
}
