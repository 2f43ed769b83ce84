use std::ffi::OsString;
use std::path::{Path, PathBuf};

use petgraph::graph::NodeIndex;
use weavepack_core::asset_graph::AssetGraph;
use weavepack_core::types::{Diagnostic, Dependency, ReferenceKind, SpecifierType};
use weavepack_filesystem::FileSystem;

use crate::runtime;

/// Where a classified dependency leads
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
  /// The target is already in the asset graph, possibly still being visited
  Existing(NodeIndex),
  /// A file that has not been transformed yet
  New(PathBuf),
  /// A virtual target seen for the first time
  NewVirtual(PathBuf),
  /// Remote URLs and hash links
  Skipped,
}

/// Finds the file a candidate path refers to
///
/// Module specifiers may omit the `.js` or `.json` extension or name a directory with an
/// `index.js`. URL references to a directory load its `index.html`.
pub fn find_file(
  fs: &dyn FileSystem,
  candidate: &Path,
  specifier_type: SpecifierType,
) -> Option<PathBuf> {
  if runtime::is_builtin(candidate) {
    return runtime::builtin_source(candidate).map(|_| candidate.to_path_buf());
  }

  if fs.is_file(candidate) {
    return Some(candidate.to_path_buf());
  }

  let alternatives = match specifier_type {
    SpecifierType::Url if fs.is_dir(candidate) => vec![candidate.join("index.html")],
    SpecifierType::Url => Vec::new(),
    SpecifierType::Esm | SpecifierType::CommonJS => vec![
      with_extension(candidate, "js"),
      with_extension(candidate, "json"),
      candidate.join("index.js"),
    ],
  };

  alternatives.into_iter().find(|path| fs.is_file(path))
}

fn with_extension(path: &Path, extension: &str) -> PathBuf {
  let mut path = OsString::from(path.as_os_str());
  path.push(".");
  path.push(extension);
  PathBuf::from(path)
}

/// Matches a classified dependency against the asset graph
///
/// A bundleable reference whose file does not exist fails with a resolution diagnostic.
pub fn resolve(
  fs: &dyn FileSystem,
  graph: &AssetGraph,
  dependency: &Dependency,
  reference: &ReferenceKind,
) -> Result<Resolution, Diagnostic> {
  match reference {
    ReferenceKind::Remote | ReferenceKind::HashLink => Ok(Resolution::Skipped),
    ReferenceKind::Virtual(path) => Ok(
      graph
        .asset_index(path)
        .map(Resolution::Existing)
        .unwrap_or_else(|| Resolution::NewVirtual(path.clone())),
    ),
    ReferenceKind::Bundleable(path) => {
      if let Some(index) = graph.asset_index(path) {
        return Ok(Resolution::Existing(index));
      }

      let exists = match runtime::builtin_source(path) {
        Some(_) => true,
        None => fs.is_file(path),
      };

      if exists {
        Ok(Resolution::New(path.clone()))
      } else {
        Err(Diagnostic::resolution(
          &dependency.specifier,
          dependency.source_path.clone(),
        ))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use pretty_assertions::assert_eq;
  use weavepack_core::types::{Asset, Code, ErrorKind};
  use weavepack_filesystem::in_memory_file_system::InMemoryFileSystem;
  use weavepack_filesystem::MockFileSystem;

  use super::*;

  #[test]
  fn module_specifiers_try_extensions_and_index_files() {
    let fs = Arc::new(InMemoryFileSystem::default());
    fs.write_file(Path::new("/project/util.js"), String::new());
    fs.write_file(Path::new("/project/data.json"), String::new());
    fs.write_file(Path::new("/project/lib/index.js"), String::new());

    let find = |path: &str| find_file(&*fs, Path::new(path), SpecifierType::CommonJS);

    assert_eq!(find("/project/util"), Some(PathBuf::from("/project/util.js")));
    assert_eq!(find("/project/data"), Some(PathBuf::from("/project/data.json")));
    assert_eq!(find("/project/lib"), Some(PathBuf::from("/project/lib/index.js")));
    assert_eq!(find("/project/missing"), None);
  }

  #[test]
  fn url_references_do_not_guess_extensions() {
    let mut fs = MockFileSystem::new();
    fs.expect_is_file()
      .returning(|path| path == Path::new("/project/about.html"));
    fs.expect_is_dir().returning(|_| false);

    assert_eq!(
      find_file(&fs, Path::new("/project/about"), SpecifierType::Url),
      None
    );
    assert_eq!(
      find_file(&fs, Path::new("/project/about.html"), SpecifierType::Url),
      Some(PathBuf::from("/project/about.html"))
    );
  }

  #[test]
  fn builtins_resolve_without_the_file_system() {
    let fs = MockFileSystem::new();

    assert_eq!(
      find_file(
        &fs,
        &runtime::hmr_runtime_path(),
        SpecifierType::CommonJS
      ),
      Some(runtime::hmr_runtime_path())
    );
  }

  #[test]
  fn reuses_assets_already_in_the_graph() {
    let fs = InMemoryFileSystem::default();
    let mut graph = AssetGraph::new();
    let index = graph.add_asset(Asset::new(
      PathBuf::from("/project/index.js"),
      Code::default(),
    ));

    let resolution = resolve(
      &fs,
      &graph,
      &Dependency::default(),
      &ReferenceKind::Bundleable(PathBuf::from("/project/index.js")),
    );

    assert_eq!(resolution, Ok(Resolution::Existing(index)));
  }

  #[test]
  fn classifies_new_targets() {
    let fs = InMemoryFileSystem::default();
    fs.write_file(Path::new("/project/index.js"), String::new());
    let graph = AssetGraph::new();

    assert_eq!(
      resolve(
        &fs,
        &graph,
        &Dependency::default(),
        &ReferenceKind::Bundleable(PathBuf::from("/project/index.js"))
      ),
      Ok(Resolution::New(PathBuf::from("/project/index.js")))
    );
    assert_eq!(
      resolve(
        &fs,
        &graph,
        &Dependency::default(),
        &ReferenceKind::Virtual(PathBuf::from("/project/about.html"))
      ),
      Ok(Resolution::NewVirtual(PathBuf::from("/project/about.html")))
    );
    assert_eq!(
      resolve(&fs, &graph, &Dependency::default(), &ReferenceKind::Remote),
      Ok(Resolution::Skipped)
    );
  }

  #[test]
  fn missing_files_are_resolution_errors() {
    let fs = InMemoryFileSystem::default();
    let dependency = Dependency {
      source_path: Some(PathBuf::from("/project/index.js")),
      specifier: String::from("./missing"),
      ..Dependency::default()
    };

    let error = resolve(
      &fs,
      &AssetGraph::new(),
      &dependency,
      &ReferenceKind::Bundleable(PathBuf::from("/project/missing")),
    )
    .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Resolution);
    assert_eq!(error.file_path, Some(PathBuf::from("/project/index.js")));
    assert_eq!(
      error.message,
      "Failed to resolve './missing' from '/project/index.js'"
    );
  }
}
