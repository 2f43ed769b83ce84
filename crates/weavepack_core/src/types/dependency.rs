use std::hash::Hash;
use std::hash::Hasher;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::hash::IdentifierHasher;

use super::FileType;

/// A dependency denotes a reference from one asset towards another location, as it appeared in
/// the source.
///
/// Parsers create dependencies; they never resolve them. Classification and resolution happen
/// when the asset graph is built.
#[derive(Hash, PartialEq, Eq, Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
  /// Determines when the dependency should be loaded
  ///
  /// Anything other than `Priority::Sync` crosses a bundle boundary.
  pub priority: Priority,

  /// The path of the asset that contains this dependency
  pub source_path: Option<PathBuf>,

  /// The type of the asset that contains this dependency
  pub source_asset_type: Option<FileType>,

  /// The reference exactly as written in the source
  pub specifier: String,

  /// How the specifier should be interpreted
  pub specifier_type: SpecifierType,
}

impl Dependency {
  /// Placeholder identifier written into transformed sources in place of the specifier
  pub fn id(&self) -> String {
    let mut hasher = IdentifierHasher::new();

    self.source_path.hash(&mut hasher);
    self.specifier.hash(&mut hasher);
    self.specifier_type.hash(&mut hasher);
    self.priority.hash(&mut hasher);

    format!("{:016x}", hasher.finish())
  }

  /// Whether resolving this dependency starts a new child bundle
  pub fn is_boundary(&self) -> bool {
    self.priority != Priority::Sync
  }
}

/// Determines when a dependency should load
#[derive(Clone, Copy, Debug, Default, Deserialize, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  /// Resolves the dependency synchronously, placing the resolved asset in the same bundle as the
  /// parent or another bundle that is already on the page
  #[default]
  Sync,
  /// Places the dependency in a separate bundle loaded in parallel with the current bundle,
  /// e.g. `<script src>` or `<link href>`
  Parallel,
  /// The dependency should be placed in a separate bundle that is loaded later, e.g. `import()`
  /// or `<a href>`
  Lazy,
}

/// The type of the import specifier
#[derive(Clone, Copy, Debug, Default, Deserialize, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecifierType {
  /// An ES Module specifier
  ///
  /// This is parsed as an URL, but bare specifiers are treated as node_modules.
  #[default]
  Esm,
  /// A CommonJS specifier
  CommonJS,
  /// A URL that works as in a browser
  ///
  /// Bare specifiers are treated as relative URLs. URL references may point at locations that
  /// only exist on the server, so a missing target is virtual rather than an error.
  Url,
}

/// Classification of a reference, decided before any resolution is attempted
#[derive(Clone, Debug, Deserialize, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "path")]
pub enum ReferenceKind {
  /// A local file that exists and is bundled
  Bundleable(PathBuf),
  /// A local path with no backing file. Tracked in the bundle tree but never traversed.
  Virtual(PathBuf),
  /// An absolute URL. Never rewritten or traversed.
  Remote,
  /// A same-document fragment link. Never rewritten or traversed.
  HashLink,
}

impl ReferenceKind {
  pub fn candidate_path(&self) -> Option<&PathBuf> {
    match self {
      ReferenceKind::Bundleable(path) | ReferenceKind::Virtual(path) => Some(path),
      ReferenceKind::Remote | ReferenceKind::HashLink => None,
    }
  }

  /// Remote URLs and hash links are left exactly as authored
  pub fn is_untouched(&self) -> bool {
    matches!(self, ReferenceKind::Remote | ReferenceKind::HashLink)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn dependency_ids_are_stable_and_distinct() {
    let script = Dependency {
      priority: Priority::Parallel,
      source_path: Some(PathBuf::from("/project/index.html")),
      specifier: String::from("index.js"),
      specifier_type: SpecifierType::Url,
      ..Dependency::default()
    };
    let style = Dependency {
      specifier: String::from("index.css"),
      ..script.clone()
    };

    assert_eq!(script.id(), script.clone().id());
    assert_ne!(script.id(), style.id());
    assert_eq!(script.id().len(), 16);
  }

  #[test]
  fn only_sync_dependencies_stay_in_the_bundle() {
    let dependency = Dependency::default();
    assert!(!dependency.is_boundary());
    assert!(Dependency {
      priority: Priority::Lazy,
      ..dependency.clone()
    }
    .is_boundary());
    assert!(Dependency {
      priority: Priority::Parallel,
      ..dependency
    }
    .is_boundary());
  }
}
