use weavepack_core::bundle_graph::BundleTree;
use weavepack_core::types::FileType;

/// The expected shape of a bundle and its descendants
///
/// Assets and child bundles are compared without regard to order.
#[derive(Clone, Debug)]
pub struct ExpectedBundle {
  pub bundle_type: FileType,
  pub assets: Vec<String>,
  pub child_bundles: Vec<ExpectedBundle>,
}

pub fn bundle(extension: &str, assets: &[&str]) -> ExpectedBundle {
  ExpectedBundle {
    bundle_type: FileType::from_extension(extension),
    assets: assets.iter().map(|asset| asset.to_string()).collect(),
    child_bundles: Vec::new(),
  }
}

impl ExpectedBundle {
  pub fn with_children(mut self, child_bundles: Vec<ExpectedBundle>) -> Self {
    self.child_bundles = child_bundles;
    self
  }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct CanonicalBundle {
  bundle_type: String,
  assets: Vec<String>,
  child_bundles: Vec<CanonicalBundle>,
}

impl CanonicalBundle {
  fn new(bundle_type: &FileType, assets: &[String], child_bundles: Vec<CanonicalBundle>) -> Self {
    let mut assets = assets.to_vec();
    assets.sort();

    let mut child_bundles = child_bundles;
    child_bundles.sort();

    CanonicalBundle {
      bundle_type: bundle_type.extension().to_string(),
      assets,
      child_bundles,
    }
  }
}

fn canonical_tree(tree: &BundleTree) -> CanonicalBundle {
  CanonicalBundle::new(
    &tree.bundle_type,
    &tree.assets,
    tree.child_bundles.iter().map(canonical_tree).collect(),
  )
}

fn canonical_expected(expected: &ExpectedBundle) -> CanonicalBundle {
  CanonicalBundle::new(
    &expected.bundle_type,
    &expected.assets,
    expected
      .child_bundles
      .iter()
      .map(canonical_expected)
      .collect(),
  )
}

#[track_caller]
pub fn assert_bundle_tree(actual: &BundleTree, expected: &ExpectedBundle) {
  pretty_assertions::assert_eq!(canonical_tree(actual), canonical_expected(expected));
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tree(bundle_type: FileType, assets: &[&str], child_bundles: Vec<BundleTree>) -> BundleTree {
    BundleTree {
      name: None,
      bundle_type,
      assets: assets.iter().map(|asset| asset.to_string()).collect(),
      child_bundles,
    }
  }

  #[test]
  fn ignores_asset_and_child_order() {
    let actual = tree(
      FileType::Html,
      &["index.html"],
      vec![
        tree(FileType::Js, &["b.js", "a.js"], vec![]),
        tree(FileType::Css, &["index.css"], vec![]),
      ],
    );

    assert_bundle_tree(
      &actual,
      &bundle("html", &["index.html"]).with_children(vec![
        bundle("css", &["index.css"]),
        bundle("js", &["a.js", "b.js"]),
      ]),
    );
  }

  #[test]
  #[should_panic]
  fn fails_on_missing_children() {
    let actual = tree(FileType::Html, &["index.html"], vec![]);

    assert_bundle_tree(
      &actual,
      &bundle("html", &["index.html"]).with_children(vec![bundle("js", &["index.js"])]),
    );
  }
}
