use std::collections::HashMap;

use anyhow::anyhow;
use petgraph::graph::NodeIndex;
use weavepack_core::asset_graph::AssetGraph;
use weavepack_core::bundle_graph::{BundleGraph, BundleId, BundleOrigin};
use weavepack_core::types::FileType;

/// Builds the bundle tree by walking the asset graph from its entry
///
/// Inline dependencies pull their target into the current bundle. Boundary dependencies open
/// a child bundle typed after their target, unless the target already heads an enclosing
/// bundle, which is linked instead. Every document is opened once for the whole build and later
/// references to it are links. Scripts and styles are never shared between documents: an asset
/// reachable from two documents is placed under each of them.
#[tracing::instrument(level = "info", skip_all)]
pub fn partition(asset_graph: &AssetGraph) -> anyhow::Result<BundleGraph> {
  let entry = asset_graph
    .entry()
    .ok_or_else(|| anyhow!("The asset graph has no entry"))?;
  let entry_type = asset_graph
    .asset(entry)
    .map(|asset| asset.file_type.clone())
    .ok_or_else(|| anyhow!("The asset graph entry is not an asset"))?;

  let mut partitioner = Partitioner {
    asset_graph,
    bundles: BundleGraph::new(entry, entry_type.clone()),
    documents: HashMap::new(),
  };

  let root = partitioner.bundles.root();
  if entry_type == FileType::Html {
    partitioner.documents.insert(entry, root);
  }
  partitioner.walk(entry, root);

  tracing::info!(bundles = partitioner.bundles.len(), "Partitioned bundles");
  Ok(partitioner.bundles)
}

struct Partitioner<'a> {
  asset_graph: &'a AssetGraph,
  bundles: BundleGraph,
  /// The bundle each document heads
  documents: HashMap<NodeIndex, BundleId>,
}

impl Partitioner<'_> {
  fn walk(&mut self, asset: NodeIndex, bundle: BundleId) {
    let asset_graph = self.asset_graph;

    for (node, target) in asset_graph.resolved_dependencies(asset) {
      let Some(target_asset) = asset_graph.asset(target) else {
        continue;
      };
      let is_boundary = node.dependency.is_boundary();

      if !is_boundary {
        if self.bundles.add_asset(bundle, target) && !target_asset.is_virtual {
          self.walk(target, bundle);
        }
        continue;
      }

      let ancestor = self
        .bundles
        .ancestors(bundle)
        .find(|id| self.bundles.bundle(*id).entry_asset == target);
      if let Some(ancestor) = ancestor {
        if ancestor != bundle {
          self.bundles.link(bundle, ancestor);
        }
        continue;
      }

      if let Some(document) = self.documents.get(&target).copied() {
        if document != bundle {
          self.bundles.link(bundle, document);
        }
        continue;
      }

      let has_child = self.bundles.bundle(bundle).children.iter().any(|child| {
        let child = self.bundles.bundle(*child);
        child.origin == BundleOrigin::Boundary && child.entry_asset == target
      });
      if has_child {
        continue;
      }

      let child = self.bundles.add_child(
        bundle,
        target_asset.file_type.clone(),
        target,
        BundleOrigin::Boundary,
      );
      if target_asset.file_type == FileType::Html {
        self.documents.insert(target, child);
      }

      tracing::debug!(
        bundle = child.index(),
        parent = bundle.index(),
        bundle_type = %target_asset.file_type.extension(),
        entry = %target_asset.file_path.display(),
        "Opened child bundle"
      );

      // Virtual bundles are tracked in the tree but never traversed
      if !target_asset.is_virtual {
        self.walk(target, child);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use weavepack_core::types::Priority;
  use weavepack_test_fixtures::{assert_bundle_tree, bundle};

  use crate::test_utils::TestAssetGraph;

  use super::*;

  #[test]
  fn inline_dependencies_join_the_current_bundle() {
    let mut assets = TestAssetGraph::new("index.html");
    assets
      .depend("index.html", "main.js", Priority::Parallel)
      .depend("main.js", "util.js", Priority::Sync)
      .depend("main.js", "other.js", Priority::Sync)
      .depend("other.js", "util.js", Priority::Sync);

    let bundles = partition(&assets.graph).unwrap();

    assert_bundle_tree(
      &bundles.tree(&assets.graph),
      &bundle("html", &["index.html"])
        .with_children(vec![bundle("js", &["main.js", "util.js", "other.js"])]),
    );
  }

  #[test]
  fn duplicates_assets_per_document() {
    let mut assets = TestAssetGraph::new("index.html");
    assets
      .depend("index.html", "index.css", Priority::Parallel)
      .depend("index.html", "other.html", Priority::Lazy)
      .depend("other.html", "index.css", Priority::Parallel);

    let bundles = partition(&assets.graph).unwrap();

    assert_bundle_tree(
      &bundles.tree(&assets.graph),
      &bundle("html", &["index.html"]).with_children(vec![
        bundle("css", &["index.css"]),
        bundle("html", &["other.html"]).with_children(vec![bundle("css", &["index.css"])]),
      ]),
    );
  }

  #[test]
  fn links_back_to_enclosing_documents_instead_of_recursing() {
    let mut assets = TestAssetGraph::new("index.html");
    assets
      .depend("index.html", "about.html", Priority::Lazy)
      .depend("about.html", "index.html", Priority::Lazy)
      .depend("about.html", "test.html", Priority::Lazy)
      .depend("test.html", "about.html", Priority::Lazy);

    let bundles = partition(&assets.graph).unwrap();

    assert_bundle_tree(
      &bundles.tree(&assets.graph),
      &bundle("html", &["index.html"]).with_children(vec![bundle("html", &["about.html"])
        .with_children(vec![bundle("html", &["test.html"])])]),
    );

    let about = bundles.bundle(bundles.root()).children[0];
    let test = bundles.bundle(about).children[0];
    assert_eq!(bundles.bundle(about).links, vec![bundles.root()]);
    assert_eq!(bundles.bundle(test).links, vec![about]);
  }

  #[test]
  fn inline_cycles_terminate() {
    let mut assets = TestAssetGraph::new("index.html");
    assets
      .depend("index.html", "about.js", Priority::Parallel)
      .depend("about.js", "index.js", Priority::Sync)
      .depend("index.js", "about.js", Priority::Sync);

    let bundles = partition(&assets.graph).unwrap();

    assert_bundle_tree(
      &bundles.tree(&assets.graph),
      &bundle("html", &["index.html"]).with_children(vec![bundle("js", &["about.js", "index.js"])]),
    );
  }

  #[test]
  fn virtual_targets_get_a_bundle_without_traversal() {
    let mut assets = TestAssetGraph::new("index.html");
    assets.depend_virtual("index.html", "other.html");

    let bundles = partition(&assets.graph).unwrap();

    assert_bundle_tree(
      &bundles.tree(&assets.graph),
      &bundle("html", &["index.html"]).with_children(vec![bundle("html", &["other.html"])]),
    );
  }

  #[test]
  fn repeated_boundaries_share_one_child() {
    let mut assets = TestAssetGraph::new("index.js");
    assets
      .depend("index.js", "lazy.js", Priority::Lazy)
      .depend("index.js", "util.js", Priority::Sync)
      .depend("util.js", "lazy.js", Priority::Lazy);

    let bundles = partition(&assets.graph).unwrap();

    assert_bundle_tree(
      &bundles.tree(&assets.graph),
      &bundle("js", &["index.js", "util.js"]).with_children(vec![bundle("js", &["lazy.js"])]),
    );
  }
  #[test]
  fn opens_each_document_once_in_a_linked_mesh() {
    let pages = ["index.html", "a.html", "b.html", "c.html", "d.html", "e.html"];
    let mut assets = TestAssetGraph::new("index.html");
    for page in &pages[1..] {
      assets.add(page);
    }
    for from in pages {
      assets.depend(from, "nav.css", Priority::Parallel);
      for to in pages {
        assets.depend(from, to, Priority::Lazy);
      }
    }

    let bundles = partition(&assets.graph).unwrap();

    let mut documents = bundles
      .bundles()
      .filter(|bundle| bundle.bundle_type == FileType::Html)
      .map(|bundle| assets.graph.asset(bundle.entry_asset).unwrap().file_name())
      .collect::<Vec<_>>();
    documents.sort();
    assert_eq!(
      documents,
      vec!["a.html", "b.html", "c.html", "d.html", "e.html", "index.html"]
    );

    let styles = bundles
      .bundles()
      .filter(|bundle| bundle.bundle_type == FileType::Css)
      .count();
    assert_eq!(styles, pages.len());
  }

  #[test]
  fn links_a_document_reached_on_a_second_path() {
    let mut assets = TestAssetGraph::new("index.html");
    assets
      .depend("index.html", "a.html", Priority::Lazy)
      .depend("index.html", "b.html", Priority::Lazy)
      .depend("a.html", "b.html", Priority::Lazy);

    let bundles = partition(&assets.graph).unwrap();

    assert_bundle_tree(
      &bundles.tree(&assets.graph),
      &bundle("html", &["index.html"])
        .with_children(vec![bundle("html", &["a.html"])
          .with_children(vec![bundle("html", &["b.html"])])]),
    );

    let a = bundles.bundle(bundles.root()).children[0];
    let b = bundles.bundle(a).children[0];
    assert_eq!(bundles.bundle(bundles.root()).links, vec![b]);
  }
}
