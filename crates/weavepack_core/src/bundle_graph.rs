use indexmap::{IndexMap, IndexSet};
use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::asset_graph::AssetGraph;
use crate::types::FileType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BundleId(usize);

impl BundleId {
  pub fn index(&self) -> usize {
    self.0
  }
}

/// Why a bundle exists
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BundleOrigin {
  /// The root of the tree. Keeps the entry file name.
  Entry,
  /// Opened by a dependency that crosses a type boundary
  Boundary,
  /// Injected to carry assets of a complementary type for its creator
  Sibling,
}

/// A typed group of assets emitted together as one output file
#[derive(Clone, Debug, PartialEq)]
pub struct Bundle {
  pub id: BundleId,
  pub bundle_type: FileType,
  /// The first asset placed in the bundle
  pub entry_asset: NodeIndex,
  /// Members in insertion order
  pub assets: IndexSet<NodeIndex>,
  /// Owned child bundles in discovery order
  pub children: Vec<BundleId>,
  /// Bundles referenced but owned elsewhere in the tree, e.g. a document linking back to one of
  /// its ancestors
  pub links: Vec<BundleId>,
  /// Back-reference to the owning bundle
  pub parent: Option<BundleId>,
  pub origin: BundleOrigin,
  /// Bundles carrying this bundle's assets in other types, keyed by that type
  pub siblings: IndexMap<FileType, BundleId>,
  /// Sibling bundles a document must load from its head, in insertion order
  pub injected_references: Vec<BundleId>,
  /// Output file name, assigned once the content is final
  pub name: Option<String>,
}

impl Bundle {
  pub fn is_entry(&self) -> bool {
    self.origin == BundleOrigin::Entry
  }
}

/// Arena holding the bundle tree. Ownership runs from the root downwards; parents are only
/// referenced by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BundleGraph {
  bundles: Vec<Bundle>,
}

impl BundleGraph {
  pub fn new(entry_asset: NodeIndex, bundle_type: FileType) -> Self {
    let mut graph = BundleGraph {
      bundles: Vec::new(),
    };
    graph.push(None, bundle_type, entry_asset, BundleOrigin::Entry);
    graph
  }

  fn push(
    &mut self,
    parent: Option<BundleId>,
    bundle_type: FileType,
    entry_asset: NodeIndex,
    origin: BundleOrigin,
  ) -> BundleId {
    let id = BundleId(self.bundles.len());
    let mut assets = IndexSet::new();
    assets.insert(entry_asset);

    self.bundles.push(Bundle {
      id,
      bundle_type,
      entry_asset,
      assets,
      children: Vec::new(),
      links: Vec::new(),
      parent,
      origin,
      siblings: IndexMap::new(),
      injected_references: Vec::new(),
      name: None,
    });

    if let Some(parent) = parent {
      self.bundles[parent.0].children.push(id);
    }

    id
  }

  pub fn root(&self) -> BundleId {
    BundleId(0)
  }

  pub fn bundle(&self, id: BundleId) -> &Bundle {
    &self.bundles[id.0]
  }

  pub fn bundle_mut(&mut self, id: BundleId) -> &mut Bundle {
    &mut self.bundles[id.0]
  }

  pub fn len(&self) -> usize {
    self.bundles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bundles.is_empty()
  }

  pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
    self.bundles.iter()
  }

  /// Ids of every bundle in creation order
  pub fn bundle_ids(&self) -> impl Iterator<Item = BundleId> {
    (0..self.bundles.len()).map(BundleId)
  }

  /// Opens a child bundle of `parent` holding `entry_asset`
  pub fn add_child(
    &mut self,
    parent: BundleId,
    bundle_type: FileType,
    entry_asset: NodeIndex,
    origin: BundleOrigin,
  ) -> BundleId {
    assert!(origin != BundleOrigin::Entry, "Only the root is an entry bundle");
    self.push(Some(parent), bundle_type, entry_asset, origin)
  }

  /// Adds an asset, returning false if it was already a member
  pub fn add_asset(&mut self, id: BundleId, asset: NodeIndex) -> bool {
    self.bundles[id.0].assets.insert(asset)
  }

  pub fn link(&mut self, from: BundleId, to: BundleId) {
    let links = &mut self.bundles[from.0].links;
    if !links.contains(&to) {
      links.push(to);
    }
  }

  /// Records that `sibling` carries `owner`'s assets of the sibling's type, and vice versa
  pub fn connect_siblings(&mut self, owner: BundleId, sibling: BundleId) {
    let owner_type = self.bundles[owner.0].bundle_type.clone();
    let sibling_type = self.bundles[sibling.0].bundle_type.clone();

    self.bundles[owner.0].siblings.insert(sibling_type, sibling);
    self.bundles[sibling.0].siblings.entry(owner_type).or_insert(owner);
  }

  /// Asks the document bundle `document` to load `sibling` from its head
  pub fn inject_reference(&mut self, document: BundleId, sibling: BundleId) -> bool {
    let references = &mut self.bundles[document.0].injected_references;
    if references.contains(&sibling) {
      return false;
    }

    references.push(sibling);
    true
  }

  /// The bundle itself followed by its parents up to the root
  pub fn ancestors(&self, id: BundleId) -> impl Iterator<Item = BundleId> + '_ {
    std::iter::successors(Some(id), move |id| self.bundles[id.0].parent)
  }

  /// Every bundle with its children listed before itself
  pub fn post_order(&self) -> Vec<BundleId> {
    let mut order = Vec::with_capacity(self.bundles.len());
    let mut stack = vec![(self.root(), false)];

    while let Some((id, expanded)) = stack.pop() {
      if expanded {
        order.push(id);
        continue;
      }

      stack.push((id, true));
      for child in self.bundles[id.0].children.iter().rev() {
        stack.push((*child, false));
      }
    }

    order
  }

  /// Externally observable shape of the tree
  pub fn tree(&self, asset_graph: &AssetGraph) -> BundleTree {
    self.subtree(self.root(), asset_graph)
  }

  fn subtree(&self, id: BundleId, asset_graph: &AssetGraph) -> BundleTree {
    let bundle = self.bundle(id);

    BundleTree {
      name: bundle.name.clone(),
      bundle_type: bundle.bundle_type.clone(),
      assets: bundle
        .assets
        .iter()
        .filter_map(|asset| asset_graph.asset(*asset))
        .map(|asset| asset.file_name())
        .collect(),
      child_bundles: bundle
        .children
        .iter()
        .map(|child| self.subtree(*child, asset_graph))
        .collect(),
    }
  }
}

/// A serialisable view of a bundle and its descendants
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleTree {
  pub name: Option<String>,
  #[serde(rename = "type")]
  pub bundle_type: FileType,
  pub assets: Vec<String>,
  pub child_bundles: Vec<BundleTree>,
}
