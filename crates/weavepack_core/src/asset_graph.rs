use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::types::{Asset, Dependency, ReferenceKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DependencyState {
  /// Connected to a real or virtual asset
  Resolved,
  /// A local reference that could not be matched to a file. Excluded from bundling.
  Unresolved,
  /// Remote URLs and hash links. Never resolved.
  Skipped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DependencyNode {
  pub dependency: Arc<Dependency>,
  pub reference: ReferenceKind,
  pub state: DependencyState,
}

#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum AssetGraphNode {
  Asset(Arc<Asset>),
  Dependency(DependencyNode),
}

/// Graph of assets and the dependencies between them.
///
/// Assets connect to their dependencies, and each resolved dependency connects to exactly one
/// asset. Assets are deduplicated by canonical path so cyclic references reuse the existing
/// node instead of copying it.
#[derive(Clone, Debug, Default)]
pub struct AssetGraph {
  graph: DiGraph<AssetGraphNode, ()>,
  path_to_node: HashMap<PathBuf, NodeIndex>,
  entry: Option<NodeIndex>,
}

impl AssetGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_asset(&mut self, asset: Asset) -> NodeIndex {
    assert!(
      !self.path_to_node.contains_key(&asset.file_path),
      "Asset {} was added to the graph twice",
      asset.file_path.display()
    );

    let path = asset.file_path.clone();
    let is_entry = asset.is_entry;
    let node_index = self.graph.add_node(AssetGraphNode::Asset(Arc::new(asset)));
    self.path_to_node.insert(path, node_index);

    if is_entry {
      self.entry = Some(node_index);
    }

    node_index
  }

  pub fn asset_index(&self, path: &Path) -> Option<NodeIndex> {
    self.path_to_node.get(path).copied()
  }

  pub fn add_dependency(
    &mut self,
    asset_index: NodeIndex,
    dependency: Arc<Dependency>,
    reference: ReferenceKind,
  ) -> NodeIndex {
    let state = if reference.is_untouched() {
      DependencyState::Skipped
    } else {
      DependencyState::Unresolved
    };

    let dependency_index = self.graph.add_node(AssetGraphNode::Dependency(DependencyNode {
      dependency,
      reference,
      state,
    }));
    self.graph.add_edge(asset_index, dependency_index, ());
    dependency_index
  }

  /// Connects a dependency to the asset it resolved to
  pub fn resolve_dependency(&mut self, dependency_index: NodeIndex, asset_index: NodeIndex) {
    let Some(AssetGraphNode::Dependency(node)) = self.graph.node_weight_mut(dependency_index)
    else {
      panic!("Node {dependency_index:?} is not a dependency");
    };

    debug_assert!(node.state != DependencyState::Skipped);
    node.state = DependencyState::Resolved;
    self.graph.add_edge(dependency_index, asset_index, ());
  }

  pub fn entry(&self) -> Option<NodeIndex> {
    self.entry
  }

  pub fn asset(&self, index: NodeIndex) -> Option<&Arc<Asset>> {
    match self.graph.node_weight(index)? {
      AssetGraphNode::Asset(asset) => Some(asset),
      AssetGraphNode::Dependency(_) => None,
    }
  }

  pub fn dependency(&self, index: NodeIndex) -> Option<&DependencyNode> {
    match self.graph.node_weight(index)? {
      AssetGraphNode::Dependency(node) => Some(node),
      AssetGraphNode::Asset(_) => None,
    }
  }

  /// Outgoing dependencies of an asset, in source order
  pub fn dependencies(&self, asset_index: NodeIndex) -> Vec<NodeIndex> {
    let mut edges = self
      .graph
      .edges_directed(asset_index, Direction::Outgoing)
      .map(|edge| (edge.id(), edge.target()))
      .collect::<Vec<_>>();

    edges.sort_by_key(|(edge, _)| *edge);
    edges.into_iter().map(|(_, target)| target).collect()
  }

  pub fn resolved_asset(&self, dependency_index: NodeIndex) -> Option<NodeIndex> {
    self
      .graph
      .neighbors_directed(dependency_index, Direction::Outgoing)
      .next()
  }

  /// Outgoing dependencies of an asset paired with their target asset, in source order
  pub fn resolved_dependencies(
    &self,
    asset_index: NodeIndex,
  ) -> impl Iterator<Item = (&DependencyNode, NodeIndex)> + '_ {
    self
      .dependencies(asset_index)
      .into_iter()
      .filter_map(move |dependency_index| {
        let node = self.dependency(dependency_index)?;
        let target = self.resolved_asset(dependency_index)?;
        Some((node, target))
      })
  }

  pub fn assets(&self) -> impl Iterator<Item = (NodeIndex, &Arc<Asset>)> {
    self
      .graph
      .node_indices()
      .filter_map(|index| self.asset(index).map(|asset| (index, asset)))
  }

  pub fn asset_count(&self) -> usize {
    self.path_to_node.len()
  }

  /// Dependencies that failed to resolve, with their source asset
  pub fn unresolved_dependencies(&self) -> Vec<&DependencyNode> {
    self
      .graph
      .node_weights()
      .filter_map(|node| match node {
        AssetGraphNode::Dependency(node) if node.state == DependencyState::Unresolved => Some(node),
        _ => None,
      })
      .collect()
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use crate::types::Code;

  use super::*;

  fn asset(path: &str) -> Asset {
    Asset::new(PathBuf::from(path), Code::default())
  }

  fn dependency(specifier: &str) -> Arc<Dependency> {
    Arc::new(Dependency {
      specifier: specifier.to_string(),
      ..Dependency::default()
    })
  }

  #[test]
  fn dependencies_are_returned_in_source_order() {
    let mut graph = AssetGraph::new();
    let index = graph.add_asset(asset("/index.js"));

    let specifiers = ["./a.js", "./b.js", "./c.js"];
    for specifier in specifiers {
      graph.add_dependency(
        index,
        dependency(specifier),
        ReferenceKind::Bundleable(PathBuf::from(specifier)),
      );
    }

    let found = graph
      .dependencies(index)
      .into_iter()
      .map(|dep| graph.dependency(dep).unwrap().dependency.specifier.clone())
      .collect::<Vec<_>>();

    assert_eq!(found, specifiers.to_vec());
  }

  #[test]
  fn cyclic_dependencies_share_asset_nodes() {
    let mut graph = AssetGraph::new();
    let a = graph.add_asset(asset("/a.js"));
    let b = graph.add_asset(asset("/b.js"));

    let a_to_b = graph.add_dependency(
      a,
      dependency("./b.js"),
      ReferenceKind::Bundleable(PathBuf::from("/b.js")),
    );
    graph.resolve_dependency(a_to_b, b);

    let b_to_a = graph.add_dependency(
      b,
      dependency("./a.js"),
      ReferenceKind::Bundleable(PathBuf::from("/a.js")),
    );
    graph.resolve_dependency(b_to_a, a);

    assert_eq!(graph.asset_count(), 2);
    assert_eq!(graph.resolved_asset(a_to_b), Some(b));
    assert_eq!(graph.resolved_asset(b_to_a), Some(a));
    assert_eq!(graph.asset_index(Path::new("/a.js")), Some(a));
  }

  #[test]
  fn remote_dependencies_are_skipped() {
    let mut graph = AssetGraph::new();
    let index = graph.add_asset(asset("/index.html"));
    let remote = graph.add_dependency(index, dependency("https://example.com/a.js"), ReferenceKind::Remote);
    let missing = graph.add_dependency(
      index,
      dependency("./missing.js"),
      ReferenceKind::Bundleable(PathBuf::from("/missing.js")),
    );

    assert_eq!(graph.dependency(remote).unwrap().state, DependencyState::Skipped);
    assert_eq!(graph.dependency(missing).unwrap().state, DependencyState::Unresolved);
    assert_eq!(graph.unresolved_dependencies().len(), 1);
    assert_eq!(graph.resolved_asset(remote), None);
  }

  #[test]
  #[should_panic]
  fn assets_are_never_duplicated() {
    let mut graph = AssetGraph::new();
    graph.add_asset(asset("/index.js"));
    graph.add_asset(asset("/index.js"));
  }
}
