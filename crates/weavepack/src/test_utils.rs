use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use weavepack_core::asset_graph::AssetGraph;
use weavepack_core::types::{
  Asset, BuildOptions, Code, Dependency, Priority, ReferenceKind, SpecifierType,
};
use weavepack_test_fixtures::TestFixture;

use crate::{BuildResult, Weavepack};

/// Options for building `entry` inside a fixture rooted at `/project`
pub fn options(entry: &str) -> BuildOptions {
  BuildOptions {
    entry: path(entry),
    project_root: PathBuf::from("/project"),
    ..BuildOptions::default()
  }
}

pub fn build(fixture: &TestFixture, options: BuildOptions) -> BuildResult {
  Weavepack::new(options, Some(fixture.fs.clone()))
    .and_then(|weavepack| weavepack.build())
    .unwrap_or_else(|error| panic!("Build failed: {error:#}"))
}

/// Name of the first output file with the given extension
pub fn output_name(result: &BuildResult, extension: &str) -> String {
  let suffix = format!(".{extension}");
  result
    .output_files
    .iter()
    .find(|file| file.name.ends_with(&suffix))
    .map(|file| file.name.clone())
    .unwrap_or_else(|| panic!("No .{extension} output in {:?}", result.output_files))
}

/// Asset graphs wired by hand, with paths relative to `/project`
pub struct TestAssetGraph {
  pub graph: AssetGraph,
}

fn path(name: &str) -> PathBuf {
  Path::new("/project").join(name)
}

impl TestAssetGraph {
  pub fn new(entry: &str) -> Self {
    let mut graph = AssetGraph::new();
    graph.add_asset(Asset {
      is_entry: true,
      ..Asset::new(path(entry), Code::default())
    });

    TestAssetGraph { graph }
  }

  pub fn index(&self, name: &str) -> NodeIndex {
    self
      .graph
      .asset_index(&path(name))
      .unwrap_or_else(|| panic!("{name} is not in the graph"))
  }

  fn get_or_add(&mut self, asset: Asset) -> NodeIndex {
    match self.graph.asset_index(&asset.file_path) {
      Some(index) => index,
      None => self.graph.add_asset(asset),
    }
  }

  pub fn add(&mut self, name: &str) -> NodeIndex {
    self.get_or_add(Asset::new(path(name), Code::default()))
  }

  pub fn add_builtin(&mut self, file_path: PathBuf) -> NodeIndex {
    self.get_or_add(Asset {
      is_builtin: true,
      ..Asset::new(file_path, Code::default())
    })
  }

  /// Adds a reference from `from` to `to`, creating `to` when missing
  pub fn depend(&mut self, from: &str, to: &str, priority: Priority) -> &mut Self {
    let source = self.index(from);
    let target = self.add(to);
    self.connect(source, target, to, priority)
  }

  /// Adds a reference to a path with no file behind it
  pub fn depend_virtual(&mut self, from: &str, to: &str) -> &mut Self {
    let source = self.index(from);
    let target = self.get_or_add(Asset::new_virtual(path(to)));
    self.connect(source, target, to, Priority::Lazy)
  }

  pub fn connect(
    &mut self,
    source: NodeIndex,
    target: NodeIndex,
    specifier: &str,
    priority: Priority,
  ) -> &mut Self {
    let dependency = Arc::new(Dependency {
      priority,
      source_path: self.graph.asset(source).map(|asset| asset.file_path.clone()),
      specifier: specifier.to_string(),
      specifier_type: SpecifierType::Url,
      ..Dependency::default()
    });

    let target_path = self
      .graph
      .asset(target)
      .map(|asset| asset.file_path.clone())
      .unwrap_or_default();

    let dependency = self
      .graph
      .add_dependency(source, dependency, ReferenceKind::Bundleable(target_path));
    self.graph.resolve_dependency(dependency, target);
    self
  }
}
