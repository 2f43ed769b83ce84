use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use weavepack_core::asset_graph::AssetGraph;
use weavepack_core::plugin::TransformResult;
use weavepack_core::types::{Asset, BuildOptions, Dependency, Diagnostic, ReferenceKind};
use weavepack_filesystem::FileSystemRef;

use crate::compilation::classify::classify;
use crate::compilation::resolve::{resolve, Resolution};
use crate::compilation::transform::transform_asset;
use crate::plugins::PluginsRef;
use crate::runtime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VisitState {
  InProgress,
  Complete,
}

/// Marks assets whose dependencies are still being walked
///
/// Meeting an in-progress asset again means the walk has closed a cycle. The edge is recorded
/// and the walk does not descend into the asset a second time.
#[derive(Debug, Default)]
struct CycleTracker {
  states: HashMap<NodeIndex, VisitState>,
}

impl CycleTracker {
  fn start(&mut self, asset: NodeIndex) {
    let previous = self.states.insert(asset, VisitState::InProgress);
    assert!(previous.is_none(), "Asset {asset:?} was visited twice");
  }

  fn complete(&mut self, asset: NodeIndex) {
    let previous = self.states.insert(asset, VisitState::Complete);
    debug_assert_eq!(previous, Some(VisitState::InProgress));
  }

  fn is_in_progress(&self, asset: NodeIndex) -> bool {
    self.states.get(&asset) == Some(&VisitState::InProgress)
  }
}

#[derive(Debug)]
pub struct AssetGraphOutput {
  pub graph: AssetGraph,
  /// Nested references that could not be resolved
  pub warnings: Vec<Diagnostic>,
}

/// Walks the entry document depth first, transforming every asset once
pub struct AssetGraphBuilder {
  fs: FileSystemRef,
  plugins: PluginsRef,
  options: Arc<BuildOptions>,
  graph: AssetGraph,
  cycles: CycleTracker,
  warnings: Vec<Diagnostic>,
}

impl AssetGraphBuilder {
  pub fn new(fs: FileSystemRef, plugins: PluginsRef, options: Arc<BuildOptions>) -> Self {
    AssetGraphBuilder {
      fs,
      plugins,
      options,
      graph: AssetGraph::new(),
      cycles: CycleTracker::default(),
      warnings: Vec::new(),
    }
  }

  #[tracing::instrument(level = "info", skip_all, fields(entry = %self.options.entry.display()))]
  pub fn build(mut self) -> anyhow::Result<AssetGraphOutput> {
    let entry = self
      .fs
      .canonicalize(&self.options.entry)
      .unwrap_or_else(|_| self.options.entry.clone());

    if !self.fs.is_file(&entry) {
      return Err(
        Diagnostic {
          file_path: Some(entry.clone()),
          ..Diagnostic::resolution(&entry.to_string_lossy(), None)
        }
        .with_hint("The entry must be an existing file")
        .into(),
      );
    }

    let mut result = transform_asset(&*self.fs, &*self.plugins, &entry)?;
    result.asset.is_entry = true;
    self.visit(result)?;

    if self.options.hmr {
      let hmr_runtime = runtime::hmr_runtime_path();
      if self.graph.asset_index(&hmr_runtime).is_none() {
        let result = transform_asset(&*self.fs, &*self.plugins, &hmr_runtime)?;
        self.visit(result)?;
      }
    }

    tracing::info!(
      assets = self.graph.asset_count(),
      warnings = self.warnings.len(),
      "Built asset graph"
    );

    Ok(AssetGraphOutput {
      graph: self.graph,
      warnings: self.warnings,
    })
  }

  fn visit(&mut self, result: TransformResult) -> anyhow::Result<NodeIndex> {
    let TransformResult {
      asset,
      dependencies,
    } = result;

    tracing::debug!(
      path = %asset.file_path.display(),
      dependencies = dependencies.len(),
      "Visiting asset"
    );

    let asset_index = self.graph.add_asset(asset);
    self.cycles.start(asset_index);

    let dependencies = dependencies
      .into_iter()
      .map(|dependency| {
        let reference = classify(&*self.fs, &self.options.project_root, &dependency);
        (Arc::new(dependency), reference)
      })
      .collect::<Vec<_>>();

    let mut prefetched = self.prefetch(&dependencies)?;

    for (dependency, reference) in dependencies {
      let dependency_index =
        self
          .graph
          .add_dependency(asset_index, Arc::clone(&dependency), reference.clone());

      match resolve(&*self.fs, &self.graph, &dependency, &reference) {
        Ok(Resolution::Existing(target)) => {
          if self.cycles.is_in_progress(target) {
            tracing::debug!(specifier = %dependency.specifier, "Closed a dependency cycle");
          }
          self.graph.resolve_dependency(dependency_index, target);
        }
        Ok(Resolution::New(path)) => {
          let result = match prefetched.remove(&path) {
            Some(result) => result,
            None => transform_asset(&*self.fs, &*self.plugins, &path)?,
          };
          let target = self.visit(result)?;
          self.graph.resolve_dependency(dependency_index, target);
        }
        Ok(Resolution::NewVirtual(path)) => {
          tracing::debug!(path = %path.display(), "Adding virtual asset");
          let target = self.graph.add_asset(Asset::new_virtual(path));
          self.graph.resolve_dependency(dependency_index, target);
        }
        Ok(Resolution::Skipped) => {}
        Err(diagnostic) => {
          tracing::warn!(
            specifier = %dependency.specifier,
            from = ?dependency.source_path,
            "{diagnostic}"
          );
          self.warnings.push(diagnostic);
        }
      }
    }

    self.cycles.complete(asset_index);
    Ok(asset_index)
  }

  /// Transforms the targets of an asset's new dependencies in parallel
  ///
  /// Any failure aborts the build, as partially transformed output is never packaged.
  fn prefetch(
    &self,
    dependencies: &[(Arc<Dependency>, ReferenceKind)],
  ) -> anyhow::Result<HashMap<PathBuf, TransformResult>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for (dependency, reference) in dependencies {
      if let Ok(Resolution::New(path)) = resolve(&*self.fs, &self.graph, dependency, reference) {
        if !paths.contains(&path) {
          paths.push(path);
        }
      }
    }

    if paths.len() < 2 {
      return Ok(HashMap::new());
    }

    let fs = &self.fs;
    let plugins = &self.plugins;

    paths
      .into_par_iter()
      .map(|path| -> anyhow::Result<(PathBuf, TransformResult)> {
        let result = transform_asset(&**fs, &**plugins, &path)?;
        Ok((path, result))
      })
      .collect()
  }
}
