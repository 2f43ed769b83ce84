//! Names and serializes every bundle, then writes them to the output directory
use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use weavepack_core::asset_graph::{AssetGraph, DependencyNode, DependencyState};
use weavepack_core::bundle_graph::{Bundle, BundleGraph, BundleId, BundleOrigin};
use weavepack_core::hash::{hash_bytes, hash_string};
use weavepack_core::plugin::OptimizeContext;
use weavepack_core::types::{Asset, BuildOptions, FileType};
use weavepack_filesystem::FileSystem;

use crate::compilation::classify::reference_suffix;
use crate::plugins::Plugins;

mod css;
mod html;
mod js;
mod raw;

const PENDING_NAME_PREFIX: &str = "weavepack-pending-";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFile {
  pub bundle_id: BundleId,
  pub path: PathBuf,
  pub name: String,
  pub size: usize,
}

/// Everything a packager can see while serializing one bundle
pub struct PackageContext<'a> {
  pub asset_graph: &'a AssetGraph,
  pub bundles: &'a BundleGraph,
  pub options: &'a BuildOptions,
  used_pending_name: Cell<bool>,
}

impl<'a> PackageContext<'a> {
  pub fn new(
    asset_graph: &'a AssetGraph,
    bundles: &'a BundleGraph,
    options: &'a BuildOptions,
  ) -> Self {
    PackageContext {
      asset_graph,
      bundles,
      options,
      used_pending_name: Cell::new(false),
    }
  }

  pub fn asset(&self, index: NodeIndex) -> anyhow::Result<&'a Arc<Asset>> {
    self
      .asset_graph
      .asset(index)
      .ok_or_else(|| anyhow!("Node {index:?} is not an asset"))
  }

  /// Whether a bundle referred to a bundle that had no name yet
  pub fn used_pending_name(&self) -> bool {
    self.used_pending_name.get()
  }

  /// The bundle that loads `target` when it is referenced from `from`
  ///
  /// Looks at the bundle's own children and links, then the children of its siblings, then
  /// the enclosing bundles and their children.
  pub fn find_bundle(&self, from: BundleId, target: NodeIndex) -> Option<BundleId> {
    let bundles = self.bundles;
    let loads_target = |id: &BundleId| {
      let bundle = bundles.bundle(*id);
      bundle.entry_asset == target && bundle.origin != BundleOrigin::Sibling
    };

    let root = bundles.root();
    if bundles.bundle(root).entry_asset == target {
      return Some(root);
    }
    if loads_target(&from) {
      return Some(from);
    }

    let bundle = bundles.bundle(from);
    if let Some(found) = bundle
      .children
      .iter()
      .chain(bundle.links.iter())
      .find(|id| loads_target(*id))
    {
      return Some(*found);
    }

    if let Some(found) = bundle
      .siblings
      .values()
      .flat_map(|sibling| bundles.bundle(*sibling).children.iter())
      .find(|id| loads_target(*id))
    {
      return Some(*found);
    }

    bundles
      .ancestors(from)
      .skip(1)
      .flat_map(|ancestor| {
        std::iter::once(ancestor).chain(bundles.bundle(ancestor).children.iter().copied())
      })
      .find(loads_target)
  }

  /// The public URL of a bundle's output file
  pub fn bundle_url(&self, id: BundleId) -> String {
    let bundle = self.bundles.bundle(id);
    let name = match &bundle.name {
      Some(name) => name.clone(),
      None => {
        self.used_pending_name.set(true);
        self.pending_name(bundle)
      }
    };

    format!(
      "{}/{}",
      self.options.public_url().trim_end_matches('/'),
      name
    )
  }

  fn pending_name(&self, bundle: &Bundle) -> String {
    let entry = self
      .asset_graph
      .asset(bundle.entry_asset)
      .map(|asset| asset.file_path.to_string_lossy().into_owned())
      .unwrap_or_default();

    format!("{PENDING_NAME_PREFIX}{}", hash_string(&entry))
  }

  /// The rewritten location of a dependency, if it leads to a packaged bundle
  pub fn reference_url(
    &self,
    from: BundleId,
    dependency: &DependencyNode,
    target: Option<NodeIndex>,
  ) -> Option<String> {
    if dependency.state != DependencyState::Resolved {
      return None;
    }

    let target = target?;
    if self.asset_graph.asset(target)?.is_virtual {
      return None;
    }

    let bundle = self.find_bundle(from, target)?;
    Some(format!(
      "{}{}",
      self.bundle_url(bundle),
      reference_suffix(&dependency.dependency.specifier)
    ))
  }

  /// An asset's dependencies in source order, with the asset each resolved to
  pub fn dependencies(&self, asset: NodeIndex) -> Vec<(&'a DependencyNode, Option<NodeIndex>)> {
    let asset_graph = self.asset_graph;

    asset_graph
      .dependencies(asset)
      .into_iter()
      .filter_map(|index| {
        let node = asset_graph.dependency(index)?;
        Some((node, asset_graph.resolved_asset(index)))
      })
      .collect()
  }

  /// An asset's dependencies keyed by the placeholder its transformer wrote in their place
  pub fn dependencies_by_placeholder(
    &self,
    asset: NodeIndex,
  ) -> HashMap<String, (&'a DependencyNode, Option<NodeIndex>)> {
    self
      .dependencies(asset)
      .into_iter()
      .map(|(node, target)| (node.dependency.id(), (node, target)))
      .collect()
  }

  /// Stable identifier of an asset inside the script module registry
  pub fn module_id(&self, asset: &Asset) -> String {
    let path = pathdiff::diff_paths(&asset.file_path, &self.options.project_root)
      .unwrap_or_else(|| asset.file_path.clone());
    let path = path.to_string_lossy().replace('\\', "/");

    hash_string(&path)[..12].to_string()
  }
}

fn is_virtual_bundle(asset_graph: &AssetGraph, bundle: &Bundle) -> bool {
  asset_graph
    .asset(bundle.entry_asset)
    .is_some_and(|asset| asset.is_virtual)
}

fn bundle_name(bundle: &Bundle, contents: &[u8]) -> String {
  let hash = hash_bytes(contents);
  match bundle.bundle_type.extension() {
    "" => hash,
    extension => format!("{hash}.{extension}"),
  }
}

/// Serializes a bundle with the packager for its type, then runs its optimizers
fn render(
  plugins: &dyn Plugins,
  ctx: &PackageContext<'_>,
  id: BundleId,
) -> anyhow::Result<Vec<u8>> {
  let bundle = ctx.bundles.bundle(id);

  let mut contents = match bundle.bundle_type {
    FileType::Html => html::package(ctx, bundle)?,
    FileType::Css => css::package(ctx, bundle)?,
    FileType::Js => js::package(ctx, bundle)?,
    _ => raw::package(ctx, bundle)?,
  };

  for optimizer in plugins.optimizers(&bundle.bundle_type) {
    contents = optimizer
      .optimize(OptimizeContext { bundle, contents })?
      .contents;
  }

  Ok(contents)
}

/// Names, serializes and writes every bundle
///
/// Bundles are packaged children first, so most references point at bundles that already have
/// their content hash. A bundle that refers to one still being named, such as a page linking
/// back to its parent, is rendered again once every name is known.
#[tracing::instrument(level = "info", skip_all)]
pub fn package_bundles(
  fs: &dyn FileSystem,
  plugins: &dyn Plugins,
  options: &BuildOptions,
  asset_graph: &AssetGraph,
  bundles: &mut BundleGraph,
) -> anyhow::Result<Vec<OutputFile>> {
  let root = bundles.root();
  let root_name = asset_graph
    .asset(bundles.bundle(root).entry_asset)
    .map(|asset| asset.file_name())
    .ok_or_else(|| anyhow!("The root bundle has no entry asset"))?;
  bundles.bundle_mut(root).name = Some(root_name);

  let order = bundles
    .post_order()
    .into_iter()
    .filter(|id| !is_virtual_bundle(asset_graph, bundles.bundle(*id)))
    .collect::<Vec<_>>();

  let mut contents: HashMap<BundleId, Vec<u8>> = HashMap::new();
  let mut rerender = Vec::new();

  for id in &order {
    let ctx = PackageContext::new(asset_graph, bundles, options);
    let output = render(plugins, &ctx, *id)?;
    if ctx.used_pending_name() {
      rerender.push(*id);
    }

    if bundles.bundle(*id).name.is_none() {
      let name = bundle_name(bundles.bundle(*id), &output);
      tracing::debug!(bundle = id.index(), %name, "Named bundle");
      bundles.bundle_mut(*id).name = Some(name);
    }

    contents.insert(*id, output);
  }

  for id in rerender {
    let ctx = PackageContext::new(asset_graph, bundles, options);
    contents.insert(id, render(plugins, &ctx, id)?);
  }

  let dist_dir = options.dist_dir();
  fs.create_directory(&dist_dir)?;

  let mut written = HashSet::new();
  let mut output_files = Vec::new();
  for id in order {
    let Some(name) = bundles.bundle(id).name.clone() else {
      continue;
    };
    let Some(output) = contents.remove(&id) else {
      continue;
    };

    let path = dist_dir.join(&name);
    if !written.insert(path.clone()) {
      continue;
    }

    fs.write(&path, &output)?;
    tracing::debug!(path = %path.display(), size = output.len(), "Wrote bundle");

    output_files.push(OutputFile {
      bundle_id: id,
      path,
      name,
      size: output.len(),
    });
  }

  tracing::info!(files = output_files.len(), "Packaged bundles");
  Ok(output_files)
}
