use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use weavepack_core::asset_graph::AssetGraph;
use weavepack_core::bundle_graph::{BundleGraph, BundleTree};
use weavepack_core::config_loader::ConfigLoader;
use weavepack_core::plugin::PluginContext;
use weavepack_core::types::{BuildOptions, Diagnostic};
use weavepack_filesystem::os_file_system::OsFileSystem;
use weavepack_filesystem::FileSystemRef;

use crate::bundling::{inject_siblings, partition};
use crate::compilation::{AssetGraphBuilder, AssetGraphOutput};
use crate::config::WeavepackRc;
use crate::packaging::{package_bundles, OutputFile};
use crate::plugins::{BuiltinPlugins, PluginsRef};

pub struct Weavepack {
  pub fs: FileSystemRef,
  pub options: Arc<BuildOptions>,
  plugins: PluginsRef,
}

#[derive(Debug)]
pub struct BuildResult {
  pub asset_graph: AssetGraph,
  pub bundle_graph: BundleGraph,
  pub output_files: Vec<OutputFile>,
  /// Nested references that could not be resolved
  pub warnings: Vec<Diagnostic>,
}

/// What the CLI reports for a finished build
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport<'a> {
  pub bundles: BundleTree,
  pub output_files: &'a [OutputFile],
  pub warnings: &'a [Diagnostic],
}

impl BuildResult {
  pub fn bundle_tree(&self) -> BundleTree {
    self.bundle_graph.tree(&self.asset_graph)
  }

  pub fn report(&self) -> BuildReport<'_> {
    BuildReport {
      bundles: self.bundle_tree(),
      output_files: &self.output_files,
      warnings: &self.warnings,
    }
  }
}

impl Weavepack {
  /// Resolves the options against the file system and `.weavepackrc`, and sets up the builtin
  /// plugins
  pub fn new(options: BuildOptions, fs: Option<FileSystemRef>) -> Result<Self, anyhow::Error> {
    let fs = fs.unwrap_or_else(|| Arc::new(OsFileSystem));
    let mut options = options;

    let cwd = fs.cwd().unwrap_or_default();
    // A missing entry is reported by the graph builder
    let entry = cwd.join(&options.entry);
    options.entry = fs.canonicalize(&entry).unwrap_or(entry);

    let entry_dir = options
      .entry
      .parent()
      .map(PathBuf::from)
      .ok_or_else(|| anyhow!("Entry {} has no parent directory", options.entry.display()))?;

    options.project_root = if options.project_root.as_os_str().is_empty() {
      entry_dir.clone()
    } else {
      fs.canonicalize(&cwd.join(&options.project_root))?
    };

    let config_loader = Arc::new(ConfigLoader {
      fs: Arc::clone(&fs),
      project_root: options.project_root.clone(),
      search_path: entry_dir,
    });

    if let Some(rc) = WeavepackRc::load(&config_loader, &options)? {
      tracing::debug!(path = %rc.path.display(), "Loaded config");
      rc.contents.apply(&mut options);
    }

    let options = Arc::new(options);
    let plugins = Arc::new(BuiltinPlugins::new(&PluginContext {
      config: config_loader,
      file_system: Arc::clone(&fs),
      options: Arc::clone(&options),
    })?);

    tracing::info!(
      entry = %options.entry.display(),
      mode = %options.mode,
      hmr = options.hmr,
      "Initialised weavepack"
    );

    Ok(Self {
      fs,
      options,
      plugins,
    })
  }

  /// Replaces the builtin plugins
  pub fn with_plugins(mut self, plugins: PluginsRef) -> Self {
    self.plugins = plugins;
    self
  }

  #[tracing::instrument(level = "info", skip_all)]
  pub fn build(&self) -> anyhow::Result<BuildResult> {
    let AssetGraphOutput {
      graph: asset_graph,
      warnings,
    } = AssetGraphBuilder::new(
      Arc::clone(&self.fs),
      Arc::clone(&self.plugins),
      Arc::clone(&self.options),
    )
    .build()?;

    let mut bundle_graph = partition(&asset_graph)?;
    inject_siblings(&asset_graph, &mut bundle_graph, self.options.hmr)?;

    let output_files = package_bundles(
      &*self.fs,
      &*self.plugins,
      &self.options,
      &asset_graph,
      &mut bundle_graph,
    )?;

    Ok(BuildResult {
      asset_graph,
      bundle_graph,
      output_files,
      warnings,
    })
  }
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use pretty_assertions::assert_eq;
  use weavepack_core::types::BuildMode;
  use weavepack_test_fixtures::{assert_bundle_tree, bundle, test_fixture};

  use super::*;

  #[test]
  fn defaults_the_project_root_to_the_entry_directory() {
    let fixture = test_fixture! {
      PathBuf::from("/project"),
      "src/index.html" => {"<p>hi</p>"}
    };

    let weavepack = Weavepack::new(
      BuildOptions {
        entry: PathBuf::from("src/index.html"),
        ..BuildOptions::default()
      },
      Some(fixture.fs.clone()),
    )
    .unwrap();

    assert_eq!(
      weavepack.options.entry,
      PathBuf::from("/project/src/index.html")
    );
    assert_eq!(weavepack.options.project_root, PathBuf::from("/project/src"));
    assert_eq!(weavepack.options.dist_dir(), PathBuf::from("/project/src/dist"));
  }

  #[test]
  fn applies_the_project_rc_file() {
    let fixture = test_fixture! {
      PathBuf::from("/project"),
      "index.html" => {"<p>hi</p>"},
      ".weavepackrc" => {r#"{ "distDir": "build", "mode": "production" }"#}
    };

    let weavepack = Weavepack::new(
      BuildOptions {
        entry: PathBuf::from("/project/index.html"),
        ..BuildOptions::default()
      },
      Some(fixture.fs.clone()),
    )
    .unwrap();

    assert_eq!(weavepack.options.mode, BuildMode::Production);
    assert_eq!(weavepack.options.public_url(), "/build");

    let result = weavepack.build().unwrap();

    assert_eq!(
      result.output_files[0].path,
      Path::new("/project/build/index.html")
    );
    assert!(fixture.file_exists("build/index.html"));
  }

  #[test]
  fn reports_the_bundle_tree() {
    let fixture = test_fixture! {
      PathBuf::from("/project"),
      "index.html" => {r#"<script src="index.js"></script>"#},
      "index.js" => {"console.log('hi');"}
    };

    let result = Weavepack::new(
      BuildOptions {
        entry: PathBuf::from("/project/index.html"),
        ..BuildOptions::default()
      },
      Some(fixture.fs.clone()),
    )
    .unwrap()
    .build()
    .unwrap();

    assert_bundle_tree(
      &result.bundle_tree(),
      &bundle("html", &["index.html"]).with_children(vec![bundle("js", &["index.js"])]),
    );

    let report = serde_json::to_value(result.report()).unwrap();
    assert_eq!(report["bundles"]["name"], "index.html");
    assert_eq!(report["bundles"]["childBundles"][0]["type"], "js");
    assert_eq!(report["outputFiles"].as_array().map(Vec::len), Some(2));
  }
}
