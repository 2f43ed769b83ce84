use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use weavepack_core::plugin::{OptimizerPlugin, PluginContext, TransformerPlugin};
use weavepack_core::types::FileType;
use weavepack_plugin_optimizer_html::WeavepackHtmlOptimizerPlugin;
use weavepack_plugin_transformer_css::WeavepackCssTransformerPlugin;
use weavepack_plugin_transformer_html::WeavepackHtmlTransformerPlugin;
use weavepack_plugin_transformer_js::{WeavepackJsTransformerPlugin, WeavepackJsonTransformerPlugin};

pub type PluginsRef = Arc<dyn Plugins + Send + Sync>;

/// Looks up the plugins that process each file type
#[cfg_attr(test, automock)]
pub trait Plugins {
  /// The parser for a file type. Types without one are copied through unchanged.
  fn transformer(&self, file_type: &FileType) -> Option<Arc<dyn TransformerPlugin>>;

  /// Optimizers run in order over packaged bundles of a type
  fn optimizers(&self, file_type: &FileType) -> Vec<Arc<dyn OptimizerPlugin>>;
}

/// The plugins weavepack ships with
pub struct BuiltinPlugins {
  transformers: HashMap<FileType, Arc<dyn TransformerPlugin>>,
  optimizers: HashMap<FileType, Vec<Arc<dyn OptimizerPlugin>>>,
}

impl BuiltinPlugins {
  pub fn new(ctx: &PluginContext) -> Result<Self, anyhow::Error> {
    let mut transformers: HashMap<FileType, Arc<dyn TransformerPlugin>> = HashMap::new();
    transformers.insert(
      FileType::Html,
      Arc::new(WeavepackHtmlTransformerPlugin::new(ctx)),
    );
    transformers.insert(FileType::Css, Arc::new(WeavepackCssTransformerPlugin::new(ctx)));
    transformers.insert(FileType::Js, Arc::new(WeavepackJsTransformerPlugin::new(ctx)));
    transformers.insert(
      FileType::Json,
      Arc::new(WeavepackJsonTransformerPlugin::new(ctx)),
    );

    let mut optimizers: HashMap<FileType, Vec<Arc<dyn OptimizerPlugin>>> = HashMap::new();
    if ctx.options.should_optimize() {
      optimizers.insert(
        FileType::Html,
        vec![Arc::new(WeavepackHtmlOptimizerPlugin::new(ctx)?)],
      );
    }

    Ok(BuiltinPlugins {
      transformers,
      optimizers,
    })
  }
}

impl Plugins for BuiltinPlugins {
  fn transformer(&self, file_type: &FileType) -> Option<Arc<dyn TransformerPlugin>> {
    self.transformers.get(file_type).cloned()
  }

  fn optimizers(&self, file_type: &FileType) -> Vec<Arc<dyn OptimizerPlugin>> {
    self.optimizers.get(file_type).cloned().unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use weavepack_core::config_loader::ConfigLoader;
  use weavepack_core::types::{BuildMode, BuildOptions};
  use weavepack_filesystem::in_memory_file_system::InMemoryFileSystem;

  use super::*;

  fn plugins(mode: BuildMode) -> BuiltinPlugins {
    let fs = Arc::new(InMemoryFileSystem::default());
    let ctx = PluginContext {
      config: Arc::new(ConfigLoader {
        fs: fs.clone(),
        project_root: PathBuf::from("/project"),
        search_path: PathBuf::from("/project"),
      }),
      file_system: fs,
      options: Arc::new(BuildOptions {
        mode,
        ..BuildOptions::default()
      }),
    };

    BuiltinPlugins::new(&ctx).unwrap()
  }

  #[test]
  fn has_transformers_for_parsed_types() {
    let plugins = plugins(BuildMode::Development);

    for file_type in [FileType::Html, FileType::Css, FileType::Js, FileType::Json] {
      assert!(plugins.transformer(&file_type).is_some(), "{file_type:?}");
    }
    assert!(plugins.transformer(&FileType::Png).is_none());
  }

  #[test]
  fn optimizes_html_in_production_only() {
    assert!(plugins(BuildMode::Development)
      .optimizers(&FileType::Html)
      .is_empty());
    assert_eq!(plugins(BuildMode::Production).optimizers(&FileType::Html).len(), 1);
    assert!(plugins(BuildMode::Production)
      .optimizers(&FileType::Css)
      .is_empty());
  }
}
