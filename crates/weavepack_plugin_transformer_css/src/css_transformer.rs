use std::sync::Arc;

use anyhow::Error;

use weavepack_core::plugin::{PluginContext, TransformResult, TransformerPlugin};
use weavepack_core::types::{Asset, Code, Dependency, FileType, Priority, SpecifierType};

use crate::references::{replace_references, CssReferenceKind, Replacement};

/// Specifier of the runtime that reloads stylesheets during hot reloading
pub const CSS_LOADER_SPECIFIER: &str = "_css_loader";

#[derive(Debug)]
pub struct WeavepackCssTransformerPlugin {
  hmr: bool,
}

impl WeavepackCssTransformerPlugin {
  pub fn new(ctx: &PluginContext) -> Self {
    WeavepackCssTransformerPlugin {
      hmr: ctx.options.hmr,
    }
  }
}

impl TransformerPlugin for WeavepackCssTransformerPlugin {
  fn transform(&self, input: Asset) -> Result<TransformResult, Error> {
    let mut dependencies: Vec<Dependency> = Vec::new();

    let code = replace_references(input.code.as_str()?, |reference| {
      let (priority, specifier_type) = match reference.kind {
        CssReferenceKind::Import => (Priority::Sync, SpecifierType::Esm),
        CssReferenceKind::Url => (Priority::Parallel, SpecifierType::Url),
      };

      let dependency = Dependency {
        priority,
        source_path: Some(input.file_path.clone()),
        source_asset_type: Some(FileType::Css),
        specifier: reference.specifier.to_string(),
        specifier_type,
      };

      let dependency_id = dependency.id();
      if !dependencies.contains(&dependency) {
        dependencies.push(dependency);
      }

      Replacement::Specifier(dependency_id)
    });

    if self.hmr {
      dependencies.push(Dependency {
        priority: Priority::Sync,
        source_path: Some(input.file_path.clone()),
        source_asset_type: Some(FileType::Css),
        specifier: String::from(CSS_LOADER_SPECIFIER),
        specifier_type: SpecifierType::CommonJS,
      });
    }

    tracing::trace!(
      path = %input.file_path.display(),
      dependencies = dependencies.len(),
      "Transformed css"
    );

    let mut asset = input;
    asset.code = Arc::new(Code::from(code));

    Ok(TransformResult {
      asset,
      dependencies,
    })
  }
}
