use std::fmt::Debug;
use std::sync::Arc;

use weavepack_filesystem::FileSystemRef;

use crate::bundle_graph::Bundle;
use crate::config_loader::ConfigLoaderRef;
use crate::types::{Asset, BuildOptions, Dependency};

pub struct PluginContext {
  pub config: ConfigLoaderRef,
  pub file_system: FileSystemRef,
  pub options: Arc<BuildOptions>,
}

#[derive(Debug, PartialEq)]
pub struct TransformResult {
  pub asset: Asset,
  /// References found in the asset, in source order
  pub dependencies: Vec<Dependency>,
}

/// Parse a single asset and discover its dependencies
///
/// Transformers never resolve the specifiers they find. Where a transformer rewrites a
/// reference in the asset code, it writes the dependency id in place of the specifier so the
/// packager can substitute the final location.
pub trait TransformerPlugin: Debug + Send + Sync {
  fn transform(&self, input: Asset) -> Result<TransformResult, anyhow::Error>;
}

pub struct OptimizeContext<'a> {
  pub bundle: &'a Bundle,
  pub contents: Vec<u8>,
}

pub struct OptimizedBundle {
  pub contents: Vec<u8>,
}

/// Optimises a packaged bundle
///
/// Optimizers are commonly used to implement minification. Multiple optimizer plugins may run
/// in series, and the result of each optimizer is passed to the next. They must not change the
/// meaning of the content and running one twice must give the same result.
pub trait OptimizerPlugin: Debug + Send + Sync {
  fn optimize(&self, ctx: OptimizeContext<'_>) -> Result<OptimizedBundle, anyhow::Error>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug)]
  struct TestOptimizerPlugin {}

  impl OptimizerPlugin for TestOptimizerPlugin {
    fn optimize(&self, ctx: OptimizeContext<'_>) -> Result<OptimizedBundle, anyhow::Error> {
      Ok(OptimizedBundle {
        contents: ctx.contents,
      })
    }
  }

  #[test]
  fn can_be_defined_in_dyn_vec() {
    let mut optimizers = Vec::<Box<dyn OptimizerPlugin>>::new();

    optimizers.push(Box::new(TestOptimizerPlugin {}));

    assert_eq!(optimizers.len(), 1);
  }
}
