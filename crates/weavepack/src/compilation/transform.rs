use std::path::Path;

use anyhow::Context;
use weavepack_core::plugin::TransformResult;
use weavepack_core::types::{Asset, Code, Diagnostic};
use weavepack_filesystem::FileSystem;

use crate::plugins::Plugins;
use crate::runtime;

/// Loads an asset and runs the transformer for its type
///
/// Types without a transformer are kept as-is and have no dependencies. A failing transformer
/// is reported as a transform diagnostic for the file.
pub fn transform_asset(
  fs: &dyn FileSystem,
  plugins: &dyn Plugins,
  file_path: &Path,
) -> anyhow::Result<TransformResult> {
  let (code, is_builtin) = match runtime::builtin_source(file_path) {
    Some(source) => (Code::from(source), true),
    None => {
      let bytes = fs
        .read(file_path)
        .with_context(|| format!("Failed to read {}", file_path.display()))?;
      (Code::new(bytes), false)
    }
  };

  let mut asset = Asset::new(file_path.to_path_buf(), code);
  asset.is_builtin = is_builtin;

  let Some(transformer) = plugins.transformer(&asset.file_type) else {
    tracing::trace!(path = %file_path.display(), "No transformer, keeping source");
    return Ok(TransformResult {
      asset,
      dependencies: Vec::new(),
    });
  };

  transformer
    .transform(asset)
    .map_err(|error| Diagnostic::transform(file_path.to_path_buf(), &error).into())
}
