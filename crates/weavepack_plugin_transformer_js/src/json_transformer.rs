use std::sync::Arc;

use anyhow::Error;

use weavepack_core::plugin::{PluginContext, TransformResult, TransformerPlugin};
use weavepack_core::types::{Asset, Code, FileType};

/// Turns a JSON document into a module exporting its value
#[derive(Debug)]
pub struct WeavepackJsonTransformerPlugin {}

impl WeavepackJsonTransformerPlugin {
  pub fn new(_ctx: &PluginContext) -> Self {
    WeavepackJsonTransformerPlugin {}
  }
}

impl TransformerPlugin for WeavepackJsonTransformerPlugin {
  fn transform(&self, input: Asset) -> Result<TransformResult, Error> {
    let value: serde_json::Value = serde_json::from_slice(input.code.bytes())?;
    tracing::trace!(path = %input.file_path.display(), "Transformed json");

    let mut asset = input;
    asset.code = Arc::new(Code::from(format!("module.exports = {value};")));
    asset.file_type = FileType::Js;

    Ok(TransformResult {
      asset,
      dependencies: Vec::new(),
    })
  }
}
